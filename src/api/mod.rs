mod ws;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::ui::pages;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/register", get(pages::register_form).post(pages::register))
        .route("/login", get(pages::login_form).post(pages::login))
        .route("/logout", get(pages::logout))
        .route("/generate_token", get(pages::generate_token))
        .route("/patient", get(pages::patient_dashboard))
        .route("/doctor", get(pages::doctor_dashboard))
        .route("/call_next", get(pages::call_next))
        .route("/ws", get(ws::queue_ws))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
