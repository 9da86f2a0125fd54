//! Page handlers. Every role-gated route answers missing or wrong-role
//! sessions with a redirect to the login page; domain errors surface as
//! flash notices, never as raw error detail.

use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::sync::Arc;

use crate::auth::{self, AuthError, Registration, SESSION_COOKIE};
use crate::db::{ROLE_DOCTOR, ROLE_PATIENT};
use crate::ui::{
    flash, render_template, DoctorTemplate, Flash, IndexTemplate, LoginTemplate, PatientTemplate,
    RegisterTemplate,
};
use crate::AppState;

// Landing page
pub async fn index(jar: CookieJar) -> Response {
    let (jar, notice) = flash::take(jar);
    (jar, render_template(IndexTemplate { notice })).into_response()
}

// Registration form
pub async fn register_form(jar: CookieJar) -> Response {
    let (jar, notice) = flash::take(jar);
    (jar, render_template(RegisterTemplate { notice })).into_response()
}

// Registration submit
pub async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<Registration>,
) -> Response {
    match auth::register(&state, &form).await {
        Ok(_) => {
            let jar = flash::set(jar, Flash::success("Registration successful! Please login."));
            (jar, Redirect::to("/login")).into_response()
        }
        Err(err) => {
            let notice = match err {
                AuthError::DuplicateHandle => Flash::error("User already exists!"),
                AuthError::SecretMismatch => Flash::error("Passwords do not match!"),
                AuthError::ChallengeFailed => Flash::error("Invalid CAPTCHA!"),
                err => {
                    tracing::error!(error = %err, "registration failed");
                    Flash::error("Something went wrong, please try again.")
                }
            };
            // Drop any notice left over from an earlier redirect.
            let (jar, _) = flash::take(jar);
            let template = RegisterTemplate {
                notice: Some(notice),
            };
            let html = template.render().unwrap_or_else(|e| format!("Error: {}", e));
            (StatusCode::BAD_REQUEST, jar, Html(html)).into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
}

// Login form
pub async fn login_form(jar: CookieJar) -> Response {
    let (jar, notice) = flash::take(jar);
    (jar, render_template(LoginTemplate { notice })).into_response()
}

// Login submit: doctors land on their dashboard, everyone else on the
// patient dashboard.
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    match auth::login(&state, &form.username, &form.password).await {
        Ok((user, token)) => {
            let jar = jar.add(
                Cookie::build((SESSION_COOKIE, token))
                    .path("/")
                    .http_only(true)
                    .same_site(SameSite::Lax)
                    .build(),
            );
            let jar = flash::set(jar, Flash::success("Login successful!"));
            let dest = if user.is_doctor() { "/doctor" } else { "/patient" };
            (jar, Redirect::to(dest)).into_response()
        }
        Err(AuthError::InvalidCredentials) => {
            let (jar, _) = flash::take(jar);
            let template = LoginTemplate {
                notice: Some(Flash::error("Invalid credentials!")),
            };
            let html = template.render().unwrap_or_else(|e| format!("Error: {}", e));
            (StatusCode::UNAUTHORIZED, jar, Html(html)).into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "login failed");
            let (jar, _) = flash::take(jar);
            let template = LoginTemplate {
                notice: Some(Flash::error("Something went wrong, please try again.")),
            };
            let html = template.render().unwrap_or_else(|e| format!("Error: {}", e));
            (StatusCode::INTERNAL_SERVER_ERROR, jar, Html(html)).into_response()
        }
    }
}

// Logout
pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    auth::logout(&state, &jar).await;
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/").build());
    let jar = flash::set(jar, Flash::success("Logged out successfully!"));
    (jar, Redirect::to("/"))
}

// Patient-only: draw the next ticket
pub async fn generate_token(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let user = match auth::require_role(&state, &jar, ROLE_PATIENT).await {
        Ok(user) => user,
        Err(redirect) => return redirect.into_response(),
    };

    let jar = match state.queue.issue_ticket(&user).await {
        Ok(ticket) => flash::set(jar, Flash::success(format!("Your token is {}", ticket.code))),
        Err(err) => {
            tracing::error!(error = %err, username = %user.username, "ticket issue failed");
            flash::set(
                jar,
                Flash::error("Could not issue a token, please try again."),
            )
        }
    };
    (jar, Redirect::to("/patient")).into_response()
}

// Patient dashboard
pub async fn patient_dashboard(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let user = match auth::require_role(&state, &jar, ROLE_PATIENT).await {
        Ok(user) => user,
        Err(redirect) => return redirect.into_response(),
    };

    let (jar, notice) = flash::take(jar);
    let tokens = match state.queue.snapshot_for_role(&user).await {
        Ok(tokens) => tokens,
        Err(err) => {
            tracing::error!(error = %err, "failed to load patient tickets");
            Vec::new()
        }
    };

    let template = PatientTemplate {
        user: user.username,
        tokens,
        notice,
    };
    (jar, render_template(template)).into_response()
}

// Doctor dashboard
pub async fn doctor_dashboard(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let user = match auth::require_role(&state, &jar, ROLE_DOCTOR).await {
        Ok(user) => user,
        Err(redirect) => return redirect.into_response(),
    };

    let (jar, notice) = flash::take(jar);
    let tokens = match state.queue.snapshot_for_role(&user).await {
        Ok(tokens) => tokens,
        Err(err) => {
            tracing::error!(error = %err, "failed to load ticket list");
            Vec::new()
        }
    };

    let template = DoctorTemplate {
        user: user.username,
        tokens,
        notice,
    };
    (jar, render_template(template)).into_response()
}

// Doctor-only: advance the queue
pub async fn call_next(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let user = match auth::require_role(&state, &jar, ROLE_DOCTOR).await {
        Ok(user) => user,
        Err(redirect) => return redirect.into_response(),
    };

    let jar = match state.queue.call_next(&user).await {
        Ok(Some(called)) => flash::set(
            jar,
            Flash::success(format!(
                "Now calling {} ({})",
                called.ticket.code, called.owner
            )),
        ),
        Ok(None) => flash::set(jar, Flash::info("No patients waiting.")),
        Err(err) => {
            tracing::error!(error = %err, username = %user.username, "call next failed");
            flash::set(jar, Flash::error("Could not advance the queue."))
        }
    };
    (jar, Redirect::to("/doctor")).into_response()
}
