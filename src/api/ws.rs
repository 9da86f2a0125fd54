//! WebSocket endpoint pushing `update_tokens` events to dashboards.
//!
//! Any authenticated session may subscribe. There is no replay: a fresh
//! connection only sees broadcasts that happen after it, current state
//! comes from the dashboard render.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::CookieJar;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::debug;

use crate::auth;
use crate::AppState;

/// GET /ws
pub async fn queue_ws(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, StatusCode> {
    // The session cookie rides along on the upgrade request
    if auth::session_user(&state, &jar).await.is_none() {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(ws.on_upgrade(move |socket| handle_queue_stream(socket, state)))
}

async fn handle_queue_stream(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut subscription = state.notifier.subscribe().await;

    loop {
        tokio::select! {
            event = subscription.rx.recv() => {
                match event {
                    Some(event) => {
                        let payload = match serde_json::to_string(&event) {
                            Ok(payload) => payload,
                            Err(e) => {
                                debug!(error = %e, "failed to serialize queue event");
                                continue;
                            }
                        };
                        if sender.send(Message::Text(payload.into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            // Handle incoming messages (for ping/pong or close)
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    state.notifier.unsubscribe(subscription.id).await;
}
