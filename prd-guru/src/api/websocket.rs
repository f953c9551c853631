//! WebSocket stream of one session's events.
//!
//! The first frame is `{"type":"connected","snapshot":...}`. Every
//! [`SessionEvent`](shared_types::SessionEvent) follows as its own JSON frame.
//! A client that falls behind the broadcast buffer gets a fresh
//! `{"type":"resync","snapshot":...}` instead of the missed events.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

use super::auth::AuthenticatedUser;
use super::error::ApiError;
use crate::conversation::SessionHandle;
use crate::AppState;

/// GET /ws/sessions/{id}
pub async fn session_websocket(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(session_id): Path<String>,
) -> Response {
    let Some(session) = state.sessions.get(user.id(), &session_id) else {
        return ApiError::not_found("Session").into_response();
    };
    ws.on_upgrade(move |socket| handle_session_socket(socket, session))
}

async fn snapshot_frame(kind: &str, session: &SessionHandle) -> Message {
    Message::Text(
        json!({ "type": kind, "snapshot": session.snapshot().await })
            .to_string()
            .into(),
    )
}

async fn handle_session_socket(socket: WebSocket, session: Arc<SessionHandle>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    // Subscribe before the snapshot so nothing falls between the two.
    let mut events = session.subscribe();
    let _ = tx.send(snapshot_frame("connected", &session).await);
    tracing::debug!(session_id = %session.id(), "Session socket connected");

    loop {
        tokio::select! {
            maybe_msg = receiver.next() => {
                match maybe_msg {
                    Some(Ok(Message::Text(text))) => {
                        let parsed: serde_json::Value =
                            serde_json::from_str(&text).unwrap_or_else(|_| json!({}));
                        if parsed.get("type").and_then(|v| v.as_str()) == Some("ping") {
                            let _ = tx.send(Message::Text(json!({"type":"pong"}).to_string().into()));
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = tx.send(Message::Pong(data));
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Session websocket receive error");
                        break;
                    }
                }
            }
            event = events.recv() => {
                match event {
                    Ok(event) => match serde_json::to_string(&event) {
                        Ok(text) => {
                            let _ = tx.send(Message::Text(text.into()));
                        }
                        Err(e) => tracing::warn!(error = %e, "Failed to encode session event"),
                    },
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(session_id = %session.id(), skipped, "Session socket lagged");
                        let _ = tx.send(snapshot_frame("resync", &session).await);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    writer.abort();
    tracing::debug!(session_id = %session.id(), "Session socket closed");
}
