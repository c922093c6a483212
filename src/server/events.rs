use std::sync::Arc;

use axum::{
    extract::{
        Query, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::auth::{AuthError, validate_session};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct EventsParams {
    /// Browsers cannot set headers on WebSocket requests, so the session
    /// token rides in the query string.
    pub token: String,
}

pub async fn events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EventsParams>,
    ws: WebSocketUpgrade,
) -> Result<Response, AuthError> {
    let validated = validate_session(&state, &params.token).map_err(AuthError::from)?;
    let user_id = validated.user.id;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user_id)))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, user_id: i64) {
    let subscription = state.hub.subscribe();
    let subscription_id = subscription.id;
    let mut events = subscription.receiver;

    tracing::debug!("user {user_id} subscribed to events ({subscription_id})");

    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                let payload = match serde_json::to_string(&event) {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::warn!("failed to encode event: {e}");
                        continue;
                    }
                };
                if sink.send(Message::Text(payload.into())).await.is_err() {
                    break;
                }
            }
            incoming = stream.next() => {
                // This socket only delivers; clients send nothing meaningful.
                // Any close or transport error ends the subscription.
                match incoming {
                    Some(Ok(_)) => {}
                    _ => break,
                }
            }
        }
    }

    state.hub.unsubscribe(subscription_id);
    tracing::debug!("user {user_id} unsubscribed from events ({subscription_id})");
}
