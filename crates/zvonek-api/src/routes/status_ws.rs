//! # Live Status Socket
//!
//! `WS /ws/status` attaches one observer to the
//! [`EventBroadcaster`](zvonek_hub::EventBroadcaster) per connection and
//! forwards every [`HubMessage`] as a JSON text frame:
//!
//! ```text
//! {"homekit_connected":false,"locked":true,"door_open":false}   on connect, then every tick
//! {"event":"doorbell"}                                           on ring
//! {"event":"lock_state_changed","state":"unlocked",
//!  "homekit_connected":true,"locked":false,"door_open":true}     on lock change
//! ```
//!
//! Client frames are ignored apart from Ping (answered with Pong) and
//! Close. The observer is detached when the peer closes, on a read or send
//! error, or when the broadcaster drops it.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};

use zvonek_hub::Subscription;

use crate::state::AppState;

/// Build the status socket router.
pub fn router() -> Router<AppState> {
    Router::new().route("/ws/status", get(status_socket))
}

/// GET /ws/status — Upgrade to the live status socket.
#[utoipa::path(
    get,
    path = "/ws/status",
    responses(
        (status = 101, description = "Switching protocols; JSON status and event frames follow"),
    ),
    tag = "status"
)]
pub(crate) async fn status_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| async move {
        let subscription = state.broadcaster.attach();
        relay(socket, subscription).await;
    })
}

async fn relay(socket: WebSocket, mut subscription: Subscription) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let id = subscription.id();

    loop {
        tokio::select! {
            message = subscription.recv() => {
                let Some(message) = message else { break };
                let text = match message.to_json() {
                    Ok(text) => text,
                    Err(err) => {
                        tracing::error!(subscriber_id = %id, error = %err, "failed to encode hub message");
                        continue;
                    }
                };
                if let Err(err) = ws_tx.send(Message::Text(text)).await {
                    tracing::warn!(subscriber_id = %id, error = %err, "status socket send failed");
                    break;
                }
            }
            incoming = ws_rx.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        if ws_tx.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Err(err)) => {
                        tracing::debug!(subscriber_id = %id, error = %err, "status socket read failed");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    // Dropping the subscription detaches it.
    drop(subscription);
    tracing::debug!(subscriber_id = %id, "status socket closed");
}
