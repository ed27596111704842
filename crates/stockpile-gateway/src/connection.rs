use std::collections::HashSet;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use jsonwebtoken::{DecodingKey, Validation, decode};
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

use stockpile_types::api::Claims;
use stockpile_types::events::{GatewayCommand, GatewayEvent};

use crate::dispatcher::Dispatcher;

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Handle a single WebSocket connection. The client must open with an
/// Identify command carrying its JWT, then may Subscribe to inventories;
/// inventory-scoped events are only forwarded for subscribed inventories.
pub async fn handle_connection(socket: WebSocket, dispatcher: Dispatcher, jwt_secret: String) {
    let (mut sender, mut receiver) = socket.split();

    let (user_id, username) = match wait_for_identify(&mut receiver, &jwt_secret).await {
        Some(identity) => identity,
        None => {
            warn!("WebSocket client failed to identify, closing");
            return;
        }
    };

    info!("{} ({}) connected to gateway", username, user_id);

    let ready = GatewayEvent::Ready {
        user_id,
        username: username.clone(),
    };
    let Ok(text) = serde_json::to_string(&ready) else {
        return;
    };
    if sender.send(Message::Text(text.into())).await.is_err() {
        return;
    }

    let mut broadcast_rx = dispatcher.subscribe();
    let mut subscriptions: HashSet<Uuid> = HashSet::new();

    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await;
    let mut missed_heartbeats: u8 = 0;
    let mut pong_received = true;

    loop {
        tokio::select! {
            result = broadcast_rx.recv() => {
                let event = match result {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Broadcast receiver lagged by {} events", n);
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };

                if let Some(inventory_id) = event.inventory_id() {
                    if !subscriptions.contains(&inventory_id) {
                        continue;
                    }
                }

                let Ok(text) = serde_json::to_string(&event) else {
                    continue;
                };
                if sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<GatewayCommand>(&text) {
                            Ok(GatewayCommand::Subscribe { inventory_ids }) => {
                                subscriptions = inventory_ids.into_iter().collect();
                            }
                            // Already identified
                            Ok(GatewayCommand::Identify { .. }) => {}
                            Err(e) => warn!("Unparseable gateway command: {}", e),
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        pong_received = true;
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
            _ = heartbeat.tick() => {
                if pong_received {
                    missed_heartbeats = 0;
                } else {
                    missed_heartbeats += 1;
                    if missed_heartbeats >= 2 {
                        warn!(
                            "Heartbeat timeout (missed {} pongs), dropping connection",
                            missed_heartbeats
                        );
                        break;
                    }
                }
                pong_received = false;
                if sender.send(Message::Ping(vec![].into())).await.is_err() {
                    break;
                }
            }
        }
    }

    info!("{} ({}) disconnected from gateway", username, user_id);
}

/// The first meaningful client message must be Identify with a valid JWT.
async fn wait_for_identify(
    receiver: &mut SplitStream<WebSocket>,
    jwt_secret: &str,
) -> Option<(Uuid, String)> {
    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => {
                let cmd = serde_json::from_str::<GatewayCommand>(&text).ok()?;
                let GatewayCommand::Identify { token } = cmd else {
                    return None;
                };
                let token_data = decode::<Claims>(
                    &token,
                    &DecodingKey::from_secret(jwt_secret.as_bytes()),
                    &Validation::default(),
                )
                .ok()?;
                return Some((token_data.claims.sub, token_data.claims.username));
            }
            Message::Ping(_) | Message::Pong(_) => continue,
            _ => return None,
        }
    }
    None
}
