use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{error, info, warn};
use warp::ws::{Message, WebSocket};

use crate::directory::RoomDirectory;
use crate::error::ServiceError;
use waddles_types::ClientMessage;

pub mod connection;
pub mod handlers;
pub mod rate_limiter;

use connection::ConnectionId;
pub use connection::{ConnectionChannel, ConnectionManager};
use handlers::MessageHandler;
use rate_limiter::{RateLimitConfig, RateLimiter};

pub async fn handle_connection(
    websocket: WebSocket,
    connection_manager: Arc<ConnectionManager>,
    directory: Arc<RoomDirectory>,
    rate_limit: RateLimitConfig,
) {
    let connection_id = ConnectionId::new();

    let (mut ws_sender, mut ws_receiver) = websocket.split();
    let mut rate_limiter = RateLimiter::from_config(rate_limit);

    // Create connection and get receiver for outgoing messages
    let (channel, message_receiver) = connection_manager.create_connection(connection_id).await;
    let player_id = directory.connect(Arc::new(channel));
    info!(
        "New WebSocket connection {} for player {}",
        connection_id, player_id
    );

    let message_handler = MessageHandler::new(
        connection_id,
        player_id,
        connection_manager.clone(),
        directory.clone(),
    );

    // Handle incoming messages
    let incoming_handler = {
        let message_handler = message_handler.clone();

        async move {
            while let Some(result) = ws_receiver.next().await {
                match result {
                    Ok(msg) => {
                        if let Err(e) =
                            handle_message(msg, &mut rate_limiter, &message_handler, connection_id)
                                .await
                        {
                            error!("Closing connection {}: {}", connection_id, e);
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("WebSocket error for {}: {}", connection_id, e);
                        break;
                    }
                }
            }
        }
    };

    // Handle outgoing messages
    let outgoing_handler = async move {
        let mut receiver = message_receiver;

        while let Some(message) = receiver.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize message: {:?}", e);
                    continue;
                }
            };

            if let Err(e) = ws_sender.send(Message::text(json)).await {
                warn!("Failed to send message to {}: {:?}", connection_id, e);
                break;
            }
        }
    };

    // Run both handlers concurrently
    tokio::select! {
        _ = incoming_handler => {},
        _ = outgoing_handler => {},
    }

    // Leave the room before the connection goes away
    message_handler.handle_disconnect().await;
    connection_manager.remove_connection(connection_id).await;
    info!("Connection {} disconnected", connection_id);
}

#[derive(Debug, thiserror::Error)]
enum ConnectionError {
    #[error("rate limit exceeded")]
    RateLimited,
    #[error(transparent)]
    Service(#[from] ServiceError),
}

async fn handle_message(
    msg: Message,
    rate_limiter: &mut RateLimiter,
    message_handler: &MessageHandler,
    connection_id: ConnectionId,
) -> Result<(), ConnectionError> {
    if !rate_limiter.check_rate_limit() {
        warn!("Rate limit exceeded for connection {}", connection_id);
        return Err(ConnectionError::RateLimited);
    }

    // Only handle text messages
    let Ok(text) = msg.to_str() else {
        return Ok(());
    };

    let client_message: ClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            warn!("Ignoring malformed message from {}: {}", connection_id, e);
            return Ok(());
        }
    };

    message_handler.handle_message(client_message).await?;
    Ok(())
}
