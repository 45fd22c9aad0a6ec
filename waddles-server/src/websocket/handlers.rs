use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tracing::{error, info, warn};
use waddles_types::{
    ClientMessage, ErrorResponse, Outcome, Payload, PlayerId, Request, ServerMessage,
};

use crate::directory::RoomDirectory;
use crate::error::ServiceError;
use crate::websocket::connection::{ConnectionId, ConnectionManager};

#[derive(Clone)]
pub struct MessageHandler {
    connection_id: ConnectionId,
    player_id: PlayerId,
    connection_manager: Arc<ConnectionManager>,
    directory: Arc<RoomDirectory>,
}

impl MessageHandler {
    pub fn new(
        connection_id: ConnectionId,
        player_id: PlayerId,
        connection_manager: Arc<ConnectionManager>,
        directory: Arc<RoomDirectory>,
    ) -> Self {
        Self {
            connection_id,
            player_id,
            connection_manager,
            directory,
        }
    }

    /// Answers one request. Failures, panics included, become an error
    /// response for this request only.
    pub async fn handle_message(&self, message: ClientMessage) -> Result<(), ServiceError> {
        let ClientMessage {
            request_id,
            request,
        } = message;

        let outcome = match AssertUnwindSafe(self.dispatch(request)).catch_unwind().await {
            Ok(Ok(payload)) => Outcome::Success(payload),
            Ok(Err(e)) => {
                match &e {
                    ServiceError::Internal(_) | ServiceError::ConnectionClosed => {
                        error!("Request {} from {} failed: {}", request_id, self.player_id, e)
                    }
                    _ => warn!("Request {} from {} refused: {}", request_id, self.player_id, e),
                }
                Outcome::Failure(e.to_response())
            }
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(
                    "Request {} from {} panicked: {}",
                    request_id, self.player_id, reason
                );
                Outcome::Failure(ErrorResponse::unexpected())
            }
        };

        self.connection_manager
            .send_to_connection(
                self.connection_id,
                ServerMessage::Response {
                    request_id,
                    outcome,
                },
            )
            .await
    }

    async fn dispatch(&self, request: Request) -> Result<Payload, ServiceError> {
        let me = self.player_id;
        let directory = &self.directory;

        match request {
            Request::WhoAmI => Ok(Payload::Identity {
                player_id: directory.who_am_i(me)?,
            }),
            Request::ConnectToRoom { room_id } => {
                let room_id = directory.connect_to_room(me, room_id).await?;
                Ok(Payload::Joined { room_id })
            }
            Request::RetrievePlayer { player_id } => directory
                .retrieve_player(me, player_id)
                .await
                .map(Payload::Player),
            Request::SetName { player_id, name } => {
                directory.set_name(me, player_id, &name).await?;
                Ok(Payload::Done)
            }
            Request::SubmitAttempt { player_id, guess } => {
                let scoring = directory.submit_attempt(me, player_id, &guess).await?;
                Ok(Payload::Scoring { scoring })
            }
            Request::RetrieveRoom { room_id } => directory
                .retrieve_room(me, &room_id)
                .await
                .map(Payload::Room),
            Request::EnterWord { room_id, word } => {
                directory.enter_word(me, &room_id, &word).await?;
                Ok(Payload::Done)
            }
            Request::Start { room_id } => {
                directory.start(me, &room_id).await?;
                Ok(Payload::Done)
            }
            Request::NextRound { room_id } => {
                directory.next_round(me, &room_id).await?;
                Ok(Payload::Done)
            }
            Request::KickPlayer {
                room_id,
                player_id,
                message,
            } => {
                directory.kick_player(me, &room_id, player_id, message).await?;
                Ok(Payload::Done)
            }
            Request::SetAccessibility {
                room_id,
                accessibility,
            } => {
                directory
                    .set_accessibility(me, &room_id, accessibility)
                    .await?;
                Ok(Payload::Done)
            }
            Request::SetSettings { room_id, settings } => {
                directory.set_settings(me, &room_id, settings).await?;
                Ok(Payload::Done)
            }
        }
    }

    pub async fn handle_disconnect(&self) {
        info!(
            "Handling disconnect for connection {} (player {})",
            self.connection_id, self.player_id
        );
        self.directory.disconnect(self.player_id).await;
    }
}
