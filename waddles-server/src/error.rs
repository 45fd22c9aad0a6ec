use waddles_core::RoomError;
use waddles_types::{ErrorCode, ErrorResponse, PlayerId, RoomId};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Room(#[from] RoomError),
    #[error("Room {0} does not exist or you are not a member")]
    RoomNotFound(RoomId),
    #[error("Player {0} is not connected")]
    PlayerNotConnected(PlayerId),
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::Room(error) => error.code(),
            ServiceError::RoomNotFound(_) | ServiceError::PlayerNotConnected(_) => {
                ErrorCode::NotFound
            }
            ServiceError::ConnectionClosed | ServiceError::Internal(_) => ErrorCode::Unexpected,
        }
    }

    /// The error as reported to the client
    pub fn to_response(&self) -> ErrorResponse {
        match self {
            ServiceError::Room(error) => ErrorResponse::from(error),
            ServiceError::ConnectionClosed | ServiceError::Internal(_) => {
                ErrorResponse::unexpected()
            }
            other => ErrorResponse::new(other.code(), other.to_string()),
        }
    }
}
