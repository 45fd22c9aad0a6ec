use waddles_types::{ErrorCode, ErrorResponse, PlayerId, RoomId};

/// Reasons a room or player operation is refused.
///
/// A refused operation leaves the room and its players untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    #[error("Room {0} is already full")]
    RoomFull(RoomId),
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
    #[error("Player {0} is not in this room")]
    PlayerNotFound(PlayerId),
    #[error("You must be in a room to enter attempts")]
    NotInRoom,
    #[error("No round is in progress")]
    RoundNotInProgress,
    #[error("Invalid word: {0}")]
    InvalidWord(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("No attempts left this round")]
    NoAttemptsLeft,
    #[error("Only the room admin may do this")]
    NotAdmin,
    #[error("Only the player choosing the word may do this")]
    NotChooser,
    #[error("Field {0} is not writable by this player")]
    NotWritable(&'static str),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RoomError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RoomError::RoomFull(_) => ErrorCode::RoomFull,
            RoomError::InvalidSettings(_) => ErrorCode::InvalidSettings,
            RoomError::PlayerNotFound(_) => ErrorCode::NotFound,
            RoomError::NotInRoom => ErrorCode::NotInRoom,
            RoomError::RoundNotInProgress => ErrorCode::RoundNotInProgress,
            RoomError::InvalidWord(_) | RoomError::InvalidName(_) => ErrorCode::InvalidWord,
            RoomError::NoAttemptsLeft => ErrorCode::NoAttemptsLeft,
            RoomError::NotAdmin => ErrorCode::NotAdmin,
            RoomError::NotChooser => ErrorCode::NotChooser,
            RoomError::NotWritable(_) => ErrorCode::NotWritable,
            RoomError::Internal(_) => ErrorCode::Unexpected,
        }
    }
}

impl From<&RoomError> for ErrorResponse {
    fn from(error: &RoomError) -> Self {
        match error {
            // Internal details stay in the server log
            RoomError::Internal(_) => ErrorResponse::unexpected(),
            other => ErrorResponse::new(other.code(), other.to_string()),
        }
    }
}
