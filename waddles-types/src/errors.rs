use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Numeric error codes understood by clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    RoomFull,
    InvalidSettings,
    NotFound,
    NotInRoom,
    RoundNotInProgress,
    InvalidWord,
    NoAttemptsLeft,
    NotAdmin,
    NotChooser,
    NotWritable,
    Unexpected,
}

impl ErrorCode {
    pub fn value(self) -> i32 {
        match self {
            ErrorCode::RoomFull => 1,
            ErrorCode::InvalidSettings => 3,
            ErrorCode::NotFound => 4,
            ErrorCode::NotInRoom => 5,
            ErrorCode::RoundNotInProgress => 6,
            ErrorCode::InvalidWord => 7,
            ErrorCode::NoAttemptsLeft => 8,
            ErrorCode::NotAdmin => -1,
            ErrorCode::NotChooser => -2,
            ErrorCode::NotWritable => -3,
            ErrorCode::Unexpected => -1000,
        }
    }
}

/// Uniform failure payload of every request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ErrorResponse {
    pub error_message: String,
    pub error_code: i32,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error_message: message.into(),
            error_code: code.value(),
        }
    }

    pub fn unexpected() -> Self {
        Self::new(ErrorCode::Unexpected, "An unexpected error occurred")
    }
}
