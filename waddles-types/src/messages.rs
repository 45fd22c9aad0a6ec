use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{
    Accessibility, Attempt, ErrorResponse, GameSettings, GameState, PlayerId, PlayerSnapshot,
    RoomId, RoomSnapshot,
};

/// A request frame; the reply carries the same `request_id`
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClientMessage {
    pub request_id: u64,
    pub request: Request,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Request {
    WhoAmI,
    ConnectToRoom { room_id: Option<RoomId> },
    RetrievePlayer { player_id: PlayerId },
    SetName { player_id: PlayerId, name: String },
    SubmitAttempt { player_id: PlayerId, guess: String },
    RetrieveRoom { room_id: RoomId },
    EnterWord { room_id: RoomId, word: String },
    Start { room_id: RoomId },
    NextRound { room_id: RoomId },
    KickPlayer {
        room_id: RoomId,
        player_id: PlayerId,
        message: Option<String>,
    },
    SetAccessibility {
        room_id: RoomId,
        accessibility: Accessibility,
    },
    SetSettings {
        room_id: RoomId,
        settings: GameSettings,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ServerMessage {
    Response { request_id: u64, outcome: Outcome },
    Event(PushEvent),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Outcome {
    Success(Payload),
    Failure(ErrorResponse),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Payload {
    Done,
    Identity { player_id: PlayerId },
    Joined { room_id: RoomId },
    Player(PlayerSnapshot),
    Room(RoomSnapshot),
    Scoring { scoring: Attempt },
}

/// Fire-and-forget notifications pushed to room members
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum PushEvent {
    PlayerAdded {
        room_id: RoomId,
        player_id: PlayerId,
    },
    PlayerRemoved {
        room_id: RoomId,
        player_id: PlayerId,
    },
    PlayerKicked {
        room_id: RoomId,
        player_id: PlayerId,
        message: String,
    },
    PlayerField {
        player_id: PlayerId,
        field: PlayerField,
    },
    RoomField {
        room_id: RoomId,
        field: RoomField,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum PlayerField {
    Name(String),
    Score(u32),
    TotalScore(u32),
    Attempts(Vec<Attempt>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum RoomField {
    Settings(GameSettings),
    Accessibility(Accessibility),
    State(GameState),
}
