use crate::{PlayerId, RoomId};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Classification of one guessed character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum Verdict {
    Matches,  // correct letter in correct position
    Contains, // correct letter in wrong position
    Absent,   // letter not in word
    Unknown,  // not classified yet
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LetterVerdict {
    pub verdict: Verdict,
    pub letter: Option<char>,
}

impl LetterVerdict {
    pub fn new(verdict: Verdict, letter: Option<char>) -> Self {
        Self { verdict, letter }
    }

    pub fn is_match(&self) -> bool {
        self.verdict == Verdict::Matches
    }

    /// Same verdict with the letter stripped, as shown to opponents
    pub fn redacted(&self) -> Self {
        Self {
            verdict: self.verdict,
            letter: None,
        }
    }
}

/// One scored guess, one verdict per character of the secret word
pub type Attempt = Vec<LetterVerdict>;

/// Strips the letters from every verdict of every attempt
pub fn redact_attempts(attempts: &[Attempt]) -> Vec<Attempt> {
    attempts
        .iter()
        .map(|attempt| attempt.iter().map(LetterVerdict::redacted).collect())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum ScoringMode {
    /// The player to first guess the word wins
    Speed,
    /// The lowest number of attempts determines who wins
    Attempts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum WordSelectionMode {
    /// The word is randomly chosen from the word list
    Randomized,
    /// The word is entered by one of the players in the room
    Entered,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GameSettings {
    pub allowed_attempts: u32,
    pub total_rounds: u32,
    pub scoring_mode: ScoringMode,
    pub word_selection_mode: WordSelectionMode,
    /// Every word has the same length
    pub word_list: Vec<String>,
    pub word_list_name: String,
    /// Whether opponents see the letters of each other's attempts
    pub reveal_opponent_letters: bool,
}

impl GameSettings {
    /// Length of the words in the list, if the list is non-empty
    pub fn word_length(&self) -> Option<usize> {
        self.word_list.first().map(|word| word.chars().count())
    }
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            allowed_attempts: 6,
            total_rounds: 3,
            scoring_mode: ScoringMode::Speed,
            word_selection_mode: WordSelectionMode::Randomized,
            word_list: ["crane", "doggo", "plant", "storm", "quilt", "brave", "ghost", "lemon"]
                .iter()
                .map(|word| word.to_string())
                .collect(),
            word_list_name: "starter".to_string(),
            reveal_opponent_letters: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum GameStatus {
    Waiting,       // No match running
    ChoosingWord,  // The chooser has to enter the secret word
    Playing,       // Players are guessing
    ShowingWinner, // Round decided, waiting for the admin
}

/// Authoritative game progress of a room.
///
/// Values are only built through the transition constructors below, each of
/// which returns a complete state for its status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GameState {
    status: GameStatus,
    round: u32,
    chooser_id: Option<PlayerId>,
    winner_id: Option<PlayerId>,
}

impl GameState {
    /// Initial state of a fresh room
    pub fn waiting() -> Self {
        Self {
            status: GameStatus::Waiting,
            round: 0,
            chooser_id: None,
            winner_id: None,
        }
    }

    pub fn choosing_word(round: u32, chooser: PlayerId) -> Self {
        Self {
            status: GameStatus::ChoosingWord,
            round,
            chooser_id: Some(chooser),
            winner_id: None,
        }
    }

    pub fn playing(round: u32, chooser: Option<PlayerId>) -> Self {
        Self {
            status: GameStatus::Playing,
            round,
            chooser_id: chooser,
            winner_id: None,
        }
    }

    /// Round decided; `winner` is `None` on a draw
    pub fn showing_winner(&self, winner: Option<PlayerId>) -> Self {
        Self {
            status: GameStatus::ShowingWinner,
            round: self.round,
            chooser_id: None,
            winner_id: winner,
        }
    }

    /// Match over; the last round and its outcome stay visible
    pub fn finished(&self) -> Self {
        Self {
            status: GameStatus::Waiting,
            round: self.round,
            chooser_id: None,
            winner_id: self.winner_id,
        }
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn chooser_id(&self) -> Option<PlayerId> {
        self.chooser_id
    }

    pub fn winner_id(&self) -> Option<PlayerId> {
        self.winner_id
    }

    /// Whether a round is underway that a chooser can stall
    pub fn is_round_active(&self) -> bool {
        matches!(self.status, GameStatus::ChoosingWord | GameStatus::Playing)
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::waiting()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Accessibility {
    pub private: bool,
    pub max_player_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RoomSnapshot {
    pub id: RoomId,
    pub accessibility: Accessibility,
    pub player_ids: Vec<PlayerId>,
    pub settings: GameSettings,
    pub state: GameState,
}
