use std::fmt;

use tracing::debug;
use uuid::Uuid;
use waddles_types::{redact_attempts, Attempt, PlayerId, PlayerSnapshot, PushEvent, RoomId};

use crate::fields::{Attempts, Name, Score, TotalScore};
use crate::{ChannelRef, Replicated, RoomError, ScoringEngine, Subscribers};

pub const MAX_NAME_LENGTH: usize = 32;

/// A connected participant.
///
/// A `Player` value is owned by exactly one place at a time: the lobby while
/// it is in no room, or the member list of the room it occupies.
pub struct Player {
    id: PlayerId,
    channel: ChannelRef,
    room: Option<RoomId>,
    name: Replicated<Name>,
    score: Replicated<Score>,
    total_score: Replicated<TotalScore>,
    attempts: Replicated<Attempts>,
    subscribers: Subscribers,
}

impl Player {
    pub fn new(channel: ChannelRef) -> Self {
        Self::with_id(Uuid::new_v4(), channel)
    }

    pub fn with_id(id: PlayerId, channel: ChannelRef) -> Self {
        let mut subscribers = Subscribers::new();
        // A player always observes its own fields
        subscribers.subscribe(id, channel.clone());

        Self {
            id,
            channel,
            room: None,
            name: Replicated::new(id, guest_name()).writable_by(id),
            score: Replicated::new(id, 0),
            total_score: Replicated::new(id, 0),
            attempts: Replicated::new(id, Vec::new()),
            subscribers,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn channel(&self) -> ChannelRef {
        self.channel.clone()
    }

    /// Delivers an event to this player's own connection
    pub fn push(&self, event: PushEvent) {
        self.channel.push(event);
    }

    pub fn room(&self) -> Option<&RoomId> {
        self.room.as_ref()
    }

    pub(crate) fn set_room(&mut self, room: Option<RoomId>) {
        self.room = room;
    }

    pub fn name(&self) -> &str {
        self.name.get()
    }

    /// Renames the player on behalf of `caller`; only the player itself may
    pub fn set_name(&mut self, caller: PlayerId, name: &str) -> Result<(), RoomError> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
            return Err(RoomError::InvalidName(format!(
                "names must be between 1 and {MAX_NAME_LENGTH} characters"
            )));
        }
        self.name
            .set_remote(caller, name.to_string(), &self.subscribers)?;
        Ok(())
    }

    pub fn score(&self) -> u32 {
        *self.score.get()
    }

    pub fn total_score(&self) -> u32 {
        *self.total_score.get()
    }

    pub fn reset_score(&mut self) {
        self.score.set(0, &self.subscribers);
    }

    /// Credits a round win to both the match score and the lifetime total
    pub fn award_win(&mut self) {
        let score = self.score() + 1;
        let total = self.total_score() + 1;
        self.score.set(score, &self.subscribers);
        self.total_score.set(total, &self.subscribers);
    }

    pub fn attempts(&self) -> &[Attempt] {
        self.attempts.get()
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempts.get().len() as u32
    }

    pub fn clear_attempts(&mut self) {
        self.attempts.set(Vec::new(), &self.subscribers);
    }

    /// Appends a scored guess. Unless `reveal` is set, viewers other than the
    /// player itself receive the verdicts without letters.
    pub fn push_attempt(&mut self, attempt: Attempt, reveal: bool) {
        let mut attempts = self.attempts.get().clone();
        attempts.push(attempt);

        let own_id = self.id;
        self.attempts
            .set_projected(attempts, &self.subscribers, |viewer, value| {
                if reveal || viewer == own_id {
                    value.clone()
                } else {
                    redact_attempts(value)
                }
            });
    }

    /// Whether the latest attempt matched every letter
    pub fn guessed_word(&self) -> bool {
        self.attempts
            .get()
            .last()
            .is_some_and(|attempt| ScoringEngine::is_solved(attempt))
    }

    /// Solved, or out of attempts for this round
    pub fn is_finished(&self, allowed_attempts: u32) -> bool {
        self.guessed_word() || self.attempt_count() >= allowed_attempts
    }

    /// Lets `viewer` observe this player's fields
    pub fn share_with(&mut self, viewer: PlayerId, channel: ChannelRef) -> bool {
        self.subscribers.subscribe(viewer, channel)
    }

    pub fn unshare_with(&mut self, viewer: PlayerId) -> bool {
        if viewer == self.id {
            return false;
        }
        self.subscribers.unsubscribe(viewer)
    }

    pub fn is_visible_to(&self, viewer: PlayerId) -> bool {
        self.subscribers.contains(viewer)
    }

    pub fn viewer_count(&self) -> usize {
        self.subscribers.len()
    }

    /// The player's data as `viewer` is allowed to see it
    pub fn retrieve(&self, viewer: PlayerId, reveal: bool) -> Result<PlayerSnapshot, RoomError> {
        if !self.is_visible_to(viewer) {
            debug!("Player {} is not shared with {}", self.id, viewer);
            return Err(RoomError::PlayerNotFound(self.id));
        }

        let attempts = if reveal || viewer == self.id {
            self.attempts.get().clone()
        } else {
            redact_attempts(self.attempts.get())
        };

        Ok(PlayerSnapshot {
            id: self.id,
            name: self.name().to_string(),
            score: self.score(),
            total_score: self.total_score(),
            attempts,
        })
    }
}

impl fmt::Debug for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Player")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("room", &self.room)
            .field("score", &self.score())
            .field("total_score", &self.total_score())
            .field("attempts", &self.attempt_count())
            .finish()
    }
}

fn guest_name() -> String {
    format!("Guest{}", rand::random_range(0..1000))
}
