#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use waddles_core::{Channel, Player, Room};
use waddles_types::{
    Accessibility, GameSettings, PlayerId, PushEvent, ScoringMode, WordSelectionMode,
};

/// Channel that keeps every pushed event for later inspection
#[derive(Clone, Default)]
pub struct RecordingChannel {
    events: Arc<Mutex<Vec<PushEvent>>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_events(&self) -> Vec<PushEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn last_event(&self) -> Option<PushEvent> {
        self.events.lock().unwrap().last().cloned()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn has_event(&self, check_fn: impl Fn(&PushEvent) -> bool) -> bool {
        self.events.lock().unwrap().iter().any(check_fn)
    }
}

impl Channel for RecordingChannel {
    fn push(&self, event: PushEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// A connected player together with the channel its events land in
pub struct TestPlayer {
    pub id: PlayerId,
    pub channel: RecordingChannel,
}

pub fn create_test_player() -> (Player, TestPlayer) {
    let channel = RecordingChannel::new();
    let player = Player::new(Arc::new(channel.clone()));
    let handle = TestPlayer {
        id: player.id(),
        channel,
    };
    (player, handle)
}

/// Randomized settings whose list holds a single word, so the secret is known
pub fn single_word_settings(word: &str) -> GameSettings {
    GameSettings {
        word_list: vec![word.to_string()],
        word_list_name: "test".to_string(),
        ..GameSettings::default()
    }
}

pub fn entered_settings(total_rounds: u32) -> GameSettings {
    GameSettings {
        word_selection_mode: WordSelectionMode::Entered,
        total_rounds,
        ..GameSettings::default()
    }
}

pub fn attempts_settings(word: &str, allowed_attempts: u32) -> GameSettings {
    GameSettings {
        scoring_mode: ScoringMode::Attempts,
        allowed_attempts,
        ..single_word_settings(word)
    }
}

pub fn create_room(settings: GameSettings, max_player_count: u32) -> Room {
    let id = uuid::Uuid::new_v4().to_string();
    Room::new(
        id,
        settings,
        Accessibility {
            private: false,
            max_player_count,
        },
    )
}

/// Creates a room holding `count` players; the first one is the admin
pub fn create_room_with_players(settings: GameSettings, count: usize) -> (Room, Vec<TestPlayer>) {
    let mut room = create_room(settings, count.max(2) as u32);
    let mut handles = Vec::new();
    for _ in 0..count {
        let (player, handle) = create_test_player();
        room.add_player(player).unwrap();
        handles.push(handle);
    }
    (room, handles)
}
