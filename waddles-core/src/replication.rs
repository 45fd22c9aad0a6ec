//! Server-authoritative fields mirrored to remote viewers.
//!
//! Every synchronized value lives in a [`Replicated`] field. Writing a field
//! goes through one `set` path that applies the value locally and pushes it
//! to the viewers in the owning entity's [`Subscribers`] registry. Reading is
//! local and never pushes anything.

use std::fmt;
use std::sync::Arc;

use waddles_types::{
    Accessibility, Attempt, GameSettings, GameState, PlayerField, PlayerId, PushEvent, RoomField,
    RoomId,
};

use crate::RoomError;

/// Outbound, fire-and-forget delivery to one connected client
pub trait Channel: Send + Sync {
    fn push(&self, event: PushEvent);
}

pub type ChannelRef = Arc<dyn Channel>;

/// Viewers allowed to observe one entity, keyed by viewer id
#[derive(Clone, Default)]
pub struct Subscribers {
    viewers: Vec<(PlayerId, ChannelRef)>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the viewer was already subscribed
    pub fn subscribe(&mut self, viewer: PlayerId, channel: ChannelRef) -> bool {
        if self.contains(viewer) {
            return false;
        }
        self.viewers.push((viewer, channel));
        true
    }

    pub fn unsubscribe(&mut self, viewer: PlayerId) -> bool {
        let before = self.viewers.len();
        self.viewers.retain(|(id, _)| *id != viewer);
        self.viewers.len() != before
    }

    pub fn contains(&self, viewer: PlayerId) -> bool {
        self.viewers.iter().any(|(id, _)| *id == viewer)
    }

    pub fn len(&self) -> usize {
        self.viewers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.viewers.is_empty()
    }

    pub fn viewer_ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.viewers.iter().map(|(id, _)| *id)
    }

    /// Pushes the same event to every viewer
    pub fn publish(&self, event: &PushEvent) {
        for (_, channel) in &self.viewers {
            channel.push(event.clone());
        }
    }

    /// Pushes an event built for each viewer
    pub fn publish_with(&self, build: impl Fn(PlayerId) -> PushEvent) {
        for (viewer, channel) in &self.viewers {
            channel.push(build(*viewer));
        }
    }
}

impl fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.viewer_ids()).finish()
    }
}

/// Describes one kind of replicated field and the event that carries it
pub trait Field {
    type Entity: Clone;
    type Value: Clone + PartialEq;
    const NAME: &'static str;

    fn event(entity: &Self::Entity, value: Self::Value) -> PushEvent;
}

pub struct Replicated<F: Field> {
    entity: F::Entity,
    value: F::Value,
    writer: Option<PlayerId>,
}

impl<F: Field> Replicated<F> {
    pub fn new(entity: F::Entity, value: F::Value) -> Self {
        Self {
            entity,
            value,
            writer: None,
        }
    }

    /// Grants one remote peer write access to this field
    pub fn writable_by(mut self, writer: PlayerId) -> Self {
        self.writer = Some(writer);
        self
    }

    pub fn get(&self) -> &F::Value {
        &self.value
    }

    pub fn name(&self) -> &'static str {
        F::NAME
    }

    /// Applies the value and pushes it to every subscriber.
    /// Returns false, pushing nothing, when the value is unchanged.
    pub fn set(&mut self, value: F::Value, subscribers: &Subscribers) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        let event = F::event(&self.entity, self.value.clone());
        subscribers.publish(&event);
        true
    }

    /// Like [`Replicated::set`], but each viewer receives its own view of the value
    pub fn set_projected(
        &mut self,
        value: F::Value,
        subscribers: &Subscribers,
        view: impl Fn(PlayerId, &F::Value) -> F::Value,
    ) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        subscribers.publish_with(|viewer| F::event(&self.entity, view(viewer, &self.value)));
        true
    }

    /// A write requested by a remote peer, funneled through [`Replicated::set`]
    pub fn set_remote(
        &mut self,
        caller: PlayerId,
        value: F::Value,
        subscribers: &Subscribers,
    ) -> Result<bool, RoomError> {
        if self.writer != Some(caller) {
            return Err(RoomError::NotWritable(F::NAME));
        }
        Ok(self.set(value, subscribers))
    }
}

pub mod fields {
    use super::*;

    pub struct Name;
    pub struct Score;
    pub struct TotalScore;
    pub struct Attempts;
    pub struct Settings;
    pub struct RoomAccessibility;
    pub struct State;

    impl Field for Name {
        type Entity = PlayerId;
        type Value = String;
        const NAME: &'static str = "name";

        fn event(entity: &PlayerId, value: String) -> PushEvent {
            PushEvent::PlayerField {
                player_id: *entity,
                field: PlayerField::Name(value),
            }
        }
    }

    impl Field for Score {
        type Entity = PlayerId;
        type Value = u32;
        const NAME: &'static str = "score";

        fn event(entity: &PlayerId, value: u32) -> PushEvent {
            PushEvent::PlayerField {
                player_id: *entity,
                field: PlayerField::Score(value),
            }
        }
    }

    impl Field for TotalScore {
        type Entity = PlayerId;
        type Value = u32;
        const NAME: &'static str = "totalScore";

        fn event(entity: &PlayerId, value: u32) -> PushEvent {
            PushEvent::PlayerField {
                player_id: *entity,
                field: PlayerField::TotalScore(value),
            }
        }
    }

    impl Field for Attempts {
        type Entity = PlayerId;
        type Value = Vec<Attempt>;
        const NAME: &'static str = "attempts";

        fn event(entity: &PlayerId, value: Vec<Attempt>) -> PushEvent {
            PushEvent::PlayerField {
                player_id: *entity,
                field: PlayerField::Attempts(value),
            }
        }
    }

    impl Field for Settings {
        type Entity = RoomId;
        type Value = GameSettings;
        const NAME: &'static str = "settings";

        fn event(entity: &RoomId, value: GameSettings) -> PushEvent {
            PushEvent::RoomField {
                room_id: entity.clone(),
                field: RoomField::Settings(value),
            }
        }
    }

    impl Field for RoomAccessibility {
        type Entity = RoomId;
        type Value = Accessibility;
        const NAME: &'static str = "accessibility";

        fn event(entity: &RoomId, value: Accessibility) -> PushEvent {
            PushEvent::RoomField {
                room_id: entity.clone(),
                field: RoomField::Accessibility(value),
            }
        }
    }

    impl Field for State {
        type Entity = RoomId;
        type Value = GameState;
        const NAME: &'static str = "state";

        fn event(entity: &RoomId, value: GameState) -> PushEvent {
            PushEvent::RoomField {
                room_id: entity.clone(),
                field: RoomField::State(value),
            }
        }
    }
}
