//! Registry of live rooms and of the players waiting outside them.
//!
//! Rooms are created on first reference and dropped the moment their last
//! member leaves. Each room sits behind its own async mutex, so operations
//! on one room run one at a time in arrival order while other rooms proceed
//! in parallel. A player is seated either in the lobby, which owns the
//! `Player` value, or in a room, which then owns it. Seats are only changed
//! while the room involved is locked.

use std::sync::{Arc, Weak};

use dashmap::{DashMap, DashSet};
use rand::seq::IndexedRandom;
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};
use tracing::{error, info, warn};
use uuid::Uuid;
use waddles_core::{ChannelRef, Player, Room, RoomError, RoomEvent};
use waddles_types::{
    Accessibility, Attempt, GameSettings, PlayerId, PlayerSnapshot, RoomId, RoomSnapshot,
};

use crate::error::ServiceError;

/// Label of the occupancy listener the directory attaches to every room
pub const DIRECTORY_LISTENER: &str = "directory";

// Bound on lookups that raced with a concurrent move
const MAX_RETRIES: usize = 16;

type RoomRef = Arc<Mutex<Room>>;
type OwnedRoomGuard = OwnedMutexGuard<Room>;

enum Seat {
    Lobby(Player),
    Room(RoomId),
}

pub struct RoomDirectory {
    rooms: Arc<DashMap<RoomId, RoomRef>>,
    joinable: Arc<DashSet<RoomId>>,
    seats: DashMap<PlayerId, Seat>,
    default_settings: GameSettings,
    default_max_players: u32,
}

impl RoomDirectory {
    pub fn new(default_settings: GameSettings, default_max_players: u32) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            joinable: Arc::new(DashSet::new()),
            seats: DashMap::new(),
            default_settings,
            default_max_players,
        }
    }

    // Connection lifecycle

    /// Seats a newly connected player in the lobby
    pub fn connect(&self, channel: ChannelRef) -> PlayerId {
        let player = Player::new(channel);
        let player_id = player.id();
        info!("Player {} connected as {}", player_id, player.name());
        self.seats.insert(player_id, Seat::Lobby(player));
        player_id
    }

    /// Removes the player from its room, if any, and forgets it
    pub async fn disconnect(&self, player_id: PlayerId) {
        for _ in 0..MAX_RETRIES {
            let room_id = match self.seat_room(player_id) {
                None => return,
                Some(None) => {
                    self.seats.remove(&player_id);
                    info!("Player {} disconnected from the lobby", player_id);
                    return;
                }
                Some(Some(room_id)) => room_id,
            };

            let Some(mut guard) = self.lock_member_room(&room_id, player_id).await else {
                continue;
            };
            guard.remove_player(player_id);
            self.seats.remove(&player_id);
            drop(guard);
            info!("Player {} disconnected from room {}", player_id, room_id);
            return;
        }
        error!("Gave up disconnecting player {}", player_id);
        self.seats.remove(&player_id);
    }

    // Room resolution

    /// Moves the player into the requested room, or into a random joinable
    /// room when no id is given. Returns the id of the room joined.
    pub async fn connect_to_room(
        &self,
        player_id: PlayerId,
        requested: Option<RoomId>,
    ) -> Result<RoomId, ServiceError> {
        for _ in 0..MAX_RETRIES {
            let current = self
                .seat_room(player_id)
                .ok_or(ServiceError::PlayerNotConnected(player_id))?;
            if let Some(current_id) = &current {
                if requested.as_ref() == Some(current_id) {
                    return Ok(current_id.clone());
                }
            }

            let (target_id, target) = self.resolve(requested.as_deref(), current.as_ref());
            let moved = match &current {
                None => self.join_from_lobby(player_id, &target_id, &target).await,
                Some(current_id) => {
                    self.move_between(player_id, current_id, &target_id, &target)
                        .await
                }
            };

            match moved {
                Ok(Some(())) => return Ok(target_id),
                Ok(None) => continue,
                Err(RoomError::RoomFull(_)) if requested.is_none() => {
                    // A random pick filled up meanwhile, try another one
                    continue;
                }
                Err(e) => {
                    warn!("Player {} could not join room {}: {}", player_id, target_id, e);
                    return Err(e.into());
                }
            }
        }
        Err(ServiceError::Internal(format!(
            "could not seat player {player_id}"
        )))
    }

    /// Finds or creates the room a join request refers to. A random pick
    /// never lands in `exclude`.
    fn resolve(&self, requested: Option<&str>, exclude: Option<&RoomId>) -> (RoomId, RoomRef) {
        if let Some(room_id) = requested {
            let room = self
                .rooms
                .entry(room_id.to_string())
                .or_insert_with(|| self.create_room(room_id.to_string()))
                .clone();
            return (room_id.to_string(), room);
        }

        let candidates: Vec<RoomId> = self
            .joinable
            .iter()
            .map(|id| id.key().clone())
            .filter(|id| Some(id) != exclude)
            .collect();
        if let Some(room_id) = candidates.choose(&mut rand::rng()) {
            if let Some(room) = self.room(room_id) {
                return (room_id.clone(), room);
            }
        }

        let room_id = Uuid::new_v4().to_string();
        let room = self
            .rooms
            .entry(room_id.clone())
            .or_insert_with(|| self.create_room(room_id.clone()))
            .clone();
        (room_id, room)
    }

    fn create_room(&self, room_id: RoomId) -> RoomRef {
        let mut room = Room::new(
            room_id.clone(),
            self.default_settings.clone(),
            Accessibility {
                private: false,
                max_player_count: self.default_max_players,
            },
        );

        let rooms: Weak<DashMap<RoomId, RoomRef>> = Arc::downgrade(&self.rooms);
        let joinable = Arc::downgrade(&self.joinable);
        room.on_event(DIRECTORY_LISTENER, move |event| {
            let RoomEvent::OccupancyChanged(occupancy) = event;
            let Some(joinable) = joinable.upgrade() else {
                return;
            };
            if occupancy.player_count == 0 {
                joinable.remove(&occupancy.room_id);
                if let Some(rooms) = rooms.upgrade() {
                    rooms.remove(&occupancy.room_id);
                }
                info!("Room {} is empty and was removed", occupancy.room_id);
            } else if occupancy.is_joinable() {
                joinable.insert(occupancy.room_id.clone());
            } else {
                joinable.remove(&occupancy.room_id);
            }
        });

        info!("Created room {}", room_id);
        Arc::new(Mutex::new(room))
    }

    /// `Ok(None)` means the target vanished and the caller should retry
    async fn join_from_lobby(
        &self,
        player_id: PlayerId,
        target_id: &RoomId,
        target: &RoomRef,
    ) -> Result<Option<()>, RoomError> {
        let mut guard = target.lock().await;
        if !self.is_live(target_id, target) {
            return Ok(None);
        }
        if guard.is_full() {
            return Err(RoomError::RoomFull(target_id.clone()));
        }

        let Some((_, Seat::Lobby(player))) = self
            .seats
            .remove_if(&player_id, |_, seat| matches!(seat, Seat::Lobby(_)))
        else {
            self.discard_if_empty(target_id, &guard);
            return Ok(None);
        };

        self.admit(&mut guard, player)?;
        Ok(Some(()))
    }

    async fn move_between(
        &self,
        player_id: PlayerId,
        source_id: &RoomId,
        target_id: &RoomId,
        target: &RoomRef,
    ) -> Result<Option<()>, RoomError> {
        let Some(source) = self.room(source_id) else {
            return Ok(None);
        };
        let (mut source_guard, mut target_guard) =
            lock_pair(source_id, &source, target_id, target).await;

        if !self.is_live(source_id, &source) || !source_guard.contains(player_id) {
            self.discard_if_empty(target_id, &target_guard);
            return Ok(None);
        }
        if !self.is_live(target_id, target) {
            return Ok(None);
        }
        if target_guard.is_full() {
            return Err(RoomError::RoomFull(target_id.clone()));
        }

        let Some(player) = source_guard.remove_player(player_id) else {
            return Ok(None);
        };
        self.admit(&mut target_guard, player)?;
        Ok(Some(()))
    }

    /// Adds the player to a locked room and updates its seat. A refused
    /// player goes back to the lobby.
    fn admit(&self, room: &mut MutexGuard<'_, Room>, player: Player) -> Result<(), RoomError> {
        let player_id = player.id();
        match room.add_player(player) {
            Ok(()) => {
                self.seats.insert(player_id, Seat::Room(room.id().clone()));
                Ok(())
            }
            Err(rejected) => {
                self.seats.insert(player_id, Seat::Lobby(rejected.player));
                let room_id = room.id().clone();
                self.discard_if_empty(&room_id, room);
                Err(rejected.reason)
            }
        }
    }

    /// Drops a room that was created for a join that never happened
    fn discard_if_empty(&self, room_id: &RoomId, room: &Room) {
        if room.is_empty() {
            self.joinable.remove(room_id);
            self.rooms.remove(room_id);
        }
    }

    // Player-addressed operations

    pub fn who_am_i(&self, player_id: PlayerId) -> Result<PlayerId, ServiceError> {
        if self.seats.contains_key(&player_id) {
            Ok(player_id)
        } else {
            Err(ServiceError::PlayerNotConnected(player_id))
        }
    }

    pub async fn retrieve_player(
        &self,
        viewer: PlayerId,
        target: PlayerId,
    ) -> Result<PlayerSnapshot, ServiceError> {
        self.with_seat(
            target,
            |player| player.retrieve(viewer, false),
            |room| room.retrieve_player(viewer, target),
        )
        .await
    }

    pub async fn set_name(
        &self,
        caller: PlayerId,
        target: PlayerId,
        name: &str,
    ) -> Result<(), ServiceError> {
        self.with_seat(
            target,
            |player| {
                if !player.is_visible_to(caller) {
                    return Err(RoomError::PlayerNotFound(target));
                }
                player.set_name(caller, name)
            },
            |room| {
                let visible = room
                    .player(target)
                    .is_some_and(|player| player.is_visible_to(caller));
                if !visible {
                    return Err(RoomError::PlayerNotFound(target));
                }
                room.set_player_name(caller, target, name)
            },
        )
        .await
    }

    pub async fn submit_attempt(
        &self,
        caller: PlayerId,
        target: PlayerId,
        guess: &str,
    ) -> Result<Attempt, ServiceError> {
        if caller != target {
            return Err(RoomError::NotWritable("attempts").into());
        }
        self.with_seat(
            target,
            |_| Err(RoomError::NotInRoom),
            |room| room.submit_attempt(target, guess),
        )
        .await
    }

    /// Runs one of the closures against wherever `player_id` is seated
    async fn with_seat<T>(
        &self,
        player_id: PlayerId,
        in_lobby: impl FnOnce(&mut Player) -> Result<T, RoomError>,
        in_room: impl FnOnce(&mut Room) -> Result<T, RoomError>,
    ) -> Result<T, ServiceError> {
        for _ in 0..MAX_RETRIES {
            let room_id = {
                let mut seat = self
                    .seats
                    .get_mut(&player_id)
                    .ok_or(ServiceError::PlayerNotConnected(player_id))?;
                match &mut *seat {
                    Seat::Lobby(player) => return in_lobby(player).map_err(Into::into),
                    Seat::Room(room_id) => room_id.clone(),
                }
            };

            if let Some(mut guard) = self.lock_member_room(&room_id, player_id).await {
                return in_room(&mut guard).map_err(Into::into);
            }
        }
        Err(ServiceError::Internal(format!(
            "could not locate player {player_id}"
        )))
    }

    // Room-addressed operations, open to members only

    pub async fn retrieve_room(
        &self,
        caller: PlayerId,
        room_id: &RoomId,
    ) -> Result<RoomSnapshot, ServiceError> {
        self.with_member_room(caller, room_id, |room| Ok(room.snapshot()))
            .await
    }

    pub async fn enter_word(
        &self,
        caller: PlayerId,
        room_id: &RoomId,
        word: &str,
    ) -> Result<(), ServiceError> {
        self.with_member_room(caller, room_id, |room| room.set_word(caller, word))
            .await
    }

    pub async fn start(&self, caller: PlayerId, room_id: &RoomId) -> Result<(), ServiceError> {
        self.with_member_room(caller, room_id, |room| room.start_game(caller))
            .await
    }

    pub async fn next_round(&self, caller: PlayerId, room_id: &RoomId) -> Result<(), ServiceError> {
        self.with_member_room(caller, room_id, |room| room.next_round(caller))
            .await
    }

    /// Kicks `target` back to the lobby
    pub async fn kick_player(
        &self,
        caller: PlayerId,
        room_id: &RoomId,
        target: PlayerId,
        message: Option<String>,
    ) -> Result<(), ServiceError> {
        self.with_member_room(caller, room_id, |room| {
            let player = room.kick_player(caller, target, message)?;
            info!("Player {} was kicked from room {}", target, room_id);
            self.seats.insert(target, Seat::Lobby(player));
            Ok(())
        })
        .await
    }

    pub async fn set_accessibility(
        &self,
        caller: PlayerId,
        room_id: &RoomId,
        accessibility: Accessibility,
    ) -> Result<(), ServiceError> {
        self.with_member_room(caller, room_id, |room| {
            room.set_accessibility(caller, accessibility)
        })
        .await
    }

    pub async fn set_settings(
        &self,
        caller: PlayerId,
        room_id: &RoomId,
        settings: GameSettings,
    ) -> Result<(), ServiceError> {
        self.with_member_room(caller, room_id, |room| room.set_settings(caller, settings))
            .await
    }

    async fn with_member_room<T>(
        &self,
        caller: PlayerId,
        room_id: &RoomId,
        operation: impl FnOnce(&mut Room) -> Result<T, RoomError>,
    ) -> Result<T, ServiceError> {
        let Some(mut guard) = self.lock_member_room(room_id, caller).await else {
            return Err(ServiceError::RoomNotFound(room_id.clone()));
        };
        operation(&mut guard).map_err(Into::into)
    }

    // Lookups

    fn room(&self, room_id: &str) -> Option<RoomRef> {
        self.rooms.get(room_id).map(|room| room.value().clone())
    }

    /// Whether `room` is still the one registered under `room_id`
    fn is_live(&self, room_id: &str, room: &RoomRef) -> bool {
        self.room(room_id)
            .is_some_and(|current| Arc::ptr_eq(&current, room))
    }

    /// Locks the room if it is live and `player_id` is one of its members
    async fn lock_member_room(
        &self,
        room_id: &RoomId,
        player_id: PlayerId,
    ) -> Option<OwnedRoomGuard> {
        let room = self.room(room_id)?;
        let guard = room.clone().lock_owned().await;
        if !self.is_live(room_id, &room) || !guard.contains(player_id) {
            return None;
        }
        Some(guard)
    }

    /// `None` if the player is unknown, `Some(None)` while in the lobby
    fn seat_room(&self, player_id: PlayerId) -> Option<Option<RoomId>> {
        self.seats.get(&player_id).map(|seat| match seat.value() {
            Seat::Lobby(_) => None,
            Seat::Room(room_id) => Some(room_id.clone()),
        })
    }

    pub fn player_room(&self, player_id: PlayerId) -> Option<RoomId> {
        self.seat_room(player_id).flatten()
    }

    pub fn room_exists(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn joinable_rooms(&self) -> Vec<RoomId> {
        self.joinable.iter().map(|id| id.key().clone()).collect()
    }

    pub fn player_count(&self) -> usize {
        self.seats.len()
    }
}

/// Locks two distinct rooms in id order
async fn lock_pair<'a>(
    first_id: &RoomId,
    first: &'a RoomRef,
    second_id: &RoomId,
    second: &'a RoomRef,
) -> (MutexGuard<'a, Room>, MutexGuard<'a, Room>) {
    if first_id < second_id {
        let a = first.lock().await;
        let b = second.lock().await;
        (a, b)
    } else {
        let b = second.lock().await;
        let a = first.lock().await;
        (a, b)
    }
}
