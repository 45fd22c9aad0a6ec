use std::fmt;

use rand::seq::IndexedRandom;
use tracing::{debug, info, warn};
use waddles_types::{
    Accessibility, Attempt, GameSettings, GameState, GameStatus, PlayerId, PlayerSnapshot,
    PushEvent, RoomId, RoomSnapshot, ScoringMode, WordSelectionMode,
};

use crate::fields::{RoomAccessibility, Settings, State};
use crate::{
    EventManager, Occupancy, Player, Replicated, RoomError, RoomEvent, ScoringEngine, Subscribers,
};

pub const MIN_PLAYER_COUNT: u32 = 2;

/// A player the room refused, handed back to the caller untouched
#[derive(Debug)]
pub struct RejectedPlayer {
    pub player: Player,
    pub reason: RoomError,
}

/// One game session and its members.
///
/// Members are kept in join order; the first member is the admin and the
/// order drives chooser rotation in entered-word mode.
pub struct Room {
    id: RoomId,
    players: Vec<Player>,
    subscribers: Subscribers,
    settings: Replicated<Settings>,
    accessibility: Replicated<RoomAccessibility>,
    state: Replicated<State>,
    secret_word: Option<String>,
    previous_chooser: Option<PlayerId>,
    events: EventManager<RoomEvent>,
}

impl Room {
    pub fn new(id: RoomId, settings: GameSettings, accessibility: Accessibility) -> Self {
        let accessibility = clamp_accessibility(accessibility);
        Self {
            settings: Replicated::new(id.clone(), settings),
            accessibility: Replicated::new(id.clone(), accessibility),
            state: Replicated::new(id.clone(), GameState::waiting()),
            id,
            players: Vec::new(),
            subscribers: Subscribers::new(),
            secret_word: None,
            previous_chooser: None,
            events: EventManager::new(),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn settings(&self) -> &GameSettings {
        self.settings.get()
    }

    pub fn accessibility(&self) -> Accessibility {
        *self.accessibility.get()
    }

    pub fn state(&self) -> &GameState {
        self.state.get()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(Player::id).collect()
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id() == id)
    }

    fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id() == id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.player(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.accessibility().max_player_count as usize
    }

    pub fn admin_id(&self) -> Option<PlayerId> {
        self.players.first().map(Player::id)
    }

    pub fn occupancy(&self) -> Occupancy {
        let accessibility = self.accessibility();
        Occupancy {
            room_id: self.id.clone(),
            private: accessibility.private,
            max_player_count: accessibility.max_player_count,
            player_count: self.players.len(),
        }
    }

    /// Registers a listener for this room's events under `label`
    pub fn on_event<F>(&mut self, label: &str, listener: F) -> bool
    where
        F: Fn(&RoomEvent) + Send + Sync + 'static,
    {
        self.events.on(label, listener)
    }

    pub fn off_event(&mut self, label: &str) -> bool {
        self.events.off(label)
    }

    fn emit_occupancy(&self) {
        self.events.emit(&RoomEvent::OccupancyChanged(self.occupancy()));
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            id: self.id.clone(),
            accessibility: self.accessibility(),
            player_ids: self.player_ids(),
            settings: self.settings().clone(),
            state: self.state().clone(),
        }
    }

    fn require_admin(&self, caller: PlayerId) -> Result<(), RoomError> {
        if self.admin_id() != Some(caller) {
            warn!("Player {} is not the admin of room {}", caller, self.id);
            return Err(RoomError::NotAdmin);
        }
        Ok(())
    }

    // Membership

    /// Admits a player. A full room hands the player back in the error.
    pub fn add_player(&mut self, mut player: Player) -> Result<(), RejectedPlayer> {
        if self.contains(player.id()) {
            debug!("Player {} is already in room {}", player.id(), self.id);
            return Ok(());
        }
        if self.is_full() {
            return Err(RejectedPlayer {
                player,
                reason: RoomError::RoomFull(self.id.clone()),
            });
        }

        let player_id = player.id();
        player.reset_score();
        player.clear_attempts();
        player.set_room(Some(self.id.clone()));
        for member in &mut self.players {
            member.share_with(player_id, player.channel());
            player.share_with(member.id(), member.channel());
        }
        self.subscribers.subscribe(player_id, player.channel());
        self.players.push(player);

        info!(
            "Player {} joined room {} ({}/{})",
            player_id,
            self.id,
            self.players.len(),
            self.accessibility().max_player_count
        );
        self.subscribers.publish(&PushEvent::PlayerAdded {
            room_id: self.id.clone(),
            player_id,
        });
        self.emit_occupancy();
        Ok(())
    }

    /// Takes a member out of the room and returns it, or `None` if it was not
    /// a member. Advances or settles the round when the departure would
    /// otherwise stall it.
    pub fn remove_player(&mut self, id: PlayerId) -> Option<Player> {
        let index = self.players.iter().position(|p| p.id() == id)?;
        let mut player = self.players.remove(index);

        for member in &mut self.players {
            member.unshare_with(id);
            player.unshare_with(member.id());
        }
        self.subscribers.unsubscribe(id);
        player.clear_attempts();
        player.set_room(None);

        info!("Player {} left room {}", id, self.id);
        self.subscribers.publish(&PushEvent::PlayerRemoved {
            room_id: self.id.clone(),
            player_id: id,
        });

        if !self.players.is_empty() {
            let state = self.state().clone();
            if state.chooser_id() == Some(id) && state.is_round_active() {
                info!("Chooser left room {}, moving to the next round", self.id);
                if let Err(e) = self.advance_round() {
                    warn!("Failed to advance room {}: {}", self.id, e);
                }
            } else if state.status() == GameStatus::Playing {
                if let Some(winner) = self.outcome_if_all_finished() {
                    self.declare(winner);
                }
            }
        }

        self.emit_occupancy();
        Some(player)
    }

    /// Removes `target` on the admin's behalf after telling every member,
    /// the target included. The removed player is returned to the caller.
    pub fn kick_player(
        &mut self,
        caller: PlayerId,
        target: PlayerId,
        message: Option<String>,
    ) -> Result<Player, RoomError> {
        self.require_admin(caller)?;
        if !self.contains(target) {
            return Err(RoomError::PlayerNotFound(target));
        }

        self.subscribers.publish(&PushEvent::PlayerKicked {
            room_id: self.id.clone(),
            player_id: target,
            message: message.unwrap_or_default(),
        });
        self.remove_player(target)
            .ok_or(RoomError::PlayerNotFound(target))
    }

    pub fn retrieve_player(
        &self,
        viewer: PlayerId,
        target: PlayerId,
    ) -> Result<PlayerSnapshot, RoomError> {
        let player = self
            .player(target)
            .ok_or(RoomError::PlayerNotFound(target))?;
        player.retrieve(viewer, self.settings().reveal_opponent_letters)
    }

    pub fn set_player_name(
        &mut self,
        caller: PlayerId,
        target: PlayerId,
        name: &str,
    ) -> Result<(), RoomError> {
        self.player_mut(target)
            .ok_or(RoomError::PlayerNotFound(target))?
            .set_name(caller, name)
    }

    // Game flow

    /// Resets every member's score and starts round 1
    pub fn start_game(&mut self, caller: PlayerId) -> Result<(), RoomError> {
        self.require_admin(caller)?;
        for player in &mut self.players {
            player.reset_score();
        }
        info!("Starting a new game in room {}", self.id);
        self.start_round(1)
    }

    pub fn next_round(&mut self, caller: PlayerId) -> Result<(), RoomError> {
        self.require_admin(caller)?;
        self.advance_round()
    }

    fn advance_round(&mut self) -> Result<(), RoomError> {
        let next = self.state().round() + 1;
        if next <= self.settings().total_rounds {
            self.start_round(next)
        } else {
            info!("Game over in room {} after round {}", self.id, self.state().round());
            self.secret_word = None;
            let finished = self.state().finished();
            self.state.set(finished, &self.subscribers);
            Ok(())
        }
    }

    fn start_round(&mut self, round: u32) -> Result<(), RoomError> {
        for player in &mut self.players {
            player.clear_attempts();
        }

        match self.settings().word_selection_mode {
            WordSelectionMode::Entered => {
                let chooser = self
                    .next_chooser()
                    .ok_or_else(|| RoomError::Internal("no player can choose a word".into()))?;
                self.previous_chooser = Some(chooser);
                self.secret_word = None;
                info!("Round {} in room {}: {} chooses the word", round, self.id, chooser);
                self.state
                    .set(GameState::choosing_word(round, chooser), &self.subscribers);
            }
            WordSelectionMode::Randomized => {
                let word = self
                    .settings()
                    .word_list
                    .choose(&mut rand::rng())
                    .cloned()
                    .ok_or_else(|| RoomError::Internal("word list is empty".into()))?;
                self.secret_word = Some(word);
                info!("Round {} in room {} started", round, self.id);
                self.state
                    .set(GameState::playing(round, None), &self.subscribers);
            }
        }
        Ok(())
    }

    /// The member after the previous chooser, wrapping around. Falls back to
    /// the first member when the previous chooser is gone.
    fn next_chooser(&self) -> Option<PlayerId> {
        if self.players.is_empty() {
            return None;
        }
        let next = match self
            .previous_chooser
            .and_then(|prev| self.players.iter().position(|p| p.id() == prev))
        {
            Some(index) => (index + 1) % self.players.len(),
            None => 0,
        };
        Some(self.players[next].id())
    }

    /// Sets the secret word on the chooser's behalf and opens guessing
    pub fn set_word(&mut self, caller: PlayerId, word: &str) -> Result<(), RoomError> {
        let state = self.state().clone();
        if state.status() != GameStatus::ChoosingWord {
            return Err(RoomError::RoundNotInProgress);
        }
        if state.chooser_id() != Some(caller) {
            warn!("Player {} tried to choose the word in room {}", caller, self.id);
            return Err(RoomError::NotChooser);
        }

        let word = word.trim().to_lowercase();
        if word.is_empty() || !word.chars().all(char::is_alphabetic) {
            return Err(RoomError::InvalidWord(
                "the word must consist of letters only".into(),
            ));
        }

        self.secret_word = Some(word);
        info!("Word entered in room {}, round {} is on", self.id, state.round());
        self.state.set(
            GameState::playing(state.round(), state.chooser_id()),
            &self.subscribers,
        );
        Ok(())
    }

    /// Scores a guess for `player_id` and settles the round if it is decided.
    /// The returned attempt always carries the guessed letters.
    pub fn submit_attempt(&mut self, player_id: PlayerId, guess: &str) -> Result<Attempt, RoomError> {
        if self.state().status() != GameStatus::Playing {
            return Err(RoomError::RoundNotInProgress);
        }
        let secret = self
            .secret_word
            .clone()
            .ok_or_else(|| RoomError::Internal("round is playing without a word".into()))?;
        let allowed = self.settings().allowed_attempts;
        let reveal = self.settings().reveal_opponent_letters;

        let player = self
            .player_mut(player_id)
            .ok_or(RoomError::PlayerNotFound(player_id))?;
        if player.is_finished(allowed) {
            return Err(RoomError::NoAttemptsLeft);
        }

        let guess = guess.trim().to_lowercase();
        let expected = secret.chars().count();
        if guess.chars().count() != expected {
            return Err(RoomError::InvalidWord(format!(
                "guesses must be {expected} letters long"
            )));
        }

        let attempt = ScoringEngine::score(&secret, &guess);
        player.push_attempt(attempt.clone(), reveal);
        self.check_player_attempts(player_id);
        Ok(attempt)
    }

    /// Decides the round, if the latest attempt of `player_id` settles it
    pub fn check_player_attempts(&mut self, player_id: PlayerId) {
        if self.state().status() != GameStatus::Playing {
            return;
        }
        let Some(player) = self.player(player_id) else {
            return;
        };
        let allowed = self.settings().allowed_attempts;

        let outcome = match self.settings().scoring_mode {
            ScoringMode::Speed => {
                if player.guessed_word() {
                    Some(Some(player_id))
                } else if player.attempt_count() >= allowed
                    && self.players.iter().all(|p| p.attempt_count() >= allowed)
                {
                    Some(None)
                } else {
                    None
                }
            }
            ScoringMode::Attempts => {
                if player.is_finished(allowed) {
                    self.outcome_if_all_finished()
                } else {
                    None
                }
            }
        };

        if let Some(winner) = outcome {
            self.declare(winner);
        }
    }

    /// `Some(winner)` once every member is finished; the inner `None` is a draw
    fn outcome_if_all_finished(&self) -> Option<Option<PlayerId>> {
        let allowed = self.settings().allowed_attempts;
        if self.players.is_empty() || !self.players.iter().all(|p| p.is_finished(allowed)) {
            return None;
        }

        let solvers: Vec<&Player> = self.players.iter().filter(|p| p.guessed_word()).collect();
        let winner = match self.settings().scoring_mode {
            ScoringMode::Speed => solvers.first().map(|p| p.id()),
            ScoringMode::Attempts => {
                let fewest = solvers.iter().map(|p| p.attempt_count()).min();
                let mut best = solvers.iter().filter(|p| Some(p.attempt_count()) == fewest);
                match (best.next(), best.next()) {
                    (Some(only), None) => Some(only.id()),
                    _ => None,
                }
            }
        };
        Some(winner)
    }

    fn declare(&mut self, winner: Option<PlayerId>) {
        match winner {
            Some(id) => info!("Player {} wins round {} in room {}", id, self.state().round(), self.id),
            None => info!("Round {} in room {} is a draw", self.state().round(), self.id),
        }
        let decided = self.state().showing_winner(winner);
        self.state.set(decided, &self.subscribers);
        if let Some(player) = winner.and_then(|id| self.player_mut(id)) {
            player.award_win();
        }
    }

    // Configuration

    pub fn set_settings(&mut self, caller: PlayerId, settings: GameSettings) -> Result<(), RoomError> {
        self.require_admin(caller)?;
        let settings = validate_settings(settings)?;
        self.settings.set(settings, &self.subscribers);
        Ok(())
    }

    pub fn set_accessibility(
        &mut self,
        caller: PlayerId,
        accessibility: Accessibility,
    ) -> Result<(), RoomError> {
        self.require_admin(caller)?;
        self.accessibility
            .set(clamp_accessibility(accessibility), &self.subscribers);
        self.emit_occupancy();
        Ok(())
    }
}

impl fmt::Debug for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Room")
            .field("id", &self.id)
            .field("players", &self.players)
            .field("accessibility", self.accessibility.get())
            .field("state", self.state.get())
            .finish_non_exhaustive()
    }
}

fn clamp_accessibility(accessibility: Accessibility) -> Accessibility {
    Accessibility {
        private: accessibility.private,
        max_player_count: accessibility.max_player_count.max(MIN_PLAYER_COUNT),
    }
}

/// Checks and normalizes settings submitted by an admin
pub fn validate_settings(mut settings: GameSettings) -> Result<GameSettings, RoomError> {
    if settings.allowed_attempts < 1 {
        return Err(RoomError::InvalidSettings(
            "at least one attempt must be allowed".into(),
        ));
    }
    if settings.total_rounds < 1 {
        return Err(RoomError::InvalidSettings(
            "a game needs at least one round".into(),
        ));
    }

    settings.word_list = settings
        .word_list
        .iter()
        .map(|word| word.trim().to_lowercase())
        .collect();

    let Some(length) = settings.word_length() else {
        return Err(RoomError::InvalidSettings("the word list is empty".into()));
    };
    if length == 0
        || settings
            .word_list
            .iter()
            .any(|word| word.chars().count() != length)
    {
        return Err(RoomError::InvalidSettings(
            "all words must be non-empty and of equal length".into(),
        ));
    }

    Ok(settings)
}
