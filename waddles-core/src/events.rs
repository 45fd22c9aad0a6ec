use waddles_types::RoomId;

/// Notifications a room raises for the services that track it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    /// Membership or accessibility changed
    OccupancyChanged(Occupancy),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occupancy {
    pub room_id: RoomId,
    pub private: bool,
    pub max_player_count: u32,
    pub player_count: usize,
}

impl Occupancy {
    /// Whether a random match may place a newcomer here
    pub fn is_joinable(&self) -> bool {
        !self.private && self.player_count > 0 && self.player_count < self.max_player_count as usize
    }
}

type Listener<E> = Box<dyn Fn(&E) + Send + Sync>;

/// Labelled listener registry; the label is the handle used to detach
pub struct EventManager<E> {
    listeners: Vec<(String, Listener<E>)>,
}

impl<E> EventManager<E> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Adds a listener under `label`. Returns false if the label is taken.
    pub fn on<F>(&mut self, label: impl Into<String>, listener: F) -> bool
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let label = label.into();
        if self.listeners.iter().any(|(existing, _)| *existing == label) {
            return false;
        }
        self.listeners.push((label, Box::new(listener)));
        true
    }

    /// Removes the listener registered under `label`
    pub fn off(&mut self, label: &str) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| existing != label);
        self.listeners.len() != before
    }

    pub fn emit(&self, event: &E) {
        for (_, listener) in &self.listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl<E> Default for EventManager<E> {
    fn default() -> Self {
        Self::new()
    }
}
