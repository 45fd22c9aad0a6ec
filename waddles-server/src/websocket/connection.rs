use std::collections::HashMap;
use std::fmt;

use tokio::sync::{RwLock, mpsc};
use tracing::debug;
use uuid::Uuid;
use waddles_core::Channel;
use waddles_types::{PushEvent, ServerMessage};

use crate::error::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Push side of a connection, handed to the player it belongs to
#[derive(Debug, Clone)]
pub struct ConnectionChannel {
    connection_id: ConnectionId,
    sender: mpsc::UnboundedSender<ServerMessage>,
}

impl Channel for ConnectionChannel {
    fn push(&self, event: PushEvent) {
        if self.sender.send(ServerMessage::Event(event)).is_err() {
            debug!("Dropping event for closed connection {}", self.connection_id);
        }
    }
}

#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,
    pub sender: mpsc::UnboundedSender<ServerMessage>,
}

impl Connection {
    pub fn new(id: ConnectionId) -> (Self, mpsc::UnboundedReceiver<ServerMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { id, sender }, receiver)
    }

    pub fn channel(&self) -> ConnectionChannel {
        ConnectionChannel {
            connection_id: self.id,
            sender: self.sender.clone(),
        }
    }

    pub fn send_message(&self, message: ServerMessage) -> Result<(), ServiceError> {
        self.sender
            .send(message)
            .map_err(|_| ServiceError::ConnectionClosed)
    }
}

pub struct ConnectionManager {
    connections: RwLock<HashMap<ConnectionId, Connection>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a connection; the receiver drains everything sent to it
    pub async fn create_connection(
        &self,
        id: ConnectionId,
    ) -> (ConnectionChannel, mpsc::UnboundedReceiver<ServerMessage>) {
        let (conn, receiver) = Connection::new(id);
        let channel = conn.channel();

        {
            let mut connections = self.connections.write().await;
            connections.insert(id, conn);
        }

        (channel, receiver)
    }

    pub async fn remove_connection(&self, id: ConnectionId) -> Option<Connection> {
        let mut connections = self.connections.write().await;
        connections.remove(&id)
    }

    pub async fn send_to_connection(
        &self,
        id: ConnectionId,
        message: ServerMessage,
    ) -> Result<(), ServiceError> {
        let connections = self.connections.read().await;
        match connections.get(&id) {
            Some(connection) => connection.send_message(message),
            None => Err(ServiceError::ConnectionClosed),
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
