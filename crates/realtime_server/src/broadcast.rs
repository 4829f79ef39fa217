//! Broadcast dispatcher: room-scoped and global event fan-out.
//!
//! Events are serialized once per broadcast, then queued per recipient via
//! the connection manager's non-blocking send. A slow or closed recipient
//! costs that recipient its frame and nothing more; the loop never awaits a
//! send, so one stalled socket cannot hold up a room.

use crate::connection::ConnectionManager;
use crate::rooms::RoomRegistry;
use std::sync::Arc;
use studyhall_protocol::{ConnectionId, RoomId, ServerEvent, UserId};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error};

/// Fans server events out to rooms, users, and single connections.
#[derive(Clone)]
pub struct BroadcastDispatcher {
    registry: Arc<RoomRegistry>,
    connections: Arc<ConnectionManager>,
}

impl BroadcastDispatcher {
    /// Creates a dispatcher over the given registry and connection manager.
    pub fn new(registry: Arc<RoomRegistry>, connections: Arc<ConnectionManager>) -> Self {
        Self {
            registry,
            connections,
        }
    }

    /// Sends `event` to everyone in `room`, sender included.
    ///
    /// Returns how many recipients the frame was queued for.
    pub async fn to_room(&self, room: RoomId, event: &ServerEvent) -> usize {
        let targets = self.registry.connection_ids(room).await;
        self.fan_out(targets, event)
    }

    /// Sends `event` to everyone in `room` except `sender`.
    pub async fn to_room_except(
        &self,
        room: RoomId,
        sender: ConnectionId,
        event: &ServerEvent,
    ) -> usize {
        let targets = self
            .registry
            .connection_ids(room)
            .await
            .into_iter()
            .filter(|id| *id != sender)
            .collect();
        self.fan_out(targets, event)
    }

    /// Sends `event` to every live connection, in or out of a room.
    pub async fn to_all(&self, event: &ServerEvent) -> usize {
        let targets = self.connections.connection_ids().await;
        self.fan_out(targets, event)
    }

    /// Sends `event` to one connection.
    ///
    /// Returns whether the frame was queued.
    pub fn to_connection(&self, connection_id: ConnectionId, event: &ServerEvent) -> bool {
        match encode(event) {
            Some(message) => self.connections.try_send(connection_id, message),
            None => false,
        }
    }

    /// Sends `event` to every connection a user holds.
    ///
    /// Returns how many of the user's connections the frame was queued for;
    /// zero means the user is offline.
    pub async fn to_user(&self, user_id: &UserId, event: &ServerEvent) -> usize {
        let targets = self.connections.connections_for_user(user_id).await;
        self.fan_out(targets, event)
    }

    fn fan_out(&self, targets: Vec<ConnectionId>, event: &ServerEvent) -> usize {
        let message = match encode(event) {
            Some(message) => message,
            None => return 0,
        };

        let mut delivered = 0;
        for connection_id in targets {
            if self.connections.try_send(connection_id, message.clone()) {
                delivered += 1;
            }
        }
        debug!("📡 Broadcast delivered to {} connection(s)", delivered);
        delivered
    }
}

/// Serializes an event into a text frame, once per broadcast.
fn encode(event: &ServerEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Message::text(json)),
        Err(e) => {
            error!("Failed to serialize server event: {}", e);
            None
        }
    }
}
