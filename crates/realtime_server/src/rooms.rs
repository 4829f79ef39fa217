//! Room registry: authoritative presence records per room.
//!
//! Each room maps connection ids to [`PlayerPresence`] records. The registry
//! is the single source of truth for who is where; broadcast scoping and the
//! snapshots sent to joining players both read from it.
//!
//! All rooms live under one lock so a room-to-room transition can remove and
//! insert atomically. No reader ever observes a player in two rooms or in
//! neither mid-move.

use std::collections::HashMap;
use studyhall_protocol::{
    current_timestamp_ms, ConnectionId, PlayerPresence, PresenceUpdate, RoomId,
};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Occupancy counters for monitoring and the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RegistryStats {
    /// Players currently in the lobby
    pub lobby: usize,
    /// Players currently in the library
    pub library: usize,
    /// Players across all rooms
    pub total: usize,
}

/// Presence records for every room, keyed by connection id.
///
/// Records are keyed by connection rather than user: a user with two tabs
/// open appears twice, and each record lives and dies with its socket.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: RwLock<HashMap<RoomId, HashMap<ConnectionId, PlayerPresence>>>,
}

impl RoomRegistry {
    /// Creates a registry with every room present and empty.
    pub fn new() -> Self {
        let mut rooms = HashMap::new();
        for room in RoomId::ALL {
            rooms.insert(room, HashMap::new());
        }
        Self {
            rooms: RwLock::new(rooms),
        }
    }

    /// Adds a presence record to `room` and returns the stored copy.
    ///
    /// Stamps the join time. Re-adding the same connection to the same room
    /// overwrites the old record, so a repeated join resets the player
    /// rather than duplicating them.
    pub async fn add_player(&self, room: RoomId, mut presence: PlayerPresence) -> PlayerPresence {
        presence.joined_at = current_timestamp_ms();
        let mut rooms = self.rooms.write().await;
        let members = rooms.entry(room).or_default();
        members.insert(presence.socket_id, presence.clone());
        info!(
            "👥 Player {} ({}) added to {} ({} present)",
            presence.username,
            presence.socket_id,
            room,
            members.len()
        );
        presence
    }

    /// Removes a connection's record from `room`, returning it if present.
    ///
    /// Idempotent: removing an absent player is a no-op returning `None`.
    pub async fn remove_player(
        &self,
        room: RoomId,
        connection_id: ConnectionId,
    ) -> Option<PlayerPresence> {
        let mut rooms = self.rooms.write().await;
        let removed = rooms.entry(room).or_default().remove(&connection_id);
        if let Some(presence) = &removed {
            debug!(
                "🚪 Player {} ({}) removed from {}",
                presence.username, connection_id, room
            );
        }
        removed
    }

    /// Merges `update` into a player's record in `room`.
    ///
    /// Returns `false` when the player is not in that room, leaving the
    /// registry untouched.
    pub async fn update_player(
        &self,
        room: RoomId,
        connection_id: ConnectionId,
        update: PresenceUpdate,
    ) -> bool {
        let mut rooms = self.rooms.write().await;
        match rooms.entry(room).or_default().get_mut(&connection_id) {
            Some(presence) => {
                presence.apply(update);
                true
            }
            None => false,
        }
    }

    /// Moves a player between rooms in one atomic step.
    ///
    /// The old record is discarded and `presence` (re-stamped with a fresh
    /// join time) becomes the player's record in `to`. Both maps change
    /// under a single write lock.
    pub async fn transition(
        &self,
        from: RoomId,
        to: RoomId,
        connection_id: ConnectionId,
        mut presence: PlayerPresence,
    ) -> PlayerPresence {
        presence.joined_at = current_timestamp_ms();
        let mut rooms = self.rooms.write().await;
        rooms.entry(from).or_default().remove(&connection_id);
        rooms
            .entry(to)
            .or_default()
            .insert(presence.socket_id, presence.clone());
        info!(
            "🔀 Player {} ({}) moved {} -> {}",
            presence.username, connection_id, from, to
        );
        presence
    }

    /// Returns a snapshot of everyone in `room`.
    pub async fn players(&self, room: RoomId) -> Vec<PlayerPresence> {
        self.rooms
            .read()
            .await
            .get(&room)
            .map(|members| members.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the connection ids present in `room`.
    pub async fn connection_ids(&self, room: RoomId) -> Vec<ConnectionId> {
        self.rooms
            .read()
            .await
            .get(&room)
            .map(|members| members.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Returns one player's record in `room`, if present.
    pub async fn player(&self, room: RoomId, connection_id: ConnectionId) -> Option<PlayerPresence> {
        self.rooms
            .read()
            .await
            .get(&room)
            .and_then(|members| members.get(&connection_id))
            .cloned()
    }

    /// Returns how many players are in `room`.
    pub async fn player_count(&self, room: RoomId) -> usize {
        self.rooms
            .read()
            .await
            .get(&room)
            .map(|members| members.len())
            .unwrap_or(0)
    }

    /// Returns occupancy counters across all rooms.
    pub async fn stats(&self) -> RegistryStats {
        let rooms = self.rooms.read().await;
        let lobby = rooms.get(&RoomId::Lobby).map(|m| m.len()).unwrap_or(0);
        let library = rooms.get(&RoomId::Library).map(|m| m.len()).unwrap_or(0);
        RegistryStats {
            lobby,
            library,
            total: lobby + library,
        }
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
