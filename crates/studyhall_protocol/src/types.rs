//! # Core Type Definitions
//!
//! Fundamental types shared by the realtime server and its clients.
//!
//! ## Key Types
//!
//! - [`ConnectionId`] - Identifier for a single live WebSocket connection
//! - [`UserId`] - Stable account identity issued by the authentication layer
//! - [`RoomId`] - The fixed set of rooms players can occupy
//! - [`PlayerPresence`] - The per-connection record a room stores and broadcasts
//! - [`PresenceUpdate`] - A partial merge applied to an existing presence record
//!
//! ## Design Principles
//!
//! - **Type Safety**: Wrapper types prevent ID confusion (UserId vs ConnectionId)
//! - **Wire Fidelity**: Field names serialize exactly as browser clients expect (camelCase)
//! - **One User, Many Connections**: nothing here deduplicates a user across tabs;
//!   each connection carries its own presence record

use crate::constants::{DEFAULT_AVATAR_BODY, DEFAULT_AVATAR_HEAD};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Identity
// ============================================================================

/// Identifier for a single live realtime connection.
///
/// Allocated sequentially by the server, unique for the lifetime of the
/// process, and serialized on the wire as the `socketId` field. A fixed-width
/// integer keeps the JSON representation identical on every platform.
pub type ConnectionId = u64;

/// Stable identity for a user account, as minted by the authentication layer.
///
/// Distinct from [`ConnectionId`]: one user may hold several simultaneous
/// connections (multiple browser tabs), each with its own presence record.
///
/// # Examples
///
/// ```rust
/// use studyhall_protocol::UserId;
///
/// let id = UserId::new("u-42");
/// assert_eq!(id.as_str(), "u-42");
/// println!("User: {}", id);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    /// Wraps an existing identity string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates a new random identity using UUID v4.
    ///
    /// Handy for tests and tooling that need fresh accounts without a
    /// registration flow.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity pair the connection gate binds to a connection for its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    /// Stable account identity.
    pub user_id: UserId,
    /// Display name, immutable for the connection's lifetime.
    pub username: String,
}

impl UserIdentity {
    /// Creates a new identity pair.
    pub fn new(user_id: impl Into<UserId>, username: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
        }
    }
}

// ============================================================================
// Rooms
// ============================================================================

/// The fixed set of rooms a player can occupy.
///
/// Room membership is the unit of broadcast scoping: movement, chat, and
/// state events fan out only to connections sharing the sender's room.
///
/// # Examples
///
/// ```rust
/// use studyhall_protocol::RoomId;
///
/// assert_eq!(RoomId::Lobby.as_str(), "lobby");
/// assert_eq!(RoomId::ALL.len(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoomId {
    /// The default room every player first joins.
    Lobby,
    /// The study room, reachable only from the lobby.
    Library,
}

impl RoomId {
    /// Every room the server hosts, in registry seeding order.
    pub const ALL: [RoomId; 2] = [RoomId::Lobby, RoomId::Library];

    /// Returns the room's wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomId::Lobby => "lobby",
            RoomId::Library => "library",
        }
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Appearance
// ============================================================================

/// Which way a sprite is facing. Absent until the first movement update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Left,
    Right,
}

/// A player's avatar selection: one body variant plus one head accessory.
///
/// Variants outside the user's unlock set are coerced back to the defaults
/// by the server before this ever reaches a room broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarConfig {
    /// Body sprite variant, e.g. `"u1"` or `"cat"`.
    pub body: String,
    /// Head accessory variant, `"none"` when bare.
    pub head: String,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            body: DEFAULT_AVATAR_BODY.to_string(),
            head: DEFAULT_AVATAR_HEAD.to_string(),
        }
    }
}

// ============================================================================
// Presence
// ============================================================================

/// The per-connection record a room stores and broadcasts.
///
/// Created when a connection joins its first room, mutated by every
/// movement/state/avatar event from that connection, and destroyed on room
/// exit or disconnect. Never persisted: its whole lifetime is bounded by the
/// connection's.
///
/// Serializes with camelCase field names; `facing` and `studyingTopic` are
/// omitted entirely until first set, matching what clients expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPresence {
    /// Owning connection; primary key within a room.
    pub socket_id: ConnectionId,
    /// Stable account identity.
    pub user_id: UserId,
    /// Display name.
    pub username: String,
    /// Current (already validated) avatar selection.
    pub avatar_config: AvatarConfig,
    /// Last known X coordinate.
    pub x: f64,
    /// Last known Y coordinate.
    pub y: f64,
    /// Free-form short display label, `"idle"` on spawn.
    pub state: String,
    /// Sprite direction; absent until the first movement update.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub facing: Option<Facing>,
    /// Topic picked in the library; absent until first set.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub studying_topic: Option<String>,
    /// Insert timestamp in epoch milliseconds, stamped by the room registry.
    #[serde(default)]
    pub joined_at: u64,
}

impl PlayerPresence {
    /// Creates a fresh spawn record for `identity` at the given coordinates.
    ///
    /// The record starts in the `"idle"` state with no facing or study topic;
    /// `joined_at` is stamped later, when the registry stores the record.
    pub fn spawn(
        socket_id: ConnectionId,
        identity: &UserIdentity,
        avatar_config: AvatarConfig,
        (x, y): (f64, f64),
    ) -> Self {
        Self {
            socket_id,
            user_id: identity.user_id.clone(),
            username: identity.username.clone(),
            avatar_config,
            x,
            y,
            state: "idle".to_string(),
            facing: None,
            studying_topic: None,
            joined_at: 0,
        }
    }

    /// Merges the supplied fields of `update` into this record.
    ///
    /// Only fields present in the update change; everything else is kept.
    pub fn apply(&mut self, update: PresenceUpdate) {
        if let Some(x) = update.x {
            self.x = x;
        }
        if let Some(y) = update.y {
            self.y = y;
        }
        if let Some(facing) = update.facing {
            self.facing = Some(facing);
        }
        if let Some(state) = update.state {
            self.state = state;
        }
        if let Some(topic) = update.studying_topic {
            self.studying_topic = Some(topic);
        }
        if let Some(avatar_config) = update.avatar_config {
            self.avatar_config = avatar_config;
        }
    }
}

/// A partial presence mutation: only the populated fields are merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceUpdate {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub facing: Option<Facing>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub studying_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub avatar_config: Option<AvatarConfig>,
}

impl PresenceUpdate {
    /// Update carrying a movement delta.
    pub fn movement(x: f64, y: f64, facing: Option<Facing>) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            facing,
            ..Self::default()
        }
    }

    /// Update carrying a new display state label.
    pub fn state_label(state: impl Into<String>) -> Self {
        Self {
            state: Some(state.into()),
            ..Self::default()
        }
    }

    /// Update carrying a new study topic.
    pub fn topic(topic: impl Into<String>) -> Self {
        Self {
            studying_topic: Some(topic.into()),
            ..Self::default()
        }
    }

    /// Update carrying a new avatar selection.
    pub fn avatar(avatar_config: AvatarConfig) -> Self {
        Self {
            avatar_config: Some(avatar_config),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> UserIdentity {
        UserIdentity::new("u-1", "ada")
    }

    #[test]
    fn spawn_starts_idle_with_no_facing() {
        let presence = PlayerPresence::spawn(7, &identity(), AvatarConfig::default(), (400.0, 300.0));
        assert_eq!(presence.socket_id, 7);
        assert_eq!(presence.state, "idle");
        assert_eq!(presence.x, 400.0);
        assert_eq!(presence.y, 300.0);
        assert!(presence.facing.is_none());
        assert!(presence.studying_topic.is_none());
    }

    #[test]
    fn apply_merges_only_supplied_fields() {
        let mut presence =
            PlayerPresence::spawn(1, &identity(), AvatarConfig::default(), (400.0, 300.0));
        presence.apply(PresenceUpdate::movement(120.0, 80.0, Some(Facing::Left)));
        assert_eq!(presence.x, 120.0);
        assert_eq!(presence.y, 80.0);
        assert_eq!(presence.facing, Some(Facing::Left));
        assert_eq!(presence.state, "idle");

        presence.apply(PresenceUpdate::state_label("reading"));
        assert_eq!(presence.state, "reading");
        assert_eq!(presence.x, 120.0);
        assert_eq!(presence.facing, Some(Facing::Left));
    }

    #[test]
    fn presence_serializes_camel_case_and_omits_unset_options() {
        let presence = PlayerPresence::spawn(3, &identity(), AvatarConfig::default(), (250.0, 400.0));
        let json = serde_json::to_value(&presence).expect("Failed to serialize presence");
        assert_eq!(json["socketId"], 3);
        assert_eq!(json["userId"], "u-1");
        assert_eq!(json["avatarConfig"]["body"], "u1");
        assert_eq!(json["avatarConfig"]["head"], "none");
        assert!(json.get("facing").is_none());
        assert!(json.get("studyingTopic").is_none());
    }

    #[test]
    fn room_ids_use_wire_names() {
        assert_eq!(
            serde_json::to_string(&RoomId::Lobby).expect("Failed to serialize room"),
            "\"lobby\""
        );
        assert_eq!(
            serde_json::to_string(&RoomId::Library).expect("Failed to serialize room"),
            "\"library\""
        );
    }
}
