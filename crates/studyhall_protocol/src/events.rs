//! # Wire Events
//!
//! The realtime event surface, split by direction: [`ClientEvent`] covers
//! everything a browser may send, [`ServerEvent`] everything the server fans
//! out. Every frame on the wire is a JSON object of the form
//! `{"event": "<kebab-case name>", "data": {...}}`; events without a payload
//! omit `data` entirely.
//!
//! Deserialization is tolerant of unknown fields inside `data` but strict
//! about the event name: frames with an unrecognized `event` fail to parse
//! and are dropped by the server.

use crate::types::{AvatarConfig, ConnectionId, Facing, PlayerPresence, UserId};
use serde::{Deserialize, Serialize};

// ============================================================================
// Client → Server
// ============================================================================

/// Events a connected client may send.
///
/// Room-scoped events (`player-move`, `player-state`, `chat-message`,
/// `study-topic`) are silently ignored while the connection is not in a room;
/// `enter-library` / `exit-library` are additionally gated on the room the
/// connection currently occupies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Join (or re-join) the lobby at the lobby spawn point.
    JoinLobby,
    /// Movement delta; `facing` may be omitted.
    PlayerMove {
        x: f64,
        y: f64,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        facing: Option<Facing>,
    },
    /// Change the free-form display state label.
    PlayerState { state: String },
    /// Move from the lobby into the library. Ignored from any other room.
    EnterLibrary,
    /// Return from the library to the lobby. Ignored from any other room.
    ExitLibrary,
    /// Room chat. Trimmed, length-capped, and timestamped server-side.
    ChatMessage { message: String },
    /// Direct message to every live connection of the target user.
    PrivateMessage { to: UserId, message: String },
    /// Pick a study topic. Library only.
    StudyTopic { topic: String },
    /// Quiz session opened; informational only.
    StartQuiz,
    /// A quiz answer was submitted; fans out progress to everyone.
    #[serde(rename_all = "camelCase")]
    QuizAnswer {
        question_index: u32,
        is_correct: bool,
        score: u32,
    },
    /// New avatar selection; coerced against the user's unlock set.
    #[serde(rename_all = "camelCase")]
    AvatarChanged { avatar_config: AvatarConfig },
    /// An achievement was earned; fans out to everyone.
    #[serde(rename_all = "camelCase")]
    AchievementEarned {
        achievement_id: String,
        achievement_name: String,
    },
}

// ============================================================================
// Server → Client
// ============================================================================

/// Events the server delivers to clients.
///
/// Snapshot events (`lobby-state`, `library-state`) go only to the joining
/// connection; `player-quiz-progress`, `player-achievement` and
/// `player-level-updated` go to every connection regardless of room; all
/// remaining events are scoped to one room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Full lobby snapshot, sent to a connection that just joined the lobby.
    LobbyState { players: Vec<PlayerPresence> },
    /// Full library snapshot, sent to a connection that just entered the library.
    LibraryState { players: Vec<PlayerPresence> },
    /// A player appeared in the recipient's room.
    PlayerJoined(PlayerPresence),
    /// A player left the recipient's room.
    ///
    /// Carries only `socketId` on room transitions; the disconnect path adds
    /// the full identity so clients can label the departure.
    #[serde(rename_all = "camelCase")]
    PlayerLeft {
        socket_id: ConnectionId,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        user_id: Option<UserId>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        username: Option<String>,
    },
    /// A room peer moved.
    #[serde(rename_all = "camelCase")]
    PlayerMoved {
        socket_id: ConnectionId,
        user_id: UserId,
        username: String,
        x: f64,
        y: f64,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        facing: Option<Facing>,
    },
    /// A room peer changed its display state label.
    #[serde(rename_all = "camelCase")]
    PlayerStateChanged {
        socket_id: ConnectionId,
        user_id: UserId,
        state: String,
    },
    /// A room peer changed its avatar.
    #[serde(rename_all = "camelCase")]
    PlayerAvatarChanged {
        socket_id: ConnectionId,
        user_id: UserId,
        avatar_config: AvatarConfig,
    },
    /// A library peer picked a study topic.
    #[serde(rename_all = "camelCase")]
    PlayerStudying {
        socket_id: ConnectionId,
        username: String,
        topic: String,
    },
    /// Global quiz progress announcement.
    #[serde(rename_all = "camelCase")]
    PlayerQuizProgress {
        user_id: UserId,
        username: String,
        score: u32,
        timestamp: u64,
    },
    /// Global achievement announcement.
    #[serde(rename_all = "camelCase")]
    PlayerAchievement {
        user_id: UserId,
        username: String,
        achievement_id: String,
        achievement_name: String,
        timestamp: u64,
    },
    /// Global level-up announcement, relayed on behalf of the REST layer.
    #[serde(rename_all = "camelCase")]
    PlayerLevelUpdated { user_id: UserId, level: u32 },
    /// Room chat line, echoed to the sender as well.
    #[serde(rename_all = "camelCase")]
    ChatMessage {
        user_id: UserId,
        username: String,
        message: String,
        timestamp: u64,
    },
    /// Direct message delivery.
    #[serde(rename_all = "camelCase")]
    PrivateMessage {
        from: UserId,
        from_username: String,
        message: String,
        timestamp: u64,
    },
}
