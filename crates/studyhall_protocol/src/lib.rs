//! # Studyhall Protocol
//!
//! Shared types and wire events for the Studyhall realtime presence server.
//! Everything that crosses the WebSocket boundary lives here: player presence
//! records, room identifiers, and the inbound/outbound event envelopes.
//!
//! ## Core Features
//!
//! - **Type Safety**: Wrapper types keep connection ids and user ids distinct
//! - **Wire Fidelity**: Serde attributes match the JSON shapes browser clients speak
//! - **Zero Transport Assumptions**: Plain data types, usable by server and test clients alike
//!
//! ## Quick Start Example
//!
//! ```rust
//! use studyhall_protocol::{ClientEvent, Facing};
//!
//! let raw = r#"{"event":"player-move","data":{"x":120.0,"y":80.0,"facing":"left"}}"#;
//! let event: ClientEvent = serde_json::from_str(raw)?;
//! assert_eq!(event, ClientEvent::PlayerMove { x: 120.0, y: 80.0, facing: Some(Facing::Left) });
//! # Ok::<(), serde_json::Error>(())
//! ```

// Core modules
pub mod constants;
pub mod events;
pub mod types;
pub mod utils;

// Re-export commonly used items for convenience
pub use constants::{
    BASE_AVATAR_ITEMS, DEFAULT_AVATAR_BODY, DEFAULT_AVATAR_HEAD, LIBRARY_SPAWN,
    LOBBY_RETURN_SPAWN, LOBBY_SPAWN, MAX_CHAT_LEN,
};
pub use events::{ClientEvent, ServerEvent};
pub use types::{
    AvatarConfig, ConnectionId, Facing, PlayerPresence, PresenceUpdate, RoomId, UserId,
    UserIdentity,
};
pub use utils::{current_timestamp, current_timestamp_ms};

/// Protocol revision advertised in logs and health reports.
/// Format: "studyhall-protocol/major.minor.patch"
pub const PROTOCOL_VERSION: &str =
    const_format::concatcp!("studyhall-protocol/", env!("CARGO_PKG_VERSION"));
