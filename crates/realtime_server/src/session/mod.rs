//! Per-connection session state and event routing.
//!
//! Each connection's reader task owns exactly one [`Session`] and feeds its
//! frames through the [`SessionRouter`]. Single ownership means a
//! connection's events are processed strictly in arrival order; two of its
//! room transitions can never interleave.

pub mod router;

pub use router::SessionRouter;

use studyhall_protocol::{AvatarConfig, ConnectionId, RoomId, UserIdentity};

/// Mutable per-connection state, owned by the connection's reader task.
#[derive(Debug)]
pub struct Session {
    /// Owning connection.
    pub connection_id: ConnectionId,
    /// Identity the gate bound at handshake time.
    pub identity: UserIdentity,
    /// Last validated avatar, reused on room transitions that skip lookup.
    pub avatar: AvatarConfig,
    /// Room the connection currently occupies, `None` while idle.
    pub current_room: Option<RoomId>,
}

impl Session {
    /// Creates an idle session for a freshly authenticated connection.
    pub fn new(connection_id: ConnectionId, identity: UserIdentity) -> Self {
        Self {
            connection_id,
            identity,
            avatar: AvatarConfig::default(),
            current_room: None,
        }
    }
}
