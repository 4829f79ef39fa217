//! Connection management for the realtime server.
//!
//! This module tracks live WebSocket connections: who is on the other end,
//! where they connected from, and the bounded outbound queue frames are
//! pushed through. Room membership lives elsewhere; a connection exists here
//! from handshake to socket close regardless of which room it occupies.

pub mod client;
pub mod manager;

pub use manager::ConnectionManager;

/// Connection identifier shared with the wire protocol (`socketId` on the
/// wire).
pub use studyhall_protocol::ConnectionId;
