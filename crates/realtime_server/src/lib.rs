//! # Realtime Server - Presence and Room Synchronization Core
//!
//! A production-ready realtime server for a browser-based multiplayer study
//! game. This crate handles WebSocket connection management, room-scoped
//! presence synchronization, and event fan-out, while delegating account
//! storage to a pluggable player directory.
//!
//! ## Design Philosophy
//!
//! The server keeps **no persistent state** - a presence record lives exactly
//! as long as its connection:
//!
//! * **Gated handshake** - Bearer credentials are verified before the
//!   WebSocket upgrade completes; unauthenticated sockets never reach room
//!   logic
//! * **Authoritative room registry** - One source of truth for who is where,
//!   updated atomically on room transitions
//! * **Per-session routing** - Each connection's events are processed in
//!   arrival order by a state machine that drops whatever its room does not
//!   permit
//! * **Non-blocking fan-out** - Broadcasts enqueue per recipient and never
//!   wait; a slow consumer loses frames, not the room
//!
//! ## Architecture Overview
//!
//! ### Core Components
//!
//! * **Connection Gate** - HMAC credential verification at handshake time
//! * **Room Registry** - Presence records per room, keyed by connection
//! * **Session Router** - Client event dispatch and room membership rules
//! * **Broadcast Dispatcher** - Room-scoped, user-scoped, and global fan-out
//!
//! ### Message Flow
//!
//! 1. Client connects with a bearer token; the gate verifies it during the
//!    handshake
//! 2. Client sends `{event, data}` JSON frames over the socket
//! 3. The session router validates each event against the session's room
//! 4. The room registry records the change; the dispatcher fans it out
//! 5. Peers receive the event through their own bounded outbound queues
//!
//! ## Configuration
//!
//! The server is configured through the [`ServerConfig`] struct:
//!
//! * **Network settings** - Bind address and connection limits
//! * **Auth settings** - The shared secret the connection gate verifies with
//! * **Security settings** - Inbound frame size cap and outbound queue depth
//!
//! ## Error Handling
//!
//! The server uses structured error types ([`ServerError`]) to categorize
//! failures:
//!
//! * **Network errors** - Binding, accept, and protocol issues
//! * **Auth errors** - Credential verification failures at the handshake
//! * **Internal errors** - Component wiring and serialization problems
//!
//! ## Thread Safety
//!
//! All server components are designed for safe concurrent access:
//!
//! * Room state lives behind a single `RwLock` so transitions are atomic
//! * Connection tracking uses `Arc<RwLock<HashMap>>` plus a lock-free sender
//!   map for the send hot path
//! * Everything is shared through explicit `Arc`s; no globals, so several
//!   servers can coexist in one process

// Re-export core types and functions for easy access
pub use auth::{AuthClaims, AuthError, ConnectionGate, DEFAULT_TOKEN_TTL_SECS};
pub use config::{AuthConfig, SecurityConfig, ServerConfig};
pub use directory::{DirectoryError, InMemoryDirectory, PlayerDirectory, PlayerProfile};
pub use error::ServerError;
pub use health::{HealthCheckResult, HealthMonitor, HealthStatus};
pub use rooms::{RegistryStats, RoomRegistry};
pub use server::RealtimeServer;
pub use shutdown::ShutdownState;
pub use utils::{create_server, create_server_with_config};

// Public module declarations
pub mod auth;
pub mod config;
pub mod directory;
pub mod error;
pub mod health;
pub mod rooms;
pub mod server;
pub mod shutdown;
pub mod utils;

// Internal modules (not part of public API)
mod broadcast;
mod connection;
mod entitlements;
mod session;

// Authentication integration tests
#[cfg(test)]
mod auth_integration_tests;
