//! Server module containing the core server implementation and connection
//! handling.
//!
//! This module is organized into:
//! - `core`: Main server struct, component wiring, and the accept loop
//! - `handlers`: Per-connection handshake, reader/writer tasks, and teardown

pub mod core;
pub(crate) mod handlers;

pub use core::RealtimeServer;
