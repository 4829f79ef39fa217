//! Per-connection bookkeeping record.

use std::net::SocketAddr;
use std::time::SystemTime;
use studyhall_protocol::UserIdentity;

/// What the server remembers about one live connection.
///
/// The identity is fixed at handshake time by the connection gate and never
/// changes for the socket's lifetime.
#[derive(Debug, Clone)]
pub struct ClientConnection {
    /// Identity the gate verified during the handshake
    pub identity: UserIdentity,

    /// Peer address the connection arrived from
    pub remote_addr: SocketAddr,

    /// When the connection completed its handshake
    pub connected_at: SystemTime,
}

impl ClientConnection {
    /// Records a freshly authenticated connection.
    pub fn new(identity: UserIdentity, remote_addr: SocketAddr) -> Self {
        Self {
            identity,
            remote_addr,
            connected_at: SystemTime::now(),
        }
    }
}
