//! Connection registry and outbound delivery queues.

use crate::connection::client::ClientConnection;
use dashmap::DashMap;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use studyhall_protocol::{ConnectionId, UserId, UserIdentity};
use tokio::sync::{mpsc, RwLock};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Tracks live connections and owns the sending half of each connection's
/// outbound queue.
///
/// Each connection gets a bounded channel at registration; the socket's
/// writer task drains the receiving half. [`ConnectionManager::try_send`]
/// never blocks: a full or closed queue is a delivery failure for that one
/// recipient and nothing else.
#[derive(Debug)]
pub struct ConnectionManager {
    /// Connected clients keyed by connection id
    connections: Arc<RwLock<HashMap<ConnectionId, ClientConnection>>>,
    /// Outbound queue handles, kept outside the lock for send hot paths
    senders: DashMap<ConnectionId, mpsc::Sender<Message>>,
    /// Next connection id to allocate
    next_id: AtomicU64,
    /// Capacity of each connection's outbound queue
    queue_depth: usize,
}

impl ConnectionManager {
    /// Creates a manager whose per-connection queues hold `queue_depth`
    /// frames.
    pub fn new(queue_depth: usize) -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            senders: DashMap::new(),
            next_id: AtomicU64::new(1),
            queue_depth,
        }
    }

    /// Registers an authenticated connection.
    ///
    /// Allocates its id, creates its outbound queue, and returns the
    /// receiving half for the socket's writer task to drain.
    pub async fn register(
        &self,
        identity: UserIdentity,
        remote_addr: SocketAddr,
    ) -> (ConnectionId, mpsc::Receiver<Message>) {
        let connection_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(self.queue_depth);

        self.senders.insert(connection_id, sender);
        self.connections
            .write()
            .await
            .insert(connection_id, ClientConnection::new(identity, remote_addr));

        info!("🔗 Connection {} from {}", connection_id, remote_addr);
        (connection_id, receiver)
    }

    /// Removes a connection and drops its outbound queue.
    ///
    /// Safe to call more than once for the same id.
    pub async fn unregister(&self, connection_id: ConnectionId) {
        self.senders.remove(&connection_id);
        if let Some(connection) = self.connections.write().await.remove(&connection_id) {
            info!(
                "❌ Connection {} from {} disconnected",
                connection_id, connection.remote_addr
            );
        }
    }

    /// Queues a frame for one connection without waiting.
    ///
    /// Returns `false` when the connection is gone or its queue is full; the
    /// frame is dropped for that recipient only.
    pub fn try_send(&self, connection_id: ConnectionId, message: Message) -> bool {
        match self.senders.get(&connection_id) {
            Some(sender) => match sender.try_send(message) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(
                        "⚠️ Outbound queue full for connection {}, dropping frame",
                        connection_id
                    );
                    false
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!(
                        "📭 Outbound queue closed for connection {}, dropping frame",
                        connection_id
                    );
                    false
                }
            },
            None => {
                debug!("📭 No such connection {}, dropping frame", connection_id);
                false
            }
        }
    }

    /// Returns the identity bound to a connection, if it is still live.
    pub async fn identity(&self, connection_id: ConnectionId) -> Option<UserIdentity> {
        self.connections
            .read()
            .await
            .get(&connection_id)
            .map(|connection| connection.identity.clone())
    }

    /// Returns every live connection belonging to `user_id`.
    ///
    /// A user with several browser tabs open holds several connections.
    pub async fn connections_for_user(&self, user_id: &UserId) -> Vec<ConnectionId> {
        self.connections
            .read()
            .await
            .iter()
            .filter(|(_, connection)| &connection.identity.user_id == user_id)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Returns a snapshot of every live connection id.
    pub async fn connection_ids(&self) -> Vec<ConnectionId> {
        self.connections.read().await.keys().copied().collect()
    }

    /// Returns the number of live connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}
