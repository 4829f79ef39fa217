//! Core realtime server implementation.
//!
//! This module contains the main `RealtimeServer` struct and its
//! implementation, wiring the connection gate, room registry, broadcast
//! dispatcher, and session router together around the accept loop.

use crate::{
    auth::ConnectionGate,
    broadcast::BroadcastDispatcher,
    config::ServerConfig,
    connection::ConnectionManager,
    directory::{InMemoryDirectory, PlayerDirectory},
    error::ServerError,
    rooms::{RegistryStats, RoomRegistry},
    server::handlers::handle_connection,
    session::SessionRouter,
    shutdown::ShutdownState,
};
use once_cell::sync::OnceCell;
use std::net::SocketAddr;
use std::sync::Arc;
use studyhall_protocol::{ServerEvent, UserId};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// The core realtime server.
///
/// `RealtimeServer` owns the shared state every connection task works
/// against: the room registry, the connection manager, and the session
/// router. Construction wires the components; [`start`](Self::start) binds
/// the listener and runs the accept loop until shutdown.
///
/// # Architecture
///
/// * **Connection Gate**: Verifies bearer credentials during the handshake
/// * **Room Registry**: Authoritative presence records per room
/// * **Session Router**: Per-connection state machine and event dispatch
/// * **Broadcast Dispatcher**: Room-scoped and global fan-out
///
/// All of it is shared through explicit `Arc`s handed to each connection
/// task; there is no global state, so several servers can coexist in one
/// process (tests rely on this).
pub struct RealtimeServer {
    /// Server configuration settings
    config: ServerConfig,

    /// Authoritative room membership and presence records
    registry: Arc<RoomRegistry>,

    /// Live connection tracking and outbound queues
    connections: Arc<ConnectionManager>,

    /// Event fan-out over the registry and connection manager
    dispatcher: BroadcastDispatcher,

    /// Client event routing, shared by all connection tasks
    router: Arc<SessionRouter>,

    /// Handshake credential verification
    gate: Arc<ConnectionGate>,

    /// Channel for coordinating server shutdown
    shutdown_sender: broadcast::Sender<()>,

    /// Address the listener actually bound, set once at startup
    bound_addr: OnceCell<SocketAddr>,
}

impl RealtimeServer {
    /// Creates a new realtime server with the specified configuration.
    ///
    /// Uses an in-memory player directory; deployments with an account
    /// store use [`with_directory`](Self::with_directory) instead.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_directory(config, Arc::new(InMemoryDirectory::new()))
    }

    /// Creates a server backed by the given player directory.
    pub fn with_directory(config: ServerConfig, directory: Arc<dyn PlayerDirectory>) -> Self {
        let registry = Arc::new(RoomRegistry::new());
        let connections = Arc::new(ConnectionManager::new(config.security.outbound_queue_depth));
        let dispatcher = BroadcastDispatcher::new(registry.clone(), connections.clone());
        let router = Arc::new(SessionRouter::new(
            registry.clone(),
            dispatcher.clone(),
            directory,
        ));
        let gate = Arc::new(ConnectionGate::new(config.auth.token_secret.clone()));
        let (shutdown_sender, _) = broadcast::channel(1);

        Self {
            config,
            registry,
            connections,
            dispatcher,
            router,
            gate,
            shutdown_sender,
            bound_addr: OnceCell::new(),
        }
    }

    /// Starts the server with an externally managed shutdown state.
    ///
    /// The accept loop checks the state before each accept, so initiating
    /// shutdown stops new connections without tearing down existing ones.
    pub async fn start_with_shutdown_state(
        &self,
        shutdown_state: ShutdownState,
    ) -> Result<(), ServerError> {
        self.start_internal(Some(shutdown_state)).await
    }

    /// Starts the server and begins accepting connections.
    ///
    /// Binds the configured address and runs the accept loop until
    /// [`shutdown`](Self::shutdown) is called or the listener fails.
    /// Each accepted connection gets its own task; a failed handshake or a
    /// misbehaving client never affects the loop.
    pub async fn start(&self) -> Result<(), ServerError> {
        self.start_internal(None).await
    }

    /// Internal method for starting the server with optional shutdown state.
    async fn start_internal(&self, shutdown_state: Option<ShutdownState>) -> Result<(), ServerError> {
        info!("🚀 Starting realtime server on {}", self.config.bind_address);

        let listener = tokio::net::TcpListener::bind(self.config.bind_address)
            .await
            .map_err(|e| ServerError::Network(format!("TcpListener creation failed: {e}")))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Network(format!("Failed to read bound address: {e}")))?;
        let _ = self.bound_addr.set(local_addr);
        info!("✅ Listening on {}", local_addr);

        let mut shutdown_receiver = self.shutdown_sender.subscribe();

        let accept_loop = {
            let gate = self.gate.clone();
            let router = self.router.clone();
            let connections = self.connections.clone();
            let security = self.config.security.clone();
            let max_connections = self.config.max_connections;

            async move {
                loop {
                    // Check if shutdown has been initiated
                    if let Some(ref shutdown_state) = shutdown_state {
                        if shutdown_state.is_shutdown_initiated() {
                            info!("🛑 Accept loop stopping - shutdown initiated");
                            break;
                        }
                    }

                    match listener.accept().await {
                        Ok((stream, addr)) => {
                            if connections.connection_count().await >= max_connections {
                                warn!(
                                    "🚦 Connection limit ({}) reached, refusing {}",
                                    max_connections, addr
                                );
                                drop(stream);
                                continue;
                            }

                            let gate = gate.clone();
                            let router = router.clone();
                            let connections = connections.clone();
                            let security = security.clone();

                            // Spawn individual connection handler
                            tokio::spawn(async move {
                                if let Err(e) =
                                    handle_connection(stream, addr, gate, router, connections, security)
                                        .await
                                {
                                    error!("Connection error: {:?}", e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("Failed to accept connection: {}", e);
                            break;
                        }
                    }
                }
            }
        };

        // Run until the accept loop ends or an internal shutdown signal
        tokio::select! {
            _ = accept_loop => {}
            _ = shutdown_receiver.recv() => {
                info!("Internal shutdown signal received");
            }
        }

        info!("🧹 Performing server cleanup...");
        info!("✅ Server cleanup completed");

        info!("Server stopped");
        Ok(())
    }

    /// Signals the accept loop to stop.
    ///
    /// Existing connections keep running until their sockets close; only
    /// new accepts stop.
    pub async fn shutdown(&self) -> Result<(), ServerError> {
        info!("🛑 Shutting down server...");
        let _ = self.shutdown_sender.send(());
        Ok(())
    }

    /// Returns the address the listener bound, once the server has started.
    ///
    /// Useful when binding port 0 and needing the assigned port.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.bound_addr.get().copied()
    }

    /// Announces a level change to every live connection.
    ///
    /// Called by the hosting application when its progression layer levels
    /// a player up. Returns how many connections the announcement was
    /// queued for.
    pub async fn notify_level_update(&self, user_id: UserId, level: u32) -> usize {
        info!("🎉 User {} reached level {}", user_id, level);
        self.dispatcher
            .to_all(&ServerEvent::PlayerLevelUpdated { user_id, level })
            .await
    }

    /// Returns room occupancy counters.
    pub async fn registry_stats(&self) -> RegistryStats {
        self.registry.stats().await
    }

    /// Returns the number of live connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.connection_count().await
    }

    /// Returns the connection gate, for issuing tokens.
    pub fn gate(&self) -> Arc<ConnectionGate> {
        self.gate.clone()
    }

    /// Returns the room registry shared with connection tasks.
    pub fn get_registry(&self) -> Arc<RoomRegistry> {
        self.registry.clone()
    }

    /// Returns the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
