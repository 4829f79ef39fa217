//! Main application logic and lifecycle management.
//!
//! This module contains the core `Application` struct that orchestrates
//! server startup, health monitoring, and graceful phased shutdown.

use crate::{
    cli::CliArgs,
    config::AppConfig,
    logging::display_banner,
    signals::{setup_signal_handlers, setup_signal_handlers_silent},
};
use anyhow::Context;
use realtime_server::{HealthMonitor, RealtimeServer, ShutdownState};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Main application struct with health monitoring capabilities.
///
/// The `Application` struct manages the complete lifecycle of the Studyhall
/// server, including configuration loading, server initialization, health
/// monitoring, and graceful shutdown handling.
///
/// # Architecture
///
/// * **Configuration Management**: Loads and validates configuration from files and CLI
/// * **Server Orchestration**: Initializes and manages the realtime server instance
/// * **Health Monitoring**: Logs a health snapshot every 60 seconds
/// * **Graceful Shutdown**: Handles termination signals and phased cleanup
pub struct Application {
    /// Loaded application configuration
    config: AppConfig,
    /// Realtime server instance, shared with the serving task
    server: Arc<RealtimeServer>,
}

impl Application {
    /// Creates a new application instance.
    ///
    /// Loads configuration, applies CLI overrides, validates settings, and
    /// initializes the realtime server.
    ///
    /// # Process
    ///
    /// 1. Load configuration from file (creating default if missing)
    /// 2. Apply command-line argument overrides
    /// 3. Validate merged configuration
    /// 4. Display startup banner
    /// 5. Initialize the realtime server with configuration
    pub async fn new(args: CliArgs) -> anyhow::Result<Self> {
        info!("🔧 Loading configuration from: {}", args.config_path.display());
        let mut config = AppConfig::load_from_file(&args.config_path).await?;

        // Apply CLI overrides
        if let Some(bind_address) = args.bind_address {
            config.server.bind_address = bind_address;
        }

        if let Some(log_level) = args.log_level {
            config.logging.level = log_level;
        }

        if args.json_logs {
            config.logging.json_format = true;
        }

        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Configuration validation failed: {e}"))?;
        info!("✅ Configuration loaded and validated successfully");

        display_banner();

        let server_config = config
            .to_server_config()
            .context("Failed to build server configuration")?;
        let server = Arc::new(RealtimeServer::new(server_config));

        info!("🚀 Studyhall Realtime Server v{}", env!("CARGO_PKG_VERSION"));
        info!("🏗️ Architecture: Connection Gate + Room Registry + Session Router + Broadcast Dispatcher");
        info!("📂 Config: {}", args.config_path.display());

        Ok(Self { config, server })
    }

    /// Runs the application with health monitoring and phased shutdown.
    ///
    /// Starts the server, sets up monitoring tasks, waits for shutdown
    /// signals, and performs graceful cleanup with final statistics.
    ///
    /// # Monitoring Features
    ///
    /// * **Configuration Summary**: Displays key settings at startup
    /// * **Periodic Health Reports**: Snapshot every 60 seconds
    /// * **Final Statistics**: Summary report during shutdown
    pub async fn run(self) -> anyhow::Result<()> {
        info!("🌟 Starting Studyhall Realtime Server Application");

        self.log_configuration_summary();

        let config = self.config.clone();
        let server = self.server;

        // Shared shutdown state: the accept loop checks it before each accept
        let shutdown_state = ShutdownState::new();

        // Start server in background
        let server_handle = {
            let server = server.clone();
            let shutdown_state = shutdown_state.clone();
            tokio::spawn(async move {
                match server.start_with_shutdown_state(shutdown_state).await {
                    Ok(()) => {
                        info!("✅ Server completed successfully");
                    }
                    Err(e) => {
                        error!("❌ Server error: {:?}", e);
                        std::process::exit(1);
                    }
                }
            })
        };

        // Start monitoring task for periodic health snapshots
        let monitoring_handle = {
            let server = server.clone();
            let monitor = HealthMonitor::new();

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(60));
                // The first tick fires immediately; skip it so the startup
                // logs are not interleaved with a health report.
                interval.tick().await;

                loop {
                    interval.tick().await;

                    let health = monitor.perform_health_check(&server).await;
                    info!(
                        "📊 Health: {:?} | {} connections | lobby {} / library {} | {}MB | up {}s",
                        health.status,
                        health.active_connections,
                        health.rooms.lobby,
                        health.rooms.library,
                        health.memory_usage_mb,
                        health.uptime_seconds
                    );

                    for warning in &health.warnings {
                        warn!("⚠️ {}", warning);
                    }
                    for err in &health.errors {
                        error!("❌ {}", err);
                    }
                }
            })
        };

        info!("✅ Studyhall Server is now running!");
        info!(
            "🎮 Ready to accept connections on {}",
            config.server.bind_address
        );
        info!("🔍 Health monitoring active - stats every 60 seconds");
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        // Wait for shutdown signal
        let signal_shutdown_state = setup_signal_handlers().await?;

        // merciless shutdown
        tokio::spawn(async move {
            if let Err(e) = setup_signal_handlers_silent().await {
                error!("Failed to set up merciless shutdown signal handler: {e}");
                return;
            }

            warn!("Shutdown handler received again! I'll make this quick.");
            std::process::exit(1);
        });

        // Transfer shutdown state to the server's shutdown state
        if signal_shutdown_state.is_shutdown_initiated() {
            shutdown_state.initiate_shutdown();
        }

        info!("🛑 Shutdown signal received, beginning graceful shutdown...");

        // Phase 1: Stop accepting new connections
        info!("📡 Phase 1: Stopping new connections...");
        monitoring_handle.abort();

        // Phase 2: Give live connections a moment to drain
        info!("⏳ Phase 2: Draining live connections...");

        let mut wait_cycles = 0;
        const MAX_WAIT_CYCLES: u32 = 30; // Wait up to 3 seconds (30 * 100ms)

        while wait_cycles < MAX_WAIT_CYCLES {
            if server.connection_count().await == 0 {
                break;
            }

            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
            wait_cycles += 1;
        }

        if wait_cycles >= MAX_WAIT_CYCLES {
            info!("⏰ Timeout reached, proceeding with shutdown (some connections still open)");
        } else {
            info!("✅ All connections drained");
        }

        shutdown_state.complete_shutdown();

        // Phase 3: Final cleanup - stop the server task
        info!("🧹 Phase 3: Final cleanup - stopping server task...");
        server.shutdown().await.ok();

        if let Err(e) =
            tokio::time::timeout(tokio::time::Duration::from_secs(8), server_handle).await
        {
            warn!(
                "⏰ Server task did not complete within timeout, proceeding with cleanup: {:?}",
                e
            );
        } else {
            info!("✅ Server task completed gracefully");
        }

        // Display final statistics
        log_final_statistics(&server).await;

        info!("✅ Studyhall Realtime Server shutdown complete");
        info!("👋 Thank you for using Studyhall!");

        Ok(())
    }

    /// Logs the configuration summary at startup.
    fn log_configuration_summary(&self) {
        info!("📋 Configuration Summary:");
        info!("  🌐 Bind address: {}", self.config.server.bind_address);
        info!(
            "  👥 Max connections: {}",
            self.config.server.max_connections
        );
        info!(
            "  ⏱️ Connection timeout: {}s",
            self.config.server.connection_timeout
        );
        info!(
            "  📨 Max message size: {} bytes",
            self.config.security.max_message_size
        );
        info!(
            "  📤 Outbound queue depth: {}",
            self.config.security.outbound_queue_depth
        );
    }
}

/// Logs final statistics during shutdown.
async fn log_final_statistics(server: &RealtimeServer) {
    let stats = server.registry_stats().await;
    info!("📊 Final Statistics:");
    info!("  - Open connections: {}", server.connection_count().await);
    info!("  - Lobby occupancy: {}", stats.lobby);
    info!("  - Library occupancy: {}", stats.library);
}
