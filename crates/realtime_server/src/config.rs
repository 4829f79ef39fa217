//! Server configuration types and defaults.
//!
//! This module contains the server configuration structure and default values
//! used to initialize and customize the realtime server behavior.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Configuration structure for the realtime server.
///
/// Contains all necessary parameters to configure server behavior including
/// network settings, credential verification, and connection limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The socket address to bind the server to
    pub bind_address: SocketAddr,

    /// Maximum number of concurrent connections allowed
    pub max_connections: usize,

    /// Connection timeout in seconds
    pub connection_timeout: u64,

    /// Credential verification settings for the connection gate
    pub auth: AuthConfig,

    /// Security configuration settings
    pub security: SecurityConfig,
}

/// Credential verification settings for the connection gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared secret used to sign and verify bearer tokens
    pub token_secret: String,
}

/// Security configuration for input validation and backpressure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Maximum inbound message size in bytes
    pub max_message_size: usize,

    /// Outbound queue depth per connection; deliveries beyond it are dropped
    pub outbound_queue_depth: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".parse().expect("Invalid default bind address"),
            max_connections: 1000,
            connection_timeout: 60,
            auth: AuthConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            // Development fallback; deployments override via config or
            // the STUDYHALL_TOKEN_SECRET environment variable.
            token_secret: "studyhall-dev-secret".to_string(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_message_size: 64 * 1024, // 64KB
            outbound_queue_depth: 256,
        }
    }
}
