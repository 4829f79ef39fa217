//! Error types and handling for the realtime server.
//!
//! This module defines the error types that can occur during server operations,
//! providing clear categorization of different failure modes.

/// Enumeration of possible server errors.
///
/// Categorizes errors into network, authentication, and internal failures
/// to help with debugging and error handling.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Network-related errors such as binding failures or connection issues
    #[error("Network error: {0}")]
    Network(String),

    /// Credential verification failures during the connection handshake
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Internal server errors such as registry or dispatch failures
    #[error("Internal error: {0}")]
    Internal(String),
}
