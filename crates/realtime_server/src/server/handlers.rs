//! Connection handling logic for WebSocket clients.
//!
//! This module contains the core connection handling logic that manages
//! the lifecycle of individual client connections, including the gated
//! WebSocket handshake, message processing, and cleanup.

use crate::{
    auth::{AuthError, ConnectionGate},
    config::SecurityConfig,
    connection::ConnectionManager,
    error::ServerError,
    session::{Session, SessionRouter},
};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    accept_hdr_async,
    tungstenite::handshake::server::{ErrorResponse, Request, Response},
    tungstenite::http::StatusCode,
    tungstenite::Message,
};
use tracing::{debug, error, warn};

/// Handles a single client connection from handshake to cleanup.
///
/// This function manages the complete lifecycle of a client connection:
/// credential verification during the WebSocket handshake, session setup,
/// message routing, and room cleanup when the connection ends.
///
/// # Connection Flow
///
/// 1. Verify the bearer credential inside the handshake; refuse with 401
///    before upgrading if it fails
/// 2. Register the connection and obtain its outbound queue
/// 3. Route incoming frames through the session router
/// 4. Drain the outbound queue into the socket from a dedicated task
/// 5. On close or error, reconcile room membership and unregister
///
/// # Message Handling
///
/// Two concurrent tasks run until either finishes:
///
/// * **Incoming Task**: parses client frames and routes them; owns the
///   connection's [`Session`], so its events are processed in order
/// * **Outgoing Task**: owns the socket's write half and drains the
///   connection's outbound queue into it
///
/// # Returns
///
/// `Ok(())` if the connection was handled and cleaned up, or a
/// `ServerError` describing the handshake or authentication failure.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    gate: Arc<ConnectionGate>,
    router: Arc<SessionRouter>,
    connections: Arc<ConnectionManager>,
    security: SecurityConfig,
) -> Result<(), ServerError> {
    // The gate runs inside the handshake callback; the verdict is written
    // out here so the failure reason survives the callback.
    let mut verified: Option<Result<studyhall_protocol::UserIdentity, AuthError>> = None;

    let ws_stream = {
        let verified = &mut verified;
        accept_hdr_async(stream, move |request: &Request, response: Response| {
            match gate.authenticate(request) {
                Ok(identity) => {
                    *verified = Some(Ok(identity));
                    Ok(response)
                }
                Err(e) => {
                    let mut rejection = ErrorResponse::new(Some(format!("{e}")));
                    *rejection.status_mut() = StatusCode::UNAUTHORIZED;
                    *verified = Some(Err(e));
                    Err(rejection)
                }
            }
        })
        .await
    };

    let ws_stream = match ws_stream {
        Ok(ws_stream) => ws_stream,
        Err(e) => {
            if let Some(Err(auth_err)) = verified {
                warn!("🚫 Refused connection from {}: {}", addr, auth_err);
                return Err(ServerError::Auth(auth_err.to_string()));
            }
            return Err(ServerError::Network(format!(
                "WebSocket handshake failed: {e}"
            )));
        }
    };

    let identity = match verified {
        Some(Ok(identity)) => identity,
        _ => {
            return Err(ServerError::Internal(
                "Handshake completed without authentication".to_string(),
            ))
        }
    };

    let (connection_id, mut outbound_receiver) = connections.register(identity.clone(), addr).await;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let mut session = Session::new(connection_id, identity);

    // Outgoing task - owns the write half and drains the outbound queue
    let outgoing_task = async move {
        while let Some(message) = outbound_receiver.recv().await {
            if let Err(e) = ws_sender.send(message).await {
                debug!("Failed to send to connection {}: {}", connection_id, e);
                break;
            }
        }
    };

    // Incoming task - parses frames and routes them through the session
    let incoming_task = {
        let router = router.clone();
        let connections = connections.clone();
        let session = &mut session;
        let max_message_size = security.max_message_size;

        async move {
            while let Some(msg) = ws_receiver.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        if text.len() > max_message_size {
                            warn!(
                                "⚠️ Dropping oversized frame ({} bytes) from connection {}",
                                text.len(),
                                connection_id
                            );
                            continue;
                        }
                        router.handle_raw(session, text.as_str()).await;
                    }
                    Ok(Message::Close(_)) => {
                        debug!("🔌 Client {} requested close", connection_id);
                        break;
                    }
                    Ok(Message::Ping(data)) => {
                        // Pong rides the outbound queue like any other frame
                        connections.try_send(connection_id, Message::Pong(data));
                    }
                    Err(e) => {
                        error!("WebSocket error for connection {}: {}", connection_id, e);
                        break;
                    }
                    _ => {}
                }
            }
        }
    };

    // Run both tasks concurrently until one completes
    tokio::select! {
        _ = incoming_task => {},
        _ = outgoing_task => {},
    }

    router.handle_disconnect(&mut session).await;
    connections.unregister(connection_id).await;
    Ok(())
}
