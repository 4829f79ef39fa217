//! Integration tests for the gated WebSocket handshake with a live server.

#[cfg(test)]
mod tests {
    use crate::*;
    use futures_util::{SinkExt, StreamExt};
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;
    use studyhall_protocol::{ServerEvent, UserIdentity};
    use tokio_tungstenite::tungstenite::http::StatusCode;
    use tokio_tungstenite::{connect_async, tungstenite::Error as WsError, tungstenite::Message};

    /// Starts a server on an ephemeral port and waits for it to bind.
    async fn start_server(mut config: ServerConfig) -> (Arc<RealtimeServer>, SocketAddr) {
        config.bind_address = "127.0.0.1:0".parse().expect("Failed to parse bind address");
        let server = Arc::new(RealtimeServer::new(config));

        let server_task = server.clone();
        tokio::spawn(async move {
            server_task
                .start()
                .await
                .expect("Server failed while running");
        });

        for _ in 0..100 {
            if let Some(addr) = server.local_addr() {
                return (server, addr);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Server never bound its listener");
    }

    /// Reads frames until the next text frame and parses it as a server event.
    async fn next_event<S>(ws: &mut S) -> ServerEvent
    where
        S: StreamExt<Item = Result<Message, WsError>> + Unpin,
    {
        loop {
            let frame = tokio::time::timeout(Duration::from_secs(2), ws.next())
                .await
                .expect("Timed out waiting for event")
                .expect("Connection closed while waiting for event")
                .expect("WebSocket error while waiting for event");
            if frame.is_text() {
                return serde_json::from_str(frame.to_text().expect("Frame was not text"))
                    .expect("Failed to parse server event");
            }
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_valid_token_completes_handshake_and_joins() {
        let (server, addr) = start_server(ServerConfig::default()).await;
        let token = server
            .gate()
            .issue_token(&UserIdentity::new("u-1", "ada"), 60);

        let (mut ws, _response) = connect_async(format!("ws://{}/?token={}", addr, token))
            .await
            .expect("Failed to connect with a valid token");

        ws.send(Message::text(r#"{"event":"join-lobby"}"#.to_string()))
            .await
            .expect("Failed to send join");

        match next_event(&mut ws).await {
            ServerEvent::LobbyState { players } => {
                assert_eq!(players.len(), 1);
                assert_eq!(players[0].username, "ada");
            }
            other => panic!("Expected lobby snapshot, got {:?}", other),
        }
        assert_eq!(server.connection_count().await, 1);
        assert_eq!(server.registry_stats().await.lobby, 1);

        // Pings are answered through the same outbound queue as events
        ws.send(Message::Ping(vec![1, 2, 3].into()))
            .await
            .expect("Failed to send ping");
        let frame = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("Timed out waiting for pong")
            .expect("Connection closed while waiting for pong")
            .expect("WebSocket error while waiting for pong");
        match frame {
            Message::Pong(data) => assert_eq!(data.as_ref(), &[1, 2, 3]),
            other => panic!("Expected pong, got {:?}", other),
        }

        server.shutdown().await.expect("Failed to shut down server");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_missing_token_is_refused_before_upgrade() {
        let (server, addr) = start_server(ServerConfig::default()).await;

        match connect_async(format!("ws://{}/", addr)).await {
            Err(WsError::Http(response)) => {
                assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            }
            Ok(_) => panic!("Handshake without a token should be refused"),
            Err(other) => panic!("Expected HTTP rejection, got {:?}", other),
        }
        assert_eq!(server.connection_count().await, 0);

        server.shutdown().await.expect("Failed to shut down server");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_foreign_token_is_refused() {
        let (server, addr) = start_server(ServerConfig::default()).await;

        // Signed with a different secret than the server verifies with
        let forged = ConnectionGate::new("some-other-secret")
            .issue_token(&UserIdentity::new("u-1", "mallory"), 60);

        match connect_async(format!("ws://{}/?token={}", addr, forged)).await {
            Err(WsError::Http(response)) => {
                assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            }
            Ok(_) => panic!("Handshake with a foreign token should be refused"),
            Err(other) => panic!("Expected HTTP rejection, got {:?}", other),
        }

        server.shutdown().await.expect("Failed to shut down server");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_expired_token_is_refused() {
        let (server, addr) = start_server(ServerConfig::default()).await;
        let expired = server
            .gate()
            .issue_token(&UserIdentity::new("u-1", "ada"), 0);

        match connect_async(format!("ws://{}/?token={}", addr, expired)).await {
            Err(WsError::Http(response)) => {
                assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            }
            Ok(_) => panic!("Handshake with an expired token should be refused"),
            Err(other) => panic!("Expected HTTP rejection, got {:?}", other),
        }

        server.shutdown().await.expect("Failed to shut down server");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_socket_close_broadcasts_departure_with_identity() {
        let (server, addr) = start_server(ServerConfig::default()).await;
        let gate = server.gate();
        let token_a = gate.issue_token(&UserIdentity::new("u-1", "ada"), 60);
        let token_b = gate.issue_token(&UserIdentity::new("u-2", "grace"), 60);

        let (mut ws_a, _) = connect_async(format!("ws://{}/?token={}", addr, token_a))
            .await
            .expect("Failed to connect first client");
        ws_a.send(Message::text(r#"{"event":"join-lobby"}"#.to_string()))
            .await
            .expect("Failed to send join");
        let _snapshot = next_event(&mut ws_a).await;

        let (mut ws_b, _) = connect_async(format!("ws://{}/?token={}", addr, token_b))
            .await
            .expect("Failed to connect second client");
        ws_b.send(Message::text(r#"{"event":"join-lobby"}"#.to_string()))
            .await
            .expect("Failed to send join");
        let _snapshot = next_event(&mut ws_b).await;

        match next_event(&mut ws_a).await {
            ServerEvent::PlayerJoined(presence) => assert_eq!(presence.username, "grace"),
            other => panic!("Expected player-joined, got {:?}", other),
        }

        ws_a.close(None).await.expect("Failed to close first client");

        match next_event(&mut ws_b).await {
            ServerEvent::PlayerLeft {
                user_id, username, ..
            } => {
                assert_eq!(user_id, Some(studyhall_protocol::UserId::new("u-1")));
                assert_eq!(username, Some("ada".to_string()));
            }
            other => panic!("Expected player-left, got {:?}", other),
        }

        server.shutdown().await.expect("Failed to shut down server");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_connection_limit_refuses_extra_sockets() {
        let config = ServerConfig {
            max_connections: 1,
            ..Default::default()
        };
        let (server, addr) = start_server(config).await;
        let gate = server.gate();

        let token_a = gate.issue_token(&UserIdentity::new("u-1", "ada"), 60);
        let (_ws_a, _) = connect_async(format!("ws://{}/?token={}", addr, token_a))
            .await
            .expect("Failed to connect first client");

        // Give the server a moment to register the first connection
        for _ in 0..100 {
            if server.connection_count().await == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(server.connection_count().await, 1);

        let token_b = gate.issue_token(&UserIdentity::new("u-2", "grace"), 60);
        let refused = connect_async(format!("ws://{}/?token={}", addr, token_b)).await;
        assert!(
            refused.is_err(),
            "Connections beyond the limit should be refused"
        );

        server.shutdown().await.expect("Failed to shut down server");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_shutdown_stops_accepting_connections() {
        let (server, addr) = start_server(ServerConfig::default()).await;

        server.shutdown().await.expect("Failed to signal shutdown");
        tokio::time::sleep(Duration::from_millis(100)).await;

        let token = server
            .gate()
            .issue_token(&UserIdentity::new("u-1", "ada"), 60);
        let refused = connect_async(format!("ws://{}/?token={}", addr, token)).await;
        assert!(
            refused.is_err(),
            "Connections should be refused after shutdown"
        );
    }
}
