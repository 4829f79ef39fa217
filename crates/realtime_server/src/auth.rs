//! Connection gate: bearer-credential verification for the WebSocket handshake.
//!
//! Tokens are HMAC-SHA256 signed, `base64url(claims) + "." + base64url(mac)`
//! with no padding. Claims carry the user's identity plus issue and expiry
//! times in Unix seconds. Verification runs synchronously inside the
//! handshake callback, before the upgrade response is written, so a
//! connection that fails here never reaches room logic.
//!
//! Browsers cannot attach headers to a WebSocket upgrade, so the token is
//! accepted from the `token` query parameter as well as the
//! `Authorization: Bearer` header.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use studyhall_protocol::{current_timestamp, UserId, UserIdentity};
use tokio_tungstenite::tungstenite::handshake::server::Request;

type HmacSha256 = Hmac<Sha256>;

/// Default credential lifetime in seconds (24 hours).
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

/// Claims carried inside a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthClaims {
    /// Stable account identity
    #[serde(rename = "userId")]
    pub user_id: String,

    /// Display name bound to the connection for its lifetime
    pub username: String,

    /// Issue time, Unix seconds
    pub iat: u64,

    /// Expiry time, Unix seconds
    pub exp: u64,
}

/// Errors the gate can produce while verifying a credential.
///
/// Every variant refuses the upgrade; the distinction exists for logs and
/// for tests that pin down which check fired.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No token in the Authorization header or the query string
    #[error("missing bearer token")]
    Missing,

    /// Token structure or encoding is not parseable
    #[error("malformed bearer token")]
    Malformed,

    /// Signature does not match the shared secret
    #[error("invalid token signature")]
    BadSignature,

    /// Claims are valid but the expiry has passed
    #[error("token expired")]
    Expired,
}

/// Verifies bearer credentials presented during the WebSocket handshake.
///
/// The gate both verifies tokens (always) and mints them, the latter as a
/// convenience for the HTTP auth layer, tooling, and tests.
#[derive(Debug, Clone)]
pub struct ConnectionGate {
    secret: String,
}

impl ConnectionGate {
    /// Creates a gate that signs and verifies with `secret`.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Mints a signed token binding `identity`, valid for `ttl_secs` seconds.
    pub fn issue_token(&self, identity: &UserIdentity, ttl_secs: u64) -> String {
        let now = current_timestamp();
        let claims = AuthClaims {
            user_id: identity.user_id.to_string(),
            username: identity.username.clone(),
            iat: now,
            exp: now + ttl_secs,
        };
        let payload = URL_SAFE_NO_PAD
            .encode(serde_json::to_vec(&claims).expect("Failed to serialize token claims"));
        let mac = self.sign(payload.as_bytes());
        format!("{}.{}", payload, URL_SAFE_NO_PAD.encode(mac))
    }

    /// Verifies `token` and returns the identity it binds.
    ///
    /// The signature is checked before the claims are decoded; expiry is
    /// checked last so a tampered expiry can never pass.
    pub fn verify_token(&self, token: &str) -> Result<UserIdentity, AuthError> {
        let (payload, signature) = token.split_once('.').ok_or(AuthError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::Malformed)?;

        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|_| AuthError::BadSignature)?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::BadSignature)?;

        let claims_bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::Malformed)?;
        let claims: AuthClaims =
            serde_json::from_slice(&claims_bytes).map_err(|_| AuthError::Malformed)?;

        if claims.exp <= current_timestamp() {
            return Err(AuthError::Expired);
        }

        Ok(UserIdentity::new(
            UserId::new(claims.user_id),
            claims.username,
        ))
    }

    /// Authenticates a handshake request: extract the token, verify it, and
    /// return the identity to bind to the connection.
    pub fn authenticate(&self, request: &Request) -> Result<UserIdentity, AuthError> {
        let token = extract_token(request).ok_or(AuthError::Missing)?;
        self.verify_token(&token)
    }

    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

/// Pulls the bearer token out of a handshake request.
///
/// Checks the `Authorization: Bearer` header first, then the `token` query
/// parameter.
pub fn extract_token(request: &Request) -> Option<String> {
    if let Some(value) = request.headers().get("authorization") {
        if let Ok(value) = value.to_str() {
            if let Some(token) = value.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    request
        .uri()
        .query()?
        .split('&')
        .find_map(|pair| pair.strip_prefix("token="))
        .map(|token| token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_tungstenite::tungstenite::http;

    fn gate() -> ConnectionGate {
        ConnectionGate::new("test-secret")
    }

    fn identity() -> UserIdentity {
        UserIdentity::new("u-1", "ada")
    }

    #[test]
    fn issued_tokens_verify() {
        let gate = gate();
        let token = gate.issue_token(&identity(), 60);
        let verified = gate.verify_token(&token).expect("Failed to verify fresh token");
        assert_eq!(verified.user_id, UserId::new("u-1"));
        assert_eq!(verified.username, "ada");
    }

    #[test]
    fn tampered_payload_fails_signature_check() {
        let gate = gate();
        let token = gate.issue_token(&identity(), 60);
        let (payload, signature) = token.split_once('.').expect("Token missing separator");

        let mut claims: AuthClaims = serde_json::from_slice(
            &URL_SAFE_NO_PAD.decode(payload).expect("Failed to decode payload"),
        )
        .expect("Failed to parse claims");
        claims.username = "mallory".to_string();
        let forged_payload = URL_SAFE_NO_PAD
            .encode(serde_json::to_vec(&claims).expect("Failed to serialize forged claims"));

        let forged = format!("{forged_payload}.{signature}");
        assert_eq!(gate.verify_token(&forged), Err(AuthError::BadSignature));
    }

    #[test]
    fn wrong_secret_fails_signature_check() {
        let token = ConnectionGate::new("other-secret").issue_token(&identity(), 60);
        assert_eq!(gate().verify_token(&token), Err(AuthError::BadSignature));
    }

    #[test]
    fn expired_tokens_are_refused() {
        let gate = gate();
        let token = gate.issue_token(&identity(), 0);
        assert_eq!(gate.verify_token(&token), Err(AuthError::Expired));
    }

    #[test]
    fn garbage_tokens_are_malformed() {
        let gate = gate();
        assert_eq!(gate.verify_token("no-separator"), Err(AuthError::Malformed));
        assert_eq!(
            gate.verify_token("!!not-base64!!.!!also-not!!"),
            Err(AuthError::Malformed)
        );
    }

    #[test]
    fn token_extracted_from_query_parameter() {
        let request = http::Request::builder()
            .uri("ws://127.0.0.1:8080/?foo=bar&token=abc123")
            .body(())
            .expect("Failed to build request");
        assert_eq!(extract_token(&request), Some("abc123".to_string()));
    }

    #[test]
    fn token_extracted_from_authorization_header() {
        let request = http::Request::builder()
            .uri("ws://127.0.0.1:8080/")
            .header("authorization", "Bearer xyz789")
            .body(())
            .expect("Failed to build request");
        assert_eq!(extract_token(&request), Some("xyz789".to_string()));
    }

    #[test]
    fn missing_token_yields_none() {
        let request = http::Request::builder()
            .uri("ws://127.0.0.1:8080/")
            .body(())
            .expect("Failed to build request");
        assert_eq!(extract_token(&request), None);
        assert_eq!(gate().authenticate(&request), Err(AuthError::Missing));
    }
}
