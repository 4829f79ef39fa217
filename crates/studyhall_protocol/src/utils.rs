//! # Utility Functions
//!
//! Timestamp helpers shared by the server and its tests. All wire payloads
//! carry millisecond timestamps; seconds are used for token claims and
//! uptime arithmetic.

// ============================================================================
// Utility Functions
// ============================================================================

/// Returns the current Unix timestamp in seconds.
///
/// Used for credential claims (`iat`/`exp`) and uptime math.
///
/// # Panics
///
/// Panics if the system clock is set to a time before the Unix epoch
/// (January 1, 1970). This should never happen in practice on modern systems.
pub fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("Time went backwards")
        .as_secs()
}

/// Returns the current Unix timestamp in milliseconds.
///
/// This is the resolution every wire payload uses (`timestamp` fields in
/// chat, quiz-progress, and achievement events, plus `joinedAt` stamps).
pub fn current_timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
