//! Player directory: avatar and unlock lookups behind a trait seam.
//!
//! Room logic never talks to storage directly. It goes through
//! [`PlayerDirectory`], which the host application implements against its
//! account store. [`InMemoryDirectory`] backs tests and standalone runs.
//!
//! Lookups for unknown users succeed with a default profile rather than
//! erroring; a lookup error means the backing store itself is unreachable.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashSet;
use studyhall_protocol::{AvatarConfig, UserId};

/// What the directory knows about a player.
#[derive(Debug, Clone, Default)]
pub struct PlayerProfile {
    /// Last persisted avatar selection
    pub avatar: AvatarConfig,

    /// Item ids the player has unlocked beyond the base set
    pub unlocked_items: HashSet<String>,

    /// Admins may equip any item regardless of unlocks
    pub is_admin: bool,
}

/// Errors a directory backend can surface.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// The backing store could not be reached or returned a failure
    #[error("directory lookup failed: {0}")]
    Lookup(String),
}

/// Read and write access to player profiles.
///
/// Implementations must treat an unknown `user_id` as an empty default
/// profile, not an error. [`DirectoryError`] is reserved for backend
/// failures, which callers degrade from rather than propagate to clients.
#[async_trait]
pub trait PlayerDirectory: Send + Sync {
    /// Fetches the profile for `user_id`, defaulting if unknown.
    async fn profile(&self, user_id: &UserId) -> Result<PlayerProfile, DirectoryError>;

    /// Persists `avatar` as the player's current selection.
    async fn save_avatar(&self, user_id: &UserId, avatar: &AvatarConfig)
        -> Result<(), DirectoryError>;
}

/// Directory backed by process memory.
///
/// Used by tests and by deployments that run the realtime server without an
/// account database. Profiles vanish on restart.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    profiles: DashMap<UserId, PlayerProfile>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self {
            profiles: DashMap::new(),
        }
    }

    /// Seeds or replaces a profile.
    pub fn insert_profile(&self, user_id: UserId, profile: PlayerProfile) {
        self.profiles.insert(user_id, profile);
    }
}

#[async_trait]
impl PlayerDirectory for InMemoryDirectory {
    async fn profile(&self, user_id: &UserId) -> Result<PlayerProfile, DirectoryError> {
        Ok(self
            .profiles
            .get(user_id)
            .map(|entry| entry.clone())
            .unwrap_or_default())
    }

    async fn save_avatar(
        &self,
        user_id: &UserId,
        avatar: &AvatarConfig,
    ) -> Result<(), DirectoryError> {
        self.profiles.entry(user_id.clone()).or_default().avatar = avatar.clone();
        Ok(())
    }
}
