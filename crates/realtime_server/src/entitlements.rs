//! Avatar entitlement checks.
//!
//! Every avatar selection that reaches the server is validated against the
//! player's unlocks before it is stored or broadcast. Locked items are
//! coerced to defaults rather than rejected, so the client can always render
//! something and never gets stuck on a refused event.

use crate::directory::PlayerProfile;
use studyhall_protocol::{AvatarConfig, BASE_AVATAR_ITEMS, DEFAULT_AVATAR_BODY, DEFAULT_AVATAR_HEAD};
use tracing::warn;

/// Returns whether `item` may be equipped under `profile`.
///
/// Admins bypass unlock checks entirely. Items in the base set are free for
/// everyone; everything else must appear in the player's unlock list.
pub fn is_item_unlocked(profile: &PlayerProfile, item: &str) -> bool {
    if profile.is_admin {
        return true;
    }
    if BASE_AVATAR_ITEMS.contains(&item) {
        return true;
    }
    profile.unlocked_items.contains(item)
}

/// Coerces `requested` to an avatar the player is entitled to wear.
///
/// Returns the sanitized config and whether anything was replaced. The
/// caller persists the result only when `changed` is true, so a legitimate
/// selection never triggers a redundant write.
pub fn sanitize_avatar(profile: &PlayerProfile, requested: AvatarConfig) -> (AvatarConfig, bool) {
    let mut avatar = requested;
    let mut changed = false;

    if avatar.body.is_empty() || !is_item_unlocked(profile, &avatar.body) {
        warn!(
            "🎨 Replacing locked avatar body '{}' with default",
            avatar.body
        );
        avatar.body = DEFAULT_AVATAR_BODY.to_string();
        changed = true;
    }

    if avatar.head.is_empty() || !is_item_unlocked(profile, &avatar.head) {
        warn!(
            "🎨 Replacing locked avatar head '{}' with default",
            avatar.head
        );
        avatar.head = DEFAULT_AVATAR_HEAD.to_string();
        changed = true;
    }

    (avatar, changed)
}
