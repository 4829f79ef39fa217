//! Fixed gameplay constants shared by the server and its clients.
//!
//! Spawn coordinates are in world pixels and must match the client's room
//! geometry; changing them desynchronizes where players appear on screen.

/// Spawn point when joining the lobby.
pub const LOBBY_SPAWN: (f64, f64) = (400.0, 300.0);

/// Spawn point when entering the library from the lobby.
pub const LIBRARY_SPAWN: (f64, f64) = (250.0, 400.0);

/// Spawn point when returning to the lobby from the library, next to the door.
pub const LOBBY_RETURN_SPAWN: (f64, f64) = (480.0, 220.0);

/// Maximum chat and private message length in characters, applied after trimming.
pub const MAX_CHAT_LEN: usize = 200;

/// Default avatar body variant.
pub const DEFAULT_AVATAR_BODY: &str = "u1";

/// Default avatar head accessory.
pub const DEFAULT_AVATAR_HEAD: &str = "none";

/// Avatar items every account may use without an unlock.
pub const BASE_AVATAR_ITEMS: [&str; 4] = ["none", "u1", "cat", "flower"];
