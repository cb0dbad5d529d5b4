/// Hosting configuration constants (simulation tick and relay server).
///
/// Fixed simulation step in milliseconds.
pub const TICK_INTERVAL_MS: u64 = 20;

/// Address the websocket relay binds to.
pub const RELAY_BIND_ADDR: (&str, u16) = ("127.0.0.1", 8080);

/// A duel room never holds more than two peers.
pub const MAX_PEERS_PER_ROOM: usize = 2;

/// Environment variable holding the path of a JSON engine config.
pub const CONFIG_ENV_VAR: &str = "DUEL_GRID_CONFIG";
