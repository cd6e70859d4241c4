/// Points granted for every accepted day completion.
pub const POINTS_PER_COMPLETION: u32 = 10;

/// Maximum number of entries a challenge leaderboard exposes.
pub const LEADERBOARD_SIZE: usize = 10;

/// Default number of retries when a conditional persist reports a
/// stale read.
pub const DEFAULT_PERSIST_RETRIES: u32 = 3;
