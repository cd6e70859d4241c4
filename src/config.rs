use serde::Deserialize;

use crate::consts::DEFAULT_PERSIST_RETRIES;

/// Operational knobs loaded from `ENGINE_`-prefixed environment
/// variables. Rule constants (point award, leaderboard size) are not
/// configurable; see [`crate::consts`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    pub persist_retries: Option<u32>,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenv::dotenv().ok();
        envy::prefixed("ENGINE_").from_env()
    }

    pub fn persist_retries(&self) -> u32 {
        self.persist_retries.unwrap_or(DEFAULT_PERSIST_RETRIES)
    }
}
