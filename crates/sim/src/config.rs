//! Environment-driven defaults for the simulator.

use std::env;
use std::path::PathBuf;

const CONTENT_DIR_VAR: &str = "BATTLE_CONTENT_DIR";
const SEED_VAR: &str = "BATTLE_SEED";

/// Settings read from the environment; command-line flags take precedence.
#[derive(Clone, Debug, Default)]
pub struct SimConfig {
    pub content_dir: Option<PathBuf>,
    pub seed: Option<u64>,
}

impl SimConfig {
    pub fn from_env() -> Self {
        Self {
            content_dir: env::var_os(CONTENT_DIR_VAR).map(PathBuf::from),
            seed: read_env(SEED_VAR),
        }
    }

    /// Picks the flag, then the environment, then `data` in the working directory.
    pub fn content_dir(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.content_dir.clone())
            .unwrap_or_else(|| PathBuf::from("data"))
    }

    /// Picks the flag, then the environment, then a random seed.
    pub fn seed(&self, flag: Option<u64>) -> u64 {
        flag.or(self.seed).unwrap_or_else(rand::random)
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
