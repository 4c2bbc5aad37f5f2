//! Runtime configuration
//!
//! Layered with figment: built-in defaults, then an optional TOML file,
//! then `CHARD_`-prefixed environment variables.

use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::actor::DEFAULT_QUEUE_DEPTH;

/// File read when no `--config` path is given
pub const DEFAULT_CONFIG_FILE: &str = "chard.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// SQLite database path; `None` keeps characters in memory
    pub database: Option<String>,
    /// Mailbox depth for each character actor
    pub queue_depth: usize,
    /// Fixed dice seed for reproducible runs
    pub seed: Option<u64>,
    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: None,
            queue_depth: DEFAULT_QUEUE_DEPTH,
            seed: None,
            log_json: false,
        }
    }
}

impl Config {
    /// Provider stack for the given config file
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("CHARD_"))
    }

    /// Load from `path` (or `chard.toml`) and the environment.
    /// A missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Self::figment(path).extract()
    }
}
