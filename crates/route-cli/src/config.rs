//! CLI configuration from environment.

use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub navdata: Option<PathBuf>,
    pub random_seed: Option<u64>,
    pub terminal_links: Option<usize>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unparseable numbers are ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            navdata: lookup("ROUTE_NAVDATA").map(PathBuf::from),
            random_seed: lookup("ROUTE_RANDOM_SEED").and_then(|s| s.parse().ok()),
            terminal_links: lookup("ROUTE_TERMINAL_LINKS").and_then(|s| s.parse().ok()),
        }
    }
}
