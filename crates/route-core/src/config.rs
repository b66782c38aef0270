//! Path search tuning.

use serde::{Deserialize, Serialize};

/// Knobs for the shortest-path and random-walk searches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FinderConfig {
    /// Nearest graph waypoints an off-graph runway or procedure end is
    /// joined to (DCT) when searching from or to it.
    pub terminal_link_count: usize,
    /// Nearest graph waypoints a literal coordinate is linked to (DCT, both
    /// ways) while injected. 0 leaves injected coordinates unlinked.
    pub coordinate_link_count: usize,
    /// Random walks tried before falling back to the shortest path.
    pub random_max_attempts: usize,
    /// Upper bound on edges taken in a single random walk.
    pub random_max_steps: usize,
    /// How strongly a random walk prefers edges that close distance to the
    /// target. 0 is a uniform walk.
    pub random_progress_bias: f64,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            terminal_link_count: 3,
            coordinate_link_count: 0,
            random_max_attempts: 16,
            random_max_steps: 512,
            random_progress_bias: 4.0,
        }
    }
}
