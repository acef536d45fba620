// Tunable navigation parameters.
//
// `NavConfig` is loaded from JSON and never mutated after the manager is
// built. Every field has a default, so a partial file (or `{}`) is valid;
// `validate()` rejects values the algorithms cannot work with.
//
// See also: `manager.rs` which owns the config, `graph.rs` which reads the
// floor boundaries and stair cost during `fetch_neighbors`, `search.rs` for
// the heuristic weight and expansion cap.

use crate::error::{NavError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Edge-creation radius for nodes that do not specify their own.
    pub default_fetch_radius: f32,

    /// Additive traversal penalty assigned to every stair node on rebuild.
    pub stair_cost: f32,

    /// Ascending heights separating floors. A node's floor is the number of
    /// boundaries strictly below its height, so `[-1.0, 1.0]` yields floors
    /// 0, 1 and 2.
    pub floor_boundaries: Vec<f32>,

    /// Multiplier on |dy| to the goal added to the A* heuristic. Large values
    /// make the search strongly prefer staying on the goal's floor.
    pub vertical_heuristic_weight: f32,

    /// Y-axis scale applied when choosing an agent's start node, so nodes on
    /// the agent's own floor win over closer nodes above or below.
    pub start_node_vertical_scale: f32,

    /// Upper bound on A* node expansions per search. `None` searches until
    /// the frontier is exhausted.
    pub max_search_expansions: Option<usize>,

    /// Upper bound on staircase legs in one multi-floor route.
    pub max_staircase_legs: usize,

    /// Distance at which an agent counts as having reached a waypoint.
    pub reach_node_distance: f32,

    /// Seed for the manager's random stream (room and interest-node order).
    pub rng_seed: u64,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            default_fetch_radius: 3.0,
            stair_cost: 1000.0,
            floor_boundaries: vec![-1.0, 1.0],
            vertical_heuristic_weight: 10.0,
            start_node_vertical_scale: 10.0,
            max_search_expansions: Some(100_000),
            max_staircase_legs: 16,
            reach_node_distance: 0.5,
            rng_seed: 0x5eed,
        }
    }
}

impl NavConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: NavConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_fetch_radius.is_nan() || self.default_fetch_radius <= 0.0 {
            return Err(NavError::Config(format!(
                "default_fetch_radius must be positive, got {}",
                self.default_fetch_radius
            )));
        }
        if self.stair_cost < 0.0 || !self.stair_cost.is_finite() {
            return Err(NavError::Config(format!(
                "stair_cost must be finite and non-negative, got {}",
                self.stair_cost
            )));
        }
        if self.floor_boundaries.windows(2).any(|w| w[0] >= w[1]) {
            return Err(NavError::Config(
                "floor_boundaries must be strictly ascending".into(),
            ));
        }
        if self.vertical_heuristic_weight < 0.0 {
            return Err(NavError::Config(
                "vertical_heuristic_weight must be non-negative".into(),
            ));
        }
        if self.start_node_vertical_scale.is_nan() || self.start_node_vertical_scale <= 0.0 {
            return Err(NavError::Config(
                "start_node_vertical_scale must be positive".into(),
            ));
        }
        if self.max_search_expansions == Some(0) {
            return Err(NavError::Config(
                "max_search_expansions must be at least 1".into(),
            ));
        }
        if self.max_staircase_legs == 0 {
            return Err(NavError::Config(
                "max_staircase_legs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
