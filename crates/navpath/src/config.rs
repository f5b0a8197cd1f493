//! Tunables for graph construction, search, and the request queue.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BuildConfig {
    /// Input vertices closer than this are merged into one.
    pub merge_epsilon: f32,
    /// Spatial bucket edge as a fraction of the mesh's largest bounding-box extent.
    ///
    /// The effective bucket edge never drops below `merge_epsilon`.
    pub max_extent_fraction: f32,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            merge_epsilon: 1e-4,
            max_extent_fraction: 0.01,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PathfinderConfig {
    pub build: BuildConfig,
    /// Multiplier applied to the straight-line heuristic.
    ///
    /// `1.0` is the plain Euclidean lower bound. Larger values expand fewer edges but may return a
    /// costlier edge path.
    pub heuristic_scale: f32,
    /// Height above the query point from which `Raycast` locating casts down.
    pub raycast_height: f32,
    /// Default tolerance for `Pathfinder::edges_near`.
    pub edge_query_tolerance: f32,
}

impl Default for PathfinderConfig {
    fn default() -> Self {
        Self {
            build: BuildConfig::default(),
            heuristic_scale: 1.0,
            raycast_height: 1000.0,
            edge_query_tolerance: 0.01,
        }
    }
}

/// Order in which the queue worker processes a drained batch of requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DrainOrder {
    /// Stack order: the most recently submitted request runs first.
    #[default]
    NewestFirst,
    /// Submission order.
    OldestFirst,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct QueueConfig {
    pub drain_order: DrainOrder,
    pub thread_name: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            drain_order: DrainOrder::NewestFirst,
            thread_name: "navpath-worker".to_string(),
        }
    }
}
