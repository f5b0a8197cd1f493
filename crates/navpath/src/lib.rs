//! Navigation-mesh pathfinding.
//!
//! A triangulated walkable surface is turned into a graph whose nodes are the interior edges shared
//! by two triangles. Queries locate both endpoints on the mesh, run A* across that edge graph, and
//! optionally pull the resulting corridor taut into a list of turning points.
//!
//! ```
//! use navpath::{MeshBuffers, PathFindingOptions, Pathfinder, Vec3};
//!
//! // A 2x1 rectangle split along one diagonal.
//! let mesh = MeshBuffers::new(
//!     vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 0.0, 1.0], [0.0, 0.0, 1.0]],
//!     vec![0, 1, 3, 1, 2, 3],
//! );
//! let pathfinder = Pathfinder::init(&mesh).expect("valid mesh");
//!
//! let start = Vec3::new(0.0, 0.0, 0.0);
//! let end = Vec3::new(2.0, 0.0, 1.0);
//! let mut points = Vec::new();
//! assert!(pathfinder.find_path(start, end, &mut points, None, PathFindingOptions::simplified()));
//! assert_eq!(points, vec![start, end]);
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

mod astar;
pub mod config;
pub mod error;
mod funnel;
pub mod graph;
pub mod locate;
pub mod math;
pub mod path;
pub mod pathfinder;
pub mod query;
pub mod queue;

pub use config::{BuildConfig, DrainOrder, PathfinderConfig, QueueConfig};
pub use error::NavMeshError;
pub use graph::{EdgeId, MeshBuffers, NavEdge, NavGraph, Triangle, TriangleId};
pub use locate::{LocateMode, Located};
pub use math::Vec3;
pub use path::{EdgePath, NavPath};
pub use pathfinder::{PathFindingOptions, Pathfinder};
pub use query::SearchContext;
pub use queue::{PathCallback, PathRequestQueue, PathResponse};
