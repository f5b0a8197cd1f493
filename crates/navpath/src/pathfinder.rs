use std::cell::RefCell;

use tracing::trace;

use crate::error::Result;
use crate::{
    EdgeId, EdgePath, LocateMode, Located, MeshBuffers, NavGraph, NavPath, PathfinderConfig,
    SearchContext, Vec3,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

thread_local! {
    // Created on first use; each thread gets its own.
    static DEFAULT_CONTEXT: RefCell<SearchContext> = RefCell::new(SearchContext::new());
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PathFindingOptions {
    /// Run the funnel over the crossed edges. Otherwise the path goes through edge midpoints.
    pub simplify_path: bool,
    /// Resolve endpoints with a vertical ray cast instead of planar containment.
    pub xyz_axis: bool,
    /// Reserved. Accepted and ignored: off-mesh endpoints are not snapped to the nearest edge.
    pub walk_to_nearest_edge: bool,
}

impl PathFindingOptions {
    pub const fn simplified() -> Self {
        Self {
            simplify_path: true,
            xyz_axis: false,
            walk_to_nearest_edge: false,
        }
    }

    pub const fn raw() -> Self {
        Self {
            simplify_path: false,
            xyz_axis: false,
            walk_to_nearest_edge: false,
        }
    }

    pub const fn with_xyz_axis(mut self, xyz_axis: bool) -> Self {
        self.xyz_axis = xyz_axis;
        self
    }

    pub fn locate_mode(&self) -> LocateMode {
        if self.xyz_axis {
            LocateMode::Raycast
        } else {
            LocateMode::Planar
        }
    }
}

/// Immutable navigation graph plus search settings.
///
/// All query methods take `&self`; share a `Pathfinder` across threads (e.g. behind an `Arc`) and
/// give each thread its own `SearchContext`.
#[derive(Debug, Clone)]
pub struct Pathfinder {
    graph: NavGraph,
    config: PathfinderConfig,
}

impl Pathfinder {
    pub fn init(mesh: &MeshBuffers) -> Result<Self> {
        Self::with_config(mesh, PathfinderConfig::default())
    }

    pub fn with_config(mesh: &MeshBuffers, config: PathfinderConfig) -> Result<Self> {
        let graph = NavGraph::build(mesh, &config.build)?;
        Ok(Self::from_graph(graph, config))
    }

    pub fn from_graph(graph: NavGraph, config: PathfinderConfig) -> Self {
        Self { graph, config }
    }

    pub fn graph(&self) -> &NavGraph {
        &self.graph
    }

    pub fn config(&self) -> &PathfinderConfig {
        &self.config
    }

    pub fn locate(&self, point: Vec3, mode: LocateMode) -> Option<Located> {
        self.graph.locate(point, mode, self.config.raycast_height)
    }

    /// Navigation edges within `tolerance` of `point` (the configured default when `None`).
    pub fn edges_near(&self, point: Vec3, tolerance: Option<f32>) -> Vec<EdgeId> {
        self.graph
            .edges_near(point, tolerance.unwrap_or(self.config.edge_query_tolerance))
    }

    /// Resolve both endpoints and return the crossed navigation edges.
    pub fn find_edge_path(
        &self,
        start: Vec3,
        end: Vec3,
        context: Option<&mut SearchContext>,
        options: PathFindingOptions,
    ) -> Option<EdgePath> {
        let mode = options.locate_mode();
        let from = self.locate(start, mode)?;
        let to = self.locate(end, mode)?;
        with_context(context, |ctx| {
            let cost = self
                .graph
                .search(&from, &to, self.config.heuristic_scale, ctx)?;
            Some(EdgePath {
                start: from,
                end: to,
                edges: ctx.edge_path().to_vec(),
                cost,
            })
        })
    }

    /// Find a path from `start` to `end` and write its points into `out`.
    ///
    /// Returns `false` (and leaves `out` empty) when either point is off the mesh or the two are
    /// not connected. When `context` is `None` a per-thread default context is used.
    pub fn find_path(
        &self,
        start: Vec3,
        end: Vec3,
        out: &mut Vec<Vec3>,
        context: Option<&mut SearchContext>,
        options: PathFindingOptions,
    ) -> bool {
        out.clear();
        let found = with_context(context, |ctx| {
            self.find_path_with(start, end, out, ctx, options)
        })
        .is_some();
        if !found {
            out.clear();
        }
        found
    }

    /// Allocating convenience wrapper around `find_path`.
    pub fn find_path_alloc(
        &self,
        start: Vec3,
        end: Vec3,
        options: PathFindingOptions,
    ) -> Option<NavPath> {
        let mut points = Vec::new();
        self.find_path(start, end, &mut points, None, options)
            .then(|| NavPath::new(points))
    }

    fn find_path_with(
        &self,
        start: Vec3,
        end: Vec3,
        out: &mut Vec<Vec3>,
        ctx: &mut SearchContext,
        options: PathFindingOptions,
    ) -> Option<()> {
        let mode = options.locate_mode();
        let from = self.locate(start, mode)?;
        let to = self.locate(end, mode)?;

        if from.triangle == to.triangle {
            ctx.reset(self.graph.edge_count());
            out.push(from.point);
            out.push(to.point);
            return Some(());
        }

        self.graph
            .search(&from, &to, self.config.heuristic_scale, ctx)?;

        let edge_path = &ctx.edge_path;
        let portals = &mut ctx.portals;

        if options.simplify_path {
            self.graph
                .simplify_into(from.point, to.point, from.triangle, edge_path, portals, out);
        } else {
            out.reserve(edge_path.len() + 2);
            out.push(from.point);
            out.extend(edge_path.iter().map(|&e| self.graph.edge_midpoint(e)));
            out.push(to.point);
        }

        trace!(
            crossed = edge_path.len(),
            points = out.len(),
            simplified = options.simplify_path,
            "path built"
        );
        Some(())
    }
}

fn with_context<R>(
    context: Option<&mut SearchContext>,
    f: impl FnOnce(&mut SearchContext) -> R,
) -> R {
    match context {
        Some(ctx) => f(ctx),
        None => DEFAULT_CONTEXT.with(|ctx| f(&mut ctx.borrow_mut())),
    }
}
