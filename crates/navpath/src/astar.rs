use tracing::trace;

use crate::{EdgeId, Located, NavGraph, SearchContext, Vec3};

impl NavGraph {
    /// A* over navigation edges from `start` to `end`.
    ///
    /// Each edge is a node positioned at its midpoint. `g` is the distance from `start` through the
    /// preceding midpoints; `h` is the straight-line distance from the midpoint to `end`, scaled by
    /// `heuristic_scale`. At a scale of `1.0` the heuristic never overestimates, so the returned
    /// edge path has the lowest midpoint cost.
    ///
    /// On success the crossed edges are left in `ctx.edge_path()` and the path cost is returned.
    /// Returns `None` when the frontier empties first (e.g. disconnected regions).
    pub fn search(
        &self,
        start: &Located,
        end: &Located,
        heuristic_scale: f32,
        ctx: &mut SearchContext,
    ) -> Option<f32> {
        ctx.reset(self.edge_count());

        if start.triangle == end.triangle {
            return Some(start.point.distance(end.point));
        }

        let goal = end.point;
        let scale = heuristic_scale.max(0.0);
        let heuristic = |mid: Vec3| mid.distance(goal) * scale;

        for edge in self.triangle(start.triangle).nav_edges() {
            let mid = self.edge_midpoint(edge);
            let g = start.point.distance(mid);
            if g < ctx.g_score[edge.index()] {
                ctx.open(edge, g, heuristic(mid), None);
            }
        }

        while let Some(node) = ctx.pop_open() {
            let current = self.edge(EdgeId(node.edge));
            let mid = current.midpoint();

            if current.borders(end.triangle) {
                ctx.reconstruct(node.edge);
                let cost = node.g + mid.distance(goal);
                trace!(
                    start = start.triangle.0,
                    end = end.triangle.0,
                    expansions = ctx.expansions(),
                    edges = ctx.edge_path.len(),
                    cost,
                    "edge path found"
                );
                return Some(cost);
            }

            for &next in self.neighbors(EdgeId(node.edge)) {
                let idx = next.index();
                if ctx.visited[idx] {
                    continue;
                }
                let next_mid = self.edge_midpoint(next);
                let tentative_g = node.g + mid.distance(next_mid);
                if tentative_g >= ctx.g_score[idx] {
                    continue;
                }
                ctx.open(next, tentative_g, heuristic(next_mid), Some(node.edge));
            }
        }

        trace!(
            start = start.triangle.0,
            end = end.triangle.0,
            expansions = ctx.expansions(),
            "frontier exhausted"
        );
        None
    }
}
