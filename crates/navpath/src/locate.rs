//! Point-to-triangle queries.
//!
//! Every query here is a linear scan over the triangle list. A spatial index would make these
//! sub-linear; the graph is small enough in practice that it has not been needed yet.

use crate::math::{closest_point_on_segment, point_in_triangle_xz, ray_triangle};
use crate::{EdgeId, NavGraph, TriangleId, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LocateMode {
    /// Containment test in the horizontal (XZ) plane.
    #[default]
    Planar,
    /// Vertical ray cast from above the point; the hit point replaces the query point.
    Raycast,
}

/// A query point resolved onto the mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Located {
    pub triangle: TriangleId,
    /// The point to use downstream: the query point itself in `Planar` mode, the ray hit in
    /// `Raycast` mode.
    pub point: Vec3,
}

impl NavGraph {
    pub fn locate(&self, point: Vec3, mode: LocateMode, raycast_height: f32) -> Option<Located> {
        match mode {
            LocateMode::Planar => self.triangle_at(point).map(|triangle| Located {
                triangle,
                point,
            }),
            LocateMode::Raycast => self.raycast_down(point, raycast_height),
        }
    }

    /// First triangle (in index order) whose XZ projection contains `point`.
    pub fn triangle_at(&self, point: Vec3) -> Option<TriangleId> {
        (0..self.triangle_count())
            .map(|i| TriangleId(i as u32))
            .find(|&id| {
                let [a, b, c] = self.triangle_points(id);
                point_in_triangle_xz(point, a, b, c)
            })
    }

    /// Cast a ray straight down from `height` above `point` and return the closest hit.
    pub fn raycast_down(&self, point: Vec3, height: f32) -> Option<Located> {
        let origin_y = point.y + height.max(0.0);
        let origin = Vec3::new(point.x, origin_y, point.z);

        let mut best: Option<(f32, TriangleId)> = None;
        for i in 0..self.triangle_count() {
            let id = TriangleId(i as u32);
            let [a, b, c] = self.triangle_points(id);
            let Some(t) = ray_triangle(origin, Vec3::DOWN, a, b, c) else {
                continue;
            };
            match best {
                Some((best_t, _)) if t >= best_t => {}
                _ => best = Some((t, id)),
            }
        }

        best.map(|(t, triangle)| Located {
            triangle,
            point: Vec3::new(point.x, origin_y - t, point.z),
        })
    }

    /// Navigation edges whose segment passes within `tolerance` of `point`.
    pub fn edges_near(&self, point: Vec3, tolerance: f32) -> Vec<EdgeId> {
        let tol2 = tolerance.max(0.0) * tolerance.max(0.0);
        self.edges()
            .iter()
            .enumerate()
            .filter(|(_, edge)| {
                let [a, b] = edge.vertices();
                let q = closest_point_on_segment(point, self.vertex(a), self.vertex(b));
                q.distance_squared(point) <= tol2
            })
            .map(|(i, _)| EdgeId(i as u32))
            .collect()
    }
}
