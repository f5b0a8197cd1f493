//! String pulling through a corridor of crossed navigation edges.

use crate::math::{cross_xz, point_on_segment_xz, tri_area2_xz};
use crate::{EdgeId, NavEdge, NavGraph, TriangleId, Vec3};

impl NavGraph {
    /// Minimal taut path from `start` to `end` through the corridor described by `edges`.
    ///
    /// The first point is exactly `start`, the last exactly `end`; every point in between is a mesh
    /// vertex. With no edges the result is the direct segment.
    pub fn simplify(&self, start: Vec3, end: Vec3, edges: &[EdgeId]) -> Vec<Vec3> {
        if edges.is_empty() {
            return vec![start, end];
        }
        let mut portals = Vec::with_capacity(edges.len() + 1);
        let mut out = Vec::with_capacity(edges.len() + 2);
        let from = self.entry_triangle(start, end, edges);
        self.simplify_into(start, end, from, edges, &mut portals, &mut out);
        out
    }

    pub(crate) fn simplify_into(
        &self,
        start: Vec3,
        end: Vec3,
        from: TriangleId,
        edges: &[EdgeId],
        portals: &mut Vec<(Vec3, Vec3)>,
        out: &mut Vec<Vec3>,
    ) {
        self.portals_into(from, edges, end, portals);
        string_pull_into(start, portals, out);
        push_corner(out, end);
    }

    /// Orient each crossed edge as a `(left, right)` portal relative to the direction of travel and
    /// append the degenerate `(end, end)` portal.
    ///
    /// The first edge is oriented geometrically. After that the vertex shared with the previous
    /// edge keeps its side and the other vertex takes the opposite one.
    pub fn portals_into(
        &self,
        from: TriangleId,
        edges: &[EdgeId],
        end: Vec3,
        portals: &mut Vec<(Vec3, Vec3)>,
    ) {
        portals.clear();
        portals.reserve(edges.len() + 1);

        let mut current = from;
        let mut previous: Option<(u32, u32)> = None;
        for &id in edges {
            let edge = self.edge(id);
            // A corridor that is not actually connected degrades to the edge's stored orientation.
            let next = edge
                .other_triangle(current)
                .unwrap_or(edge.triangles()[1]);

            let sides = previous
                .and_then(|(left, right)| carry_sides(edge, left, right))
                .unwrap_or_else(|| self.orient(edge, current, next));

            portals.push((self.vertex(sides.0), self.vertex(sides.1)));
            previous = Some(sides);
            current = next;
        }

        portals.push((end, end));
    }

    /// Which owner of the first crossed edge the corridor starts in.
    fn entry_triangle(&self, start: Vec3, end: Vec3, edges: &[EdgeId]) -> TriangleId {
        let first = self.edge(edges[0]);
        let [t0, t1] = first.triangles();

        if let Some(&second) = edges.get(1) {
            let second = self.edge(second);
            if second.borders(t0) && !second.borders(t1) {
                return t1;
            }
            if second.borders(t1) && !second.borders(t0) {
                return t0;
            }
        }

        let [a, b] = first.vertices();
        let (a, b) = (self.vertex(a), self.vertex(b));
        let side = |p: Vec3| tri_area2_xz(a, b, p);
        let s_start = side(start);
        let s_end = side(end);
        for tri in [t0, t1] {
            let s_tri = side(self.opposite_vertex(tri, first));
            if s_start * s_tri > 0.0 || s_end * s_tri < 0.0 {
                return tri;
            }
        }
        t0
    }

    /// Geometric left/right for `edge` when moving from triangle `from` into `to`.
    fn orient(&self, edge: &NavEdge, from: TriangleId, to: TriangleId) -> (u32, u32) {
        let [a, b] = edge.vertices();
        let c0 = self.triangle_centroid(from);
        let dir = self.triangle_centroid(to) - c0;
        let s_a = cross_xz(dir, self.vertex(a) - c0);
        let s_b = cross_xz(dir, self.vertex(b) - c0);
        if s_a >= s_b {
            (a, b)
        } else {
            (b, a)
        }
    }
}

fn carry_sides(edge: &NavEdge, left: u32, right: u32) -> Option<(u32, u32)> {
    let [a, b] = edge.vertices();
    if a == left || b == right {
        Some((a, b))
    } else if b == left || a == right {
        Some((b, a))
    } else {
        None
    }
}

fn push_corner(out: &mut Vec<Vec3>, p: Vec3) {
    if out.last() != Some(&p) {
        out.push(p);
    }
}

/// Tolerance for deciding that the apex already sits on a portal.
const ON_PORTAL_EPS: f32 = 1e-6;

/// Simple stupid funnel over `(left, right)` portals in the XZ plane.
///
/// Left is the counter-clockwise side of the travel direction. When a side would cross over the
/// other, the other side's vertex becomes a corner and the scan resumes from the portal after it.
/// Portals that already contain the apex (an endpoint lying on a crossed edge, or a corner shared
/// with the following portals) constrain nothing and are skipped before the funnel is reopened.
pub(crate) fn string_pull_into(start: Vec3, portals: &[(Vec3, Vec3)], out: &mut Vec<Vec3>) {
    out.clear();
    out.push(start);

    let mut apex = start;
    let Some(first) = first_open_portal(apex, portals, 0) else {
        return;
    };
    let (mut left, mut right) = portals[first];
    let mut left_index = first;
    let mut right_index = first;

    let mut i = first + 1;
    while i < portals.len() {
        let (p_left, p_right) = portals[i];

        // Update right vertex.
        if tri_area2_xz(apex, right, p_right) >= 0.0 {
            if apex == right || tri_area2_xz(apex, left, p_right) < 0.0 {
                right = p_right;
                right_index = i;
            } else {
                push_corner(out, left);
                apex = left;
                let Some(next) = first_open_portal(apex, portals, left_index + 1) else {
                    return;
                };
                (left, right) = portals[next];
                left_index = next;
                right_index = next;
                i = next + 1;
                continue;
            }
        }

        // Update left vertex.
        if tri_area2_xz(apex, left, p_left) <= 0.0 {
            if apex == left || tri_area2_xz(apex, right, p_left) > 0.0 {
                left = p_left;
                left_index = i;
            } else {
                push_corner(out, right);
                apex = right;
                let Some(next) = first_open_portal(apex, portals, right_index + 1) else {
                    return;
                };
                (left, right) = portals[next];
                left_index = next;
                right_index = next;
                i = next + 1;
                continue;
            }
        }

        i += 1;
    }
}

/// Index of the first portal at or after `from` that does not contain `apex`.
fn first_open_portal(apex: Vec3, portals: &[(Vec3, Vec3)], from: usize) -> Option<usize> {
    (from..portals.len()).find(|&i| {
        let (left, right) = portals[i];
        !point_on_segment_xz(apex, left, right, ON_PORTAL_EPS)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32, z: f32) -> Vec3 {
        Vec3::new(x, 0.0, z)
    }

    #[test]
    fn straight_corridor_needs_no_corners() {
        let start = p(0.0, 0.5);
        let end = p(4.0, 0.5);
        // Travelling +x, the counter-clockwise (left) side is +z.
        let portals = vec![
            (p(1.0, 1.0), p(1.0, 0.0)),
            (p(2.0, 1.0), p(2.0, 0.0)),
            (p(3.0, 1.0), p(3.0, 0.0)),
            (end, end),
        ];
        let mut out = Vec::new();
        string_pull_into(start, &portals, &mut out);
        push_corner(&mut out, end);
        assert_eq!(out, vec![start, end]);
    }

    #[test]
    fn corridor_turning_left_wraps_inner_corner() {
        let start = p(0.5, 0.5);
        let end = p(1.5, 2.5);
        // Go +x through the bottom row, then +z up the right column. The inner corner is (1, 1).
        let portals = vec![
            (p(1.0, 1.0), p(1.0, 0.0)),
            (p(1.0, 1.0), p(2.0, 1.0)),
            (p(1.0, 2.0), p(2.0, 2.0)),
            (end, end),
        ];
        let mut out = Vec::new();
        string_pull_into(start, &portals, &mut out);
        push_corner(&mut out, end);
        assert_eq!(out, vec![start, p(1.0, 1.0), end]);
    }

    #[test]
    fn start_on_the_first_portal_does_not_fold_back() {
        // Start sits on the diagonal it is about to cross; the far side must not become a corner.
        let start = p(2.5, 1.5);
        let end = p(2.9, 2.9);
        let portals = vec![(p(2.0, 1.0), p(3.0, 2.0)), (p(2.0, 2.0), p(3.0, 2.0)), (end, end)];
        let mut out = Vec::new();
        string_pull_into(start, &portals, &mut out);
        push_corner(&mut out, end);
        assert_eq!(out, vec![start, end]);
    }

    #[test]
    fn repeated_identical_portals_do_not_add_points() {
        let start = p(0.0, 0.0);
        let end = p(3.0, 0.0);
        let portal = (p(1.0, 1.0), p(1.0, -1.0));
        let portals = vec![portal, portal, portal, (end, end)];
        let mut out = Vec::new();
        string_pull_into(start, &portals, &mut out);
        push_corner(&mut out, end);
        assert_eq!(out, vec![start, end]);
    }
}
