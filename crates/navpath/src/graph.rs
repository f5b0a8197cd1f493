use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{NavMeshError, Result};
use crate::{BuildConfig, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Smallest spatial bucket edge used while merging vertices.
const MIN_BUCKET_SIZE: f32 = 1e-6;

/// Index of a triangle in the built graph (post-dedup, degenerate triangles removed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TriangleId(pub u32);

impl TriangleId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a navigation edge. Navigation edges are the nodes of the search graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EdgeId(pub u32);

impl EdgeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Raw walkable-surface buffers as produced by the mesh generator.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeshBuffers {
    pub vertices: Vec<[f32; 3]>,
    /// Triangle list; three indices per triangle.
    pub indices: Vec<u32>,
    /// Optional per-triangle area classification.
    #[cfg_attr(feature = "serde", serde(default))]
    pub area_ids: Option<Vec<u8>>,
}

impl MeshBuffers {
    pub fn new(vertices: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            area_ids: None,
        }
    }

    pub fn with_area_ids(mut self, area_ids: Vec<u8>) -> Self {
        self.area_ids = Some(area_ids);
        self
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    vertices: [u32; 3],
    edges: [Option<EdgeId>; 3],
    area: u8,
}

impl Triangle {
    pub fn vertices(&self) -> [u32; 3] {
        self.vertices
    }

    /// Navigation edges bordering this triangle, in the order they were materialized.
    pub fn nav_edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.iter().flatten().copied()
    }

    pub fn nav_edge_count(&self) -> usize {
        self.edges.iter().flatten().count()
    }

    pub fn area(&self) -> u8 {
        self.area
    }

    pub fn has_edge(&self, edge: EdgeId) -> bool {
        self.edges.contains(&Some(edge))
    }

    fn attach(&mut self, edge: EdgeId) {
        if let Some(slot) = self.edges.iter_mut().find(|slot| slot.is_none()) {
            *slot = Some(edge);
        }
    }
}

/// An interior edge shared by exactly two triangles.
#[derive(Debug, Clone, PartialEq)]
pub struct NavEdge {
    vertices: [u32; 2],
    triangles: [TriangleId; 2],
    midpoint: Vec3,
}

impl NavEdge {
    pub fn vertices(&self) -> [u32; 2] {
        self.vertices
    }

    pub fn triangles(&self) -> [TriangleId; 2] {
        self.triangles
    }

    pub fn midpoint(&self) -> Vec3 {
        self.midpoint
    }

    pub fn borders(&self, tri: TriangleId) -> bool {
        self.triangles.contains(&tri)
    }

    pub fn other_triangle(&self, tri: TriangleId) -> Option<TriangleId> {
        match self.triangles {
            [a, b] if a == tri => Some(b),
            [a, b] if b == tri => Some(a),
            _ => None,
        }
    }

    /// Vertex shared with `other`, if the two edges meet.
    pub fn shared_vertex(&self, other: &NavEdge) -> Option<u32> {
        self.vertices
            .iter()
            .copied()
            .find(|v| other.vertices.contains(v))
    }
}

/// Immutable traversal graph built from a triangle mesh.
///
/// Graph nodes are navigation edges; two edges are adjacent iff one triangle owns both. Nothing in
/// here is mutated after `build`, so a `NavGraph` can be read from any number of threads.
#[derive(Debug, Clone)]
pub struct NavGraph {
    vertices: Vec<Vec3>,
    triangles: Vec<Triangle>,
    edges: Vec<NavEdge>,
    adjacency: Vec<Vec<EdgeId>>,
    bounds_min: Vec3,
    bounds_max: Vec3,
}

impl NavGraph {
    /// Build the graph: merge near-duplicate vertices, re-index triangles, derive navigation edges
    /// and their adjacency.
    ///
    /// Fails on malformed input (partial triangles, out-of-range indices, or an edge owned by more
    /// than two triangles).
    pub fn build(mesh: &MeshBuffers, config: &BuildConfig) -> Result<Self> {
        if mesh.indices.len() % 3 != 0 {
            return Err(NavMeshError::IndexCountNotMultipleOfThree(mesh.indices.len()));
        }
        let tri_count = mesh.triangle_count();
        if let Some(areas) = &mesh.area_ids {
            if areas.len() != tri_count {
                return Err(NavMeshError::AreaCountMismatch {
                    triangles: tri_count,
                    areas: areas.len(),
                });
            }
        }
        for (tri_idx, tri) in mesh.indices.chunks_exact(3).enumerate() {
            if let Some(&index) = tri.iter().find(|&&i| i as usize >= mesh.vertices.len()) {
                return Err(NavMeshError::VertexIndexOutOfRange {
                    triangle: tri_idx,
                    index,
                    vertex_count: mesh.vertices.len(),
                });
            }
        }

        let input: Vec<Vec3> = mesh.vertices.iter().copied().map(Vec3::from).collect();
        let merged = merge_vertices(&input, config);

        let mut triangles = Vec::with_capacity(tri_count);
        // Input triangle index for each kept triangle (error reporting only).
        let mut source = Vec::with_capacity(tri_count);
        for (tri_idx, tri) in mesh.indices.chunks_exact(3).enumerate() {
            let v = [
                merged.remap[tri[0] as usize],
                merged.remap[tri[1] as usize],
                merged.remap[tri[2] as usize],
            ];
            if v[0] == v[1] || v[1] == v[2] || v[2] == v[0] {
                continue;
            }
            triangles.push(Triangle {
                vertices: v,
                edges: [None; 3],
                area: mesh.area_ids.as_ref().map_or(0, |areas| areas[tri_idx]),
            });
            source.push(tri_idx);
        }
        let dropped = tri_count - triangles.len();

        #[derive(Debug, Clone, Copy)]
        struct EdgeRecord {
            first_owner: usize,
            edge: Option<EdgeId>,
        }

        let vertices = merged.vertices;
        let mut edges: Vec<NavEdge> = Vec::new();
        let mut edge_map: BTreeMap<(u32, u32), EdgeRecord> = BTreeMap::new();

        for tri_idx in 0..triangles.len() {
            let v = triangles[tri_idx].vertices;
            for (a, b) in [(v[0], v[1]), (v[1], v[2]), (v[2], v[0])] {
                let key = (a.min(b), a.max(b));
                match edge_map.entry(key) {
                    Entry::Vacant(slot) => {
                        slot.insert(EdgeRecord {
                            first_owner: tri_idx,
                            edge: None,
                        });
                    }
                    Entry::Occupied(mut slot) => {
                        let record = slot.get_mut();
                        if record.edge.is_some() {
                            return Err(NavMeshError::NonManifoldEdge {
                                a: key.0,
                                b: key.1,
                                triangle: source[tri_idx],
                            });
                        }
                        let id = EdgeId(edges.len() as u32);
                        record.edge = Some(id);
                        edges.push(NavEdge {
                            vertices: [key.0, key.1],
                            triangles: [
                                TriangleId(record.first_owner as u32),
                                TriangleId(tri_idx as u32),
                            ],
                            midpoint: vertices[key.0 as usize].midpoint(vertices[key.1 as usize]),
                        });
                        triangles[record.first_owner].attach(id);
                        triangles[tri_idx].attach(id);
                    }
                }
            }
        }

        let mut adjacency: Vec<Vec<EdgeId>> = vec![Vec::new(); edges.len()];
        for tri in &triangles {
            let ids: Vec<EdgeId> = tri.nav_edges().collect();
            for (i, &a) in ids.iter().enumerate() {
                for &b in &ids[i + 1..] {
                    if !adjacency[a.index()].contains(&b) {
                        adjacency[a.index()].push(b);
                        adjacency[b.index()].push(a);
                    }
                }
            }
        }

        let (bounds_min, bounds_max) = bounds(&vertices);

        debug!(
            input_vertices = input.len(),
            vertices = vertices.len(),
            triangles = triangles.len(),
            dropped_degenerate = dropped,
            nav_edges = edges.len(),
            bucket_size = merged.bucket_size,
            "built navigation graph"
        );

        Ok(Self {
            vertices,
            triangles,
            edges,
            adjacency,
            bounds_min,
            bounds_max,
        })
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn edges(&self) -> &[NavEdge] {
        &self.edges
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn vertex(&self, index: u32) -> Vec3 {
        self.vertices[index as usize]
    }

    pub fn triangle(&self, id: TriangleId) -> &Triangle {
        &self.triangles[id.index()]
    }

    pub fn edge(&self, id: EdgeId) -> &NavEdge {
        &self.edges[id.index()]
    }

    pub fn edge_midpoint(&self, id: EdgeId) -> Vec3 {
        self.edges[id.index()].midpoint
    }

    /// Graph neighbours of `edge`: every other navigation edge sharing a triangle with it.
    pub fn neighbors(&self, edge: EdgeId) -> &[EdgeId] {
        &self.adjacency[edge.index()]
    }

    /// Axis-aligned bounds of the merged vertices (`ZERO`/`ZERO` for an empty mesh).
    pub fn bounds(&self) -> (Vec3, Vec3) {
        (self.bounds_min, self.bounds_max)
    }

    pub fn triangle_points(&self, id: TriangleId) -> [Vec3; 3] {
        let [a, b, c] = self.triangles[id.index()].vertices;
        [self.vertex(a), self.vertex(b), self.vertex(c)]
    }

    pub fn triangle_centroid(&self, id: TriangleId) -> Vec3 {
        let [a, b, c] = self.triangle_points(id);
        (a + b + c) / 3.0
    }

    /// The vertex of `tri` that is not an endpoint of `edge`.
    pub(crate) fn opposite_vertex(&self, tri: TriangleId, edge: &NavEdge) -> Vec3 {
        let v = self.triangles[tri.index()]
            .vertices
            .into_iter()
            .find(|v| !edge.vertices.contains(v))
            .unwrap_or(edge.vertices[0]);
        self.vertex(v)
    }
}

struct MergedVertices {
    vertices: Vec<Vec3>,
    remap: Vec<u32>,
    bucket_size: f32,
}

fn bounds(points: &[Vec3]) -> (Vec3, Vec3) {
    let Some((&first, rest)) = points.split_first() else {
        return (Vec3::ZERO, Vec3::ZERO);
    };
    rest.iter()
        .fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p)))
}

fn merge_vertices(input: &[Vec3], config: &BuildConfig) -> MergedVertices {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    struct Bucket(i64, i64, i64);

    let (min, max) = bounds(input);
    let extent = (max - min).max_element();
    let eps = config.merge_epsilon.max(0.0);
    let bucket_size = (extent * config.max_extent_fraction)
        .max(eps)
        .max(MIN_BUCKET_SIZE);
    let eps2 = eps * eps;

    let bucket_of = |p: Vec3| {
        Bucket(
            ((p.x - min.x) / bucket_size).floor() as i64,
            ((p.y - min.y) / bucket_size).floor() as i64,
            ((p.z - min.z) / bucket_size).floor() as i64,
        )
    };

    let mut vertices: Vec<Vec3> = Vec::with_capacity(input.len());
    let mut remap = Vec::with_capacity(input.len());
    let mut buckets: BTreeMap<Bucket, Vec<u32>> = BTreeMap::new();

    for &p in input {
        let home = bucket_of(p);
        let mut found: Option<u32> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    // Keys saturate on huge extents, so neighbours must too.
                    let key = Bucket(
                        home.0.saturating_add(dx),
                        home.1.saturating_add(dy),
                        home.2.saturating_add(dz),
                    );
                    let Some(list) = buckets.get(&key) else {
                        continue;
                    };
                    for &idx in list {
                        if vertices[idx as usize].distance_squared(p) <= eps2 {
                            // Lowest index wins so the result is independent of bucket scan order.
                            found = Some(found.map_or(idx, |f| f.min(idx)));
                        }
                    }
                }
            }
        }

        let idx = match found {
            Some(idx) => idx,
            None => {
                let idx = vertices.len() as u32;
                vertices.push(p);
                buckets.entry(home).or_default().push(idx);
                idx
            }
        };
        remap.push(idx);
    }

    MergedVertices {
        vertices,
        remap,
        bucket_size,
    }
}
