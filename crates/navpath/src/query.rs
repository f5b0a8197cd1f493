use core::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::{EdgeId, Vec3};

#[derive(Debug, Clone, Copy)]
pub(crate) struct OpenNode {
    pub(crate) f: f32,
    pub(crate) g: f32,
    pub(crate) edge: u32,
    tie: u64,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap behave like a min-heap.
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.g.total_cmp(&self.g))
            .then_with(|| other.edge.cmp(&self.edge))
            .then_with(|| other.tie.cmp(&self.tie))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

/// Per-caller scratch state for a search.
///
/// A `NavGraph` is never written during a search; everything that changes lives here. Use one
/// context per thread to run searches concurrently, or reuse one across sequential calls to avoid
/// reallocating. The context is reset at the start of every search.
#[derive(Debug, Default)]
pub struct SearchContext {
    open: BinaryHeap<OpenNode>,
    pub(crate) g_score: Vec<f32>,
    pub(crate) came_from: Vec<Option<u32>>,
    pub(crate) visited: Vec<bool>,
    pub(crate) edge_path: Vec<EdgeId>,
    pub(crate) portals: Vec<(Vec3, Vec3)>,
    tie: u64,
    expansions: usize,
}

impl SearchContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size for a graph with `edge_count` navigation edges.
    pub fn with_capacity(edge_count: usize) -> Self {
        let mut ctx = Self::default();
        ctx.reset(edge_count);
        ctx
    }

    /// Edges expanded (popped and closed) by the last search.
    pub fn expansions(&self) -> usize {
        self.expansions
    }

    /// Crossed edges found by the last successful search.
    pub fn edge_path(&self) -> &[EdgeId] {
        &self.edge_path
    }

    pub(crate) fn reset(&mut self, edge_count: usize) {
        self.open.clear();
        self.g_score.clear();
        self.g_score.resize(edge_count, f32::INFINITY);
        self.came_from.clear();
        self.came_from.resize(edge_count, None);
        self.visited.clear();
        self.visited.resize(edge_count, false);
        self.edge_path.clear();
        self.portals.clear();
        self.tie = 0;
        self.expansions = 0;
    }

    /// Record `g` for `edge` and queue it. Older entries for the same edge stay in the heap and are
    /// skipped when popped.
    pub(crate) fn open(&mut self, edge: EdgeId, g: f32, h: f32, parent: Option<u32>) {
        let idx = edge.index();
        self.g_score[idx] = g;
        self.came_from[idx] = parent;
        self.open.push(OpenNode {
            f: g + h,
            g,
            edge: edge.0,
            tie: self.tie,
        });
        self.tie += 1;
    }

    /// Pop the cheapest live entry and close it.
    pub(crate) fn pop_open(&mut self) -> Option<OpenNode> {
        while let Some(node) = self.open.pop() {
            let idx = node.edge as usize;
            if self.visited[idx] || node.g > self.g_score[idx] {
                continue;
            }
            self.visited[idx] = true;
            self.expansions += 1;
            return Some(node);
        }
        None
    }

    pub(crate) fn reconstruct(&mut self, last: u32) {
        self.edge_path.clear();
        let mut current = Some(last);
        while let Some(edge) = current {
            self.edge_path.push(EdgeId(edge));
            current = self.came_from[edge as usize];
        }
        self.edge_path.reverse();
    }
}
