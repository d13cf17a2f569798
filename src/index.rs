//! Flattened routing index and reusable search state.
//!
//! The graph arena is flattened once into a CSR layout (offset array plus a
//! flat arc array) for cache-friendly relaxation. Search bookkeeping lives in
//! a caller-owned [`SearchScratch`] with version-stamped entries, so resets
//! between queries are O(1) and searches never allocate.

use crate::graph::Graph;
use crate::heap::RoutingHeap;

pub const NO_ARC: u32 = u32::MAX;

/// One directed arc of the flattened network.
#[derive(Debug, Clone, Copy)]
pub struct Arc {
    pub tail: u32,
    pub head: u32,
    pub rowid: i64,
    pub cost: f64,
}

pub struct RoutingIndex {
    offsets: Vec<usize>,
    arcs: Vec<Arc>,
    /// Per-node coordinates; empty unless the blob format carries them.
    coords: Vec<[f64; 2]>,
}

impl RoutingIndex {
    pub fn build(graph: &Graph) -> Self {
        let n = graph.len();
        let mut offsets = Vec::with_capacity(n + 1);
        let mut arcs = Vec::with_capacity(graph.link_count());
        offsets.push(0);
        for (idx, node) in graph.nodes().iter().enumerate() {
            for link in &node.links {
                arcs.push(Arc {
                    tail: idx as u32,
                    head: link.head,
                    rowid: link.rowid,
                    cost: link.cost,
                });
            }
            offsets.push(arcs.len());
        }
        let coords = if graph.supports_astar() {
            graph
                .nodes()
                .iter()
                .map(|node| {
                    let (x, y) = node.coord.unwrap_or((0.0, 0.0));
                    [x, y]
                })
                .collect()
        } else {
            Vec::new()
        };
        Self {
            offsets,
            arcs,
            coords,
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn n_arcs(&self) -> usize {
        self.arcs.len()
    }

    pub fn arc(&self, idx: u32) -> &Arc {
        &self.arcs[idx as usize]
    }

    #[inline(always)]
    pub fn neighbors(&self, node: u32) -> impl Iterator<Item = (u32, &Arc)> + '_ {
        let start = self.offsets[node as usize];
        let end = self.offsets[node as usize + 1];
        (start..end).map(move |i| (i as u32, &self.arcs[i]))
    }

    pub fn coord(&self, node: u32) -> Option<[f64; 2]> {
        self.coords.get(node as usize).copied()
    }

    pub fn has_coords(&self) -> bool {
        !self.coords.is_empty()
    }
}

/// Version-stamped per-node search entry.
#[derive(Clone, Copy)]
struct NodeState {
    dist: f64,
    prev_arc: u32,
    settled: bool,
    version: u32,
}

/// Reusable search bookkeeping, owned by the cursor and lent to each search.
///
/// Single ownership of the scratch is what makes "one search at a time" a
/// compile-time rule rather than a runtime convention.
pub struct SearchScratch {
    state: Vec<NodeState>,
    version: u32,
    pub heap: RoutingHeap,
}

impl SearchScratch {
    pub fn new(index: &RoutingIndex) -> Self {
        Self {
            state: vec![
                NodeState {
                    dist: f64::INFINITY,
                    prev_arc: NO_ARC,
                    settled: false,
                    version: 0,
                };
                index.n_nodes()
            ],
            version: 0,
            heap: RoutingHeap::with_capacity(index.n_arcs()),
        }
    }

    pub fn reset(&mut self) {
        self.version = self.version.wrapping_add(1);
        if self.version == 0 {
            for entry in &mut self.state {
                entry.version = 0;
            }
            self.version = 1;
        }
        self.heap.clear();
    }

    #[inline(always)]
    fn entry(&self, node: u32) -> Option<&NodeState> {
        let entry = &self.state[node as usize];
        (entry.version == self.version).then_some(entry)
    }

    #[inline(always)]
    pub fn dist(&self, node: u32) -> f64 {
        self.entry(node).map_or(f64::INFINITY, |e| e.dist)
    }

    #[inline(always)]
    pub fn prev_arc(&self, node: u32) -> Option<u32> {
        self.entry(node)
            .and_then(|e| (e.prev_arc != NO_ARC).then_some(e.prev_arc))
    }

    #[inline(always)]
    pub fn is_settled(&self, node: u32) -> bool {
        self.entry(node).is_some_and(|e| e.settled)
    }

    #[inline(always)]
    pub fn improve(&mut self, node: u32, dist: f64, prev_arc: u32) {
        self.state[node as usize] = NodeState {
            dist,
            prev_arc,
            settled: false,
            version: self.version,
        };
    }

    #[inline(always)]
    pub fn settle(&mut self, node: u32) {
        self.state[node as usize].settled = true;
    }

    /// Walks predecessor arcs from `to` back to `from`; arcs come out in
    /// traversal order. `None` when `to` was never reached.
    pub fn reconstruct(&self, index: &RoutingIndex, from: u32, to: u32) -> Option<Vec<u32>> {
        if from == to {
            return Some(Vec::new());
        }
        let mut arcs = Vec::new();
        let mut node = to;
        while node != from {
            let arc_idx = self.prev_arc(node)?;
            arcs.push(arc_idx);
            node = index.arc(arc_idx).tail;
        }
        arcs.reverse();
        Some(arcs)
    }
}
