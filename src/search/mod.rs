//! Shortest-path engines over the flattened routing index.

pub mod astar;
pub mod dijkstra;

/// A resolved shortest path to one target.
#[derive(Debug, Clone)]
pub struct FoundPath {
    pub target: u32,
    pub cost: f64,
    /// Arc indices in traversal order; empty when target == origin.
    pub arcs: Vec<u32>,
}
