//! A* search with a Euclidean distance heuristic.
//!
//! The heap key is `g + euclid(node, target) * coeff` where `coeff` is the
//! pre-computed cost-per-unit-distance coefficient carried by the network
//! header. The heuristic requires node coordinates, so A* is only offered on
//! networks stored in the coordinate-bearing format; multi-destination
//! requests always demote to Dijkstra upstream.

use super::FoundPath;
use crate::index::{RoutingIndex, SearchScratch, NO_ARC};

pub fn shortest_path(
    index: &RoutingIndex,
    scratch: &mut SearchScratch,
    from: u32,
    to: u32,
    coeff: f64,
) -> Option<FoundPath> {
    debug_assert!(index.has_coords());
    let goal = index.coord(to)?;
    let heuristic = |node: u32| -> f64 {
        let c = index.coord(node).unwrap_or(goal);
        let dx = c[0] - goal[0];
        let dy = c[1] - goal[1];
        (dx * dx + dy * dy).sqrt() * coeff
    };

    scratch.reset();
    scratch.improve(from, 0.0, NO_ARC);
    scratch.heap.push(heuristic(from), from);

    while let Some((_, u)) = scratch.heap.pop() {
        if scratch.is_settled(u) {
            continue;
        }
        scratch.settle(u);
        let dist = scratch.dist(u);
        if u == to {
            let arcs = scratch.reconstruct(index, from, to)?;
            return Some(FoundPath {
                target: to,
                cost: dist,
                arcs,
            });
        }
        for (arc_idx, arc) in index.neighbors(u) {
            let next = dist + arc.cost;
            if next < scratch.dist(arc.head) {
                scratch.improve(arc.head, next, arc_idx);
                scratch.heap.push(next + heuristic(arc.head), arc.head);
            }
        }
    }
    None
}
