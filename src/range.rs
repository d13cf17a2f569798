//! Cost-bounded reachability (isochrone) orchestration.
//!
//! One row per node whose shortest distance from the origin fits the budget,
//! ordered by node index; the origin itself is excluded. On
//! coordinate-bearing networks each reached node also carries its point
//! geometry.

use crate::index::{RoutingIndex, SearchScratch};
use crate::search::dijkstra;

#[derive(Debug, Clone, Copy)]
pub struct RangeNode {
    pub node: u32,
    pub cost: f64,
}

#[derive(Debug, Clone)]
pub struct RangeSolution {
    pub from: u32,
    pub max_cost: f64,
    pub nodes: Vec<RangeNode>,
}

pub fn solve(
    index: &RoutingIndex,
    scratch: &mut SearchScratch,
    from: u32,
    max_cost: f64,
) -> RangeSolution {
    let nodes = dijkstra::within_cost(index, scratch, from, max_cost)
        .into_iter()
        .map(|(node, cost)| RangeNode { node, cost })
        .collect();
    let solution = RangeSolution {
        from,
        max_cost,
        nodes,
    };
    tracing::debug!(
        from,
        max_cost,
        reached = solution.nodes.len(),
        "range solution built"
    );
    solution
}
