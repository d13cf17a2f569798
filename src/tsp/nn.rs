//! Nearest-neighbour TSP: repeatedly route to the closest unvisited city,
//! then close the circuit back to the source.

use super::{merge_leg_geometry, TspOutcome, TspSolution};
use crate::graph::Graph;
use crate::index::{RoutingIndex, SearchScratch};
use crate::multidest::DestinationSet;
use crate::search::dijkstra;
use crate::solution::{build_solution, RowOptions};
use crate::store::NetworkStore;

pub fn solve(
    graph: &Graph,
    index: &RoutingIndex,
    store: &dyn NetworkStore,
    scratch: &mut SearchScratch,
    from: u32,
    dests: &DestinationSet,
    options: RowOptions,
) -> TspOutcome {
    let undefined = dests.undefined();
    if !undefined.is_empty() {
        return TspOutcome::Illegal {
            undefined,
            unreachable: Vec::new(),
        };
    }

    let mut pending: Vec<u32> = dests.resolved().into_iter().filter(|&t| t != from).collect();
    pending.dedup();
    let mut legs = Vec::with_capacity(pending.len() + 1);
    let mut total_cost = 0.0;
    let mut current = from;

    while !pending.is_empty() {
        match dijkstra::nearest_of(index, scratch, current, &pending) {
            Some(path) => {
                pending.retain(|&t| t != path.target);
                total_cost += path.cost;
                let next = path.target;
                legs.push(build_solution(graph, index, store, current, &path, options));
                current = next;
            }
            None => {
                return TspOutcome::Illegal {
                    undefined: Vec::new(),
                    unreachable: pending,
                };
            }
        }
    }

    // closing leg back to the source
    match dijkstra::single_target(index, scratch, current, from) {
        Some(path) => {
            total_cost += path.cost;
            legs.push(build_solution(graph, index, store, current, &path, options));
        }
        None => {
            return TspOutcome::Illegal {
                undefined: Vec::new(),
                unreachable: vec![from],
            };
        }
    }

    let geometry = merge_leg_geometry(&legs);
    TspOutcome::Solved(TspSolution {
        from,
        total_cost,
        legs,
        geometry,
    })
}
