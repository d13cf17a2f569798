//! Dijkstra searches: multi-target, nearest-of, and cost-bounded range.
//!
//! All variants share the same discipline: one heap entry per relaxed arc
//! (lazy duplicates, no decrease-key), stale entries skipped through the
//! settled flag, and per-target paths reconstructed the moment the target is
//! settled.

use rustc_hash::FxHashMap;

use super::FoundPath;
use crate::index::{RoutingIndex, SearchScratch, NO_ARC};

/// Resolves shortest paths from `from` to every target in one pass.
///
/// The result is aligned with `targets`; `None` marks an unreachable target.
/// The search terminates as soon as the last pending target settles.
pub fn multi_target(
    index: &RoutingIndex,
    scratch: &mut SearchScratch,
    from: u32,
    targets: &[u32],
) -> Vec<Option<FoundPath>> {
    let mut results: Vec<Option<FoundPath>> = vec![None; targets.len()];
    let mut pending: FxHashMap<u32, Vec<usize>> = FxHashMap::default();
    for (slot, &t) in targets.iter().enumerate() {
        pending.entry(t).or_default().push(slot);
    }
    let mut remaining = targets.len();
    if remaining == 0 {
        return results;
    }

    scratch.reset();
    scratch.improve(from, 0.0, NO_ARC);
    scratch.heap.push(0.0, from);

    while let Some((dist, u)) = scratch.heap.pop() {
        if scratch.is_settled(u) {
            continue;
        }
        scratch.settle(u);
        if let Some(slots) = pending.remove(&u) {
            let arcs = scratch.reconstruct(index, from, u).unwrap_or_default();
            for slot in slots {
                results[slot] = Some(FoundPath {
                    target: u,
                    cost: dist,
                    arcs: arcs.clone(),
                });
                remaining -= 1;
            }
            if remaining == 0 {
                break;
            }
        }
        relax(index, scratch, u, dist);
    }

    tracing::trace!(
        from,
        targets = targets.len(),
        found = targets.len() - remaining,
        "multi-target search done"
    );
    results
}

/// Single-destination convenience over [`multi_target`].
pub fn single_target(
    index: &RoutingIndex,
    scratch: &mut SearchScratch,
    from: u32,
    to: u32,
) -> Option<FoundPath> {
    multi_target(index, scratch, from, &[to]).pop().flatten()
}

/// Finds the closest of `targets` and stops there. Used by the greedy TSP
/// chain, where only the nearest unvisited city matters.
pub fn nearest_of(
    index: &RoutingIndex,
    scratch: &mut SearchScratch,
    from: u32,
    targets: &[u32],
) -> Option<FoundPath> {
    scratch.reset();
    scratch.improve(from, 0.0, NO_ARC);
    scratch.heap.push(0.0, from);

    while let Some((dist, u)) = scratch.heap.pop() {
        if scratch.is_settled(u) {
            continue;
        }
        scratch.settle(u);
        if u != from && targets.contains(&u) {
            let arcs = scratch.reconstruct(index, from, u)?;
            return Some(FoundPath {
                target: u,
                cost: dist,
                arcs,
            });
        }
        relax(index, scratch, u, dist);
    }
    None
}

/// Cost-bounded reachability: every node (except the origin) whose shortest
/// distance is within `max_cost`, ordered by node index.
///
/// A node is only ever enqueued when its tentative distance fits the budget,
/// so the search never inspects anything beyond the isochrone.
pub fn within_cost(
    index: &RoutingIndex,
    scratch: &mut SearchScratch,
    from: u32,
    max_cost: f64,
) -> Vec<(u32, f64)> {
    let mut reached = Vec::new();

    scratch.reset();
    scratch.improve(from, 0.0, NO_ARC);
    scratch.heap.push(0.0, from);

    while let Some((dist, u)) = scratch.heap.pop() {
        if scratch.is_settled(u) {
            continue;
        }
        scratch.settle(u);
        if u != from {
            reached.push((u, dist));
        }
        for (arc_idx, arc) in index.neighbors(u) {
            let next = dist + arc.cost;
            if next <= max_cost && next < scratch.dist(arc.head) {
                scratch.improve(arc.head, next, arc_idx);
                scratch.heap.push(next, arc.head);
            }
        }
    }

    reached.sort_unstable_by_key(|&(node, _)| node);
    reached
}

#[inline(always)]
fn relax(index: &RoutingIndex, scratch: &mut SearchScratch, u: u32, dist: f64) {
    for (arc_idx, arc) in index.neighbors(u) {
        let next = dist + arc.cost;
        if next < scratch.dist(arc.head) {
            scratch.improve(arc.head, next, arc_idx);
            scratch.heap.push(next, arc.head);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{
        IdentityMode, NetworkBlobWriter, NetworkFormat, NetworkHeader, RawLink, RawNode, RawNodeId,
    };
    use crate::graph::Graph;

    /// Builds a graph from (tail, head, rowid, cost) tuples.
    fn graph_from_edges(n: u32, edges: &[(u32, u32, i64, f64)]) -> Graph {
        let header = NetworkHeader {
            format: NetworkFormat::Net64,
            node_count: n,
            identity: IdentityMode::Id,
            max_code_length: 0,
            table: "roads".to_string(),
            from_column: "node_from".to_string(),
            to_column: "node_to".to_string(),
            geometry_column: None,
            name_column: None,
            astar_coeff: None,
        };
        let writer = NetworkBlobWriter::new(header);
        let nodes: Vec<RawNode> = (0..n)
            .map(|i| RawNode {
                index: i,
                id: RawNodeId::Id(i as i64),
                coord: None,
                links: edges
                    .iter()
                    .filter(|e| e.0 == i)
                    .map(|&(_, head, rowid, cost)| RawLink {
                        rowid,
                        dest: head,
                        cost,
                    })
                    .collect(),
            })
            .collect();
        let blobs = vec![writer.encode_header(), writer.encode_block(&nodes)];
        Graph::from_blobs(&blobs).unwrap()
    }

    fn setup(n: u32, edges: &[(u32, u32, i64, f64)]) -> (RoutingIndex, SearchScratch) {
        let graph = graph_from_edges(n, edges);
        let index = RoutingIndex::build(&graph);
        let scratch = SearchScratch::new(&index);
        (index, scratch)
    }

    #[test]
    fn picks_the_cheaper_of_two_routes() {
        // 0 -> 1 -> 2 costs 3, direct 0 -> 2 costs 5
        let (index, mut scratch) = setup(
            3,
            &[(0, 1, 1, 1.0), (1, 2, 2, 2.0), (0, 2, 3, 5.0)],
        );
        let path = single_target(&index, &mut scratch, 0, 2).unwrap();
        assert_eq!(path.cost, 3.0);
        let rowids: Vec<i64> = path.arcs.iter().map(|&a| index.arc(a).rowid).collect();
        assert_eq!(rowids, vec![1, 2]);
    }

    #[test]
    fn unreachable_target_is_none() {
        let (index, mut scratch) = setup(3, &[(0, 1, 1, 1.0)]);
        assert!(single_target(&index, &mut scratch, 0, 2).is_none());
    }

    #[test]
    fn origin_as_target_is_an_empty_path() {
        let (index, mut scratch) = setup(2, &[(0, 1, 1, 1.0)]);
        let path = single_target(&index, &mut scratch, 0, 0).unwrap();
        assert_eq!(path.cost, 0.0);
        assert!(path.arcs.is_empty());
    }

    #[test]
    fn one_pass_resolves_every_target() {
        let (index, mut scratch) = setup(
            4,
            &[(0, 1, 1, 1.0), (1, 2, 2, 1.0), (2, 3, 3, 1.0)],
        );
        let results = multi_target(&index, &mut scratch, 0, &[3, 1, 2]);
        let costs: Vec<f64> = results.iter().map(|r| r.as_ref().unwrap().cost).collect();
        assert_eq!(costs, vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn mixed_reachability_in_one_pass() {
        let (index, mut scratch) = setup(4, &[(0, 1, 1, 1.0), (3, 2, 2, 1.0)]);
        let results = multi_target(&index, &mut scratch, 0, &[1, 2]);
        assert!(results[0].is_some());
        assert!(results[1].is_none());
    }

    #[test]
    fn no_targets_means_no_search() {
        let (index, mut scratch) = setup(3, &[(0, 1, 1, 1.0), (1, 2, 2, 1.0)]);
        single_target(&index, &mut scratch, 0, 2).unwrap();
        let results = multi_target(&index, &mut scratch, 0, &[]);
        assert!(results.is_empty());
        // the scratch still holds the previous search: nothing was explored
        assert_eq!(scratch.dist(2), 2.0);
    }

    #[test]
    fn nearest_of_stops_at_the_closest_city() {
        let (index, mut scratch) = setup(
            4,
            &[(0, 1, 1, 5.0), (0, 2, 2, 2.0), (0, 3, 3, 9.0)],
        );
        let found = nearest_of(&index, &mut scratch, 0, &[1, 2, 3]).unwrap();
        assert_eq!(found.target, 2);
        assert_eq!(found.cost, 2.0);
    }

    #[test]
    fn range_respects_the_budget_and_skips_the_origin() {
        // line 0 -1-> 1 -2-> 2 -3-> 3, budget 3: reaches 1 and 2 only
        let (index, mut scratch) = setup(
            4,
            &[(0, 1, 1, 1.0), (1, 2, 2, 2.0), (2, 3, 3, 3.0)],
        );
        let reached = within_cost(&index, &mut scratch, 0, 3.0);
        assert_eq!(reached, vec![(1, 1.0), (2, 3.0)]);
    }

    #[test]
    fn scratch_can_be_reused_across_searches() {
        let (index, mut scratch) = setup(3, &[(0, 1, 1, 1.0), (1, 2, 2, 1.0)]);
        let first = single_target(&index, &mut scratch, 0, 2).unwrap();
        assert_eq!(first.cost, 2.0);
        let second = single_target(&index, &mut scratch, 1, 2).unwrap();
        assert_eq!(second.cost, 1.0);
    }
}
