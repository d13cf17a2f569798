//! Destination-list parsing and the multi-destination orchestrator.
//!
//! A destination argument is either a single id or a delimiter-separated
//! list of codes/ids. Specifiers that match no node survive as `Undefined`
//! outcomes (echoing the original value), resolvable-but-unreached nodes as
//! `Unreachable`; neither aborts the rest of the resultset.

use crate::formats::IdentityMode;
use crate::graph::{Graph, NodeId};
use crate::index::RoutingIndex;
use crate::search::{astar, dijkstra};
use crate::index::SearchScratch;
use crate::solution::{build_solution, MultiSolution, RouteOutcome, RowOptions};
use crate::store::NetworkStore;

/// One requested destination: the original specifier plus its resolution.
#[derive(Debug, Clone)]
pub struct Destination {
    pub spec: NodeId,
    pub node: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct DestinationSet {
    pub entries: Vec<Destination>,
}

impl DestinationSet {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Specifiers that resolved to a node.
    pub fn resolved(&self) -> Vec<u32> {
        self.entries.iter().filter_map(|d| d.node).collect()
    }

    /// Specifiers that did not.
    pub fn undefined(&self) -> Vec<NodeId> {
        self.entries
            .iter()
            .filter(|d| d.node.is_none())
            .map(|d| d.spec.clone())
            .collect()
    }

    fn push_unique(&mut self, dest: Destination) {
        if !self.entries.iter().any(|d| d.spec == dest.spec) {
            self.entries.push(dest);
        }
    }
}

/// Parses a delimiter-separated destination list, resolving each token
/// against the graph. Duplicate specifiers collapse to one entry.
pub fn parse_list(graph: &Graph, delimiter: char, text: &str) -> DestinationSet {
    let mut set = DestinationSet::default();
    for token in text.split(delimiter) {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let dest = match graph.identity() {
            IdentityMode::Code => Destination {
                spec: NodeId::Code(token.to_string()),
                node: graph.find_by_code(token),
            },
            IdentityMode::Id => match token.parse::<i64>() {
                Ok(id) => Destination {
                    spec: NodeId::Id(id),
                    node: graph.find_by_id(id),
                },
                // a non-numeric token can never match an id-keyed node
                Err(_) => Destination {
                    spec: NodeId::Code(token.to_string()),
                    node: None,
                },
            },
        };
        set.push_unique(dest);
    }
    set
}

/// Wraps a single integer destination.
pub fn from_id(graph: &Graph, id: i64) -> DestinationSet {
    DestinationSet {
        entries: vec![Destination {
            spec: NodeId::Id(id),
            node: graph.find_by_id(id),
        }],
    }
}

/// Resolves every destination in one shared search pass and materializes a
/// solution per entry.
///
/// `use_astar` only applies to a single-destination request; with more than
/// one destination the request silently demotes to Dijkstra.
#[allow(clippy::too_many_arguments)]
pub fn solve(
    graph: &Graph,
    index: &RoutingIndex,
    store: &dyn NetworkStore,
    scratch: &mut SearchScratch,
    from: u32,
    dests: &DestinationSet,
    options: RowOptions,
    use_astar: bool,
) -> MultiSolution {
    let astar_applies = use_astar && dests.len() == 1 && graph.supports_astar();

    let targets = dests.resolved();
    let mut found = if astar_applies {
        targets
            .iter()
            .map(|&t| astar::shortest_path(index, scratch, from, t, graph.heuristic_coeff()))
            .collect::<Vec<_>>()
    } else {
        dijkstra::multi_target(index, scratch, from, &targets)
    };

    let mut routes = Vec::with_capacity(dests.len());
    let mut found_iter = found.drain(..);
    for dest in &dests.entries {
        match dest.node {
            None => routes.push(RouteOutcome::Undefined(dest.spec.clone())),
            Some(node) => match found_iter.next().flatten() {
                Some(path) => routes.push(RouteOutcome::Route(build_solution(
                    graph, index, store, from, &path, options,
                ))),
                None => routes.push(RouteOutcome::Unreachable { from, to: node }),
            },
        }
    }

    MultiSolution { from, routes }
}
