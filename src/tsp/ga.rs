//! Genetic-algorithm TSP over a precomputed city-to-city cost matrix.
//!
//! One multi-target search per city fills the matrix; the population is
//! seeded with nearest-neighbour tours and refined by interval crossover
//! with occasional parent mutation. Only the final tour is materialized
//! with real path searches.

use rand::Rng;

use super::{merge_leg_geometry, TspOutcome, TspSolution};
use crate::graph::Graph;
use crate::index::{RoutingIndex, SearchScratch};
use crate::multidest::DestinationSet;
use crate::search::dijkstra;
use crate::solution::{build_solution, RowOptions};
use crate::store::NetworkStore;

const GA_MAX_ITERATIONS: usize = 512;

/// A candidate circuit: city indices in visit order, starting slot arbitrary.
#[derive(Debug, Clone)]
struct Tour {
    order: Vec<usize>,
    total: f64,
}

impl Tour {
    fn cost(order: &[usize], matrix: &[Vec<f64>]) -> f64 {
        let mut total = 0.0;
        for i in 0..order.len() {
            let next = order[(i + 1) % order.len()];
            total += matrix[order[i]][next];
        }
        total
    }
}

#[allow(clippy::too_many_arguments)]
pub fn solve<R: Rng>(
    graph: &Graph,
    index: &RoutingIndex,
    store: &dyn NetworkStore,
    scratch: &mut SearchScratch,
    rng: &mut R,
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

    // city 0 is the source; the rest in request order
    let mut cities: Vec<u32> = vec![from];
    for node in dests.resolved() {
        if !cities.contains(&node) {
            cities.push(node);
        }
    }
    let n = cities.len();
    if n < 2 {
        return TspOutcome::Solved(TspSolution {
            from,
            total_cost: 0.0,
            legs: Vec::new(),
            geometry: None,
        });
    }

    let matrix = match build_matrix(index, scratch, &cities) {
        Ok(matrix) => matrix,
        Err(unreachable) => {
            return TspOutcome::Illegal {
                undefined: Vec::new(),
                unreachable,
            };
        }
    };

    let order = evolve(rng, &matrix, n);
    materialize(graph, index, store, scratch, &cities, &order, options)
}

/// One multi-target pass per city; a missing entry means some city pair is
/// disconnected and the circuit is impossible.
fn build_matrix(
    index: &RoutingIndex,
    scratch: &mut SearchScratch,
    cities: &[u32],
) -> Result<Vec<Vec<f64>>, Vec<u32>> {
    let n = cities.len();
    let mut matrix = vec![vec![0.0; n]; n];
    let mut unreachable = Vec::new();
    for (i, &source) in cities.iter().enumerate() {
        let targets: Vec<u32> = cities
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(_, &c)| c)
            .collect();
        let found = dijkstra::multi_target(index, scratch, source, &targets);
        let mut slot = 0usize;
        for (j, path) in found.into_iter().enumerate() {
            if slot == i {
                slot += 1;
            }
            match path {
                Some(path) => matrix[i][slot] = path.cost,
                None => {
                    if !unreachable.contains(&targets[j]) {
                        unreachable.push(targets[j]);
                    }
                }
            }
            slot += 1;
        }
    }
    if unreachable.is_empty() {
        Ok(matrix)
    } else {
        Err(unreachable)
    }
}

/// Greedy matrix tour starting at `start`.
fn nn_tour(matrix: &[Vec<f64>], start: usize) -> Vec<usize> {
    let n = matrix.len();
    let mut order = Vec::with_capacity(n);
    let mut visited = vec![false; n];
    let mut current = start;
    order.push(current);
    visited[current] = true;
    for _ in 1..n {
        let mut best = usize::MAX;
        for next in 0..n {
            if !visited[next] && (best == usize::MAX || matrix[current][next] < matrix[current][best])
            {
                best = next;
            }
        }
        order.push(best);
        visited[best] = true;
        current = best;
    }
    order
}

/// Swaps two random tour positions and recomputes the total from the matrix.
fn mutate<R: Rng>(rng: &mut R, tour: &mut Tour, matrix: &[Vec<f64>]) {
    let n = tour.order.len();
    let a = rng.random_range(0..n);
    let b = rng.random_range(0..n);
    tour.order.swap(a, b);
    tour.total = Tour::cost(&tour.order, matrix);
}

/// Copies a random interval of parent1, then fills the remaining slots in
/// order with parent2's cities, skipping those already placed.
fn crossover<R: Rng>(rng: &mut R, p1: &Tour, p2: &Tour, matrix: &[Vec<f64>]) -> Tour {
    let n = p1.order.len();
    let mut idx1 = rng.random_range(0..n);
    let mut idx2 = rng.random_range(0..n);
    if idx1 > idx2 {
        std::mem::swap(&mut idx1, &mut idx2);
    }
    let mut order = vec![usize::MAX; n];
    let mut placed = vec![false; n];
    for slot in idx1..=idx2 {
        order[slot] = p1.order[slot];
        placed[p1.order[slot]] = true;
    }
    let mut fill = p2.order.iter().filter(|&&c| !placed[c]);
    for slot in order.iter_mut() {
        if *slot == usize::MAX {
            if let Some(&city) = fill.next() {
                *slot = city;
            }
        }
    }
    let total = Tour::cost(&order, matrix);
    Tour { order, total }
}

/// Runs the fixed-iteration evolution and returns the best tour rotated to
/// start at city 0.
fn evolve<R: Rng>(rng: &mut R, matrix: &[Vec<f64>], n: usize) -> Vec<usize> {
    let mut population: Vec<Tour> = (0..n)
        .map(|start| {
            let order = nn_tour(matrix, start);
            let total = Tour::cost(&order, matrix);
            Tour { order, total }
        })
        .collect();

    let mut count = 0usize;
    for _ in 0..GA_MAX_ITERATIONS {
        for _ in 0..population.len() {
            count += 1;
            let i1 = rng.random_range(0..population.len());
            let i2 = rng.random_range(0..population.len());
            let mut p1 = population[i1].clone();
            let mut p2 = population[i2].clone();
            if count % 13 == 0 {
                mutate(rng, &mut p1, matrix);
            }
            if count % 16 == 0 {
                mutate(rng, &mut p2, matrix);
            }
            let child = crossover(rng, &p1, &p2, matrix);

            let mut worst = 0usize;
            for (i, tour) in population.iter().enumerate() {
                if tour.total > population[worst].total {
                    worst = i;
                }
            }
            let duplicate = population.iter().any(|t| t.total == child.total);
            if child.total < population[worst].total && !duplicate {
                population[worst] = child;
            }
        }
    }

    let mut best = 0usize;
    for (i, tour) in population.iter().enumerate() {
        if tour.total < population[best].total {
            best = i;
        }
    }
    let order = &population[best].order;
    let pivot = order.iter().position(|&c| c == 0).unwrap_or(0);
    let mut rotated = Vec::with_capacity(order.len());
    rotated.extend_from_slice(&order[pivot..]);
    rotated.extend_from_slice(&order[..pivot]);
    rotated
}

/// Materializes the chosen tour with real path searches, leg by leg.
fn materialize(
    graph: &Graph,
    index: &RoutingIndex,
    store: &dyn NetworkStore,
    scratch: &mut SearchScratch,
    cities: &[u32],
    order: &[usize],
    options: RowOptions,
) -> TspOutcome {
    let mut legs = Vec::with_capacity(order.len());
    let mut total_cost = 0.0;
    for i in 0..order.len() {
        let tail = cities[order[i]];
        let head = cities[order[(i + 1) % order.len()]];
        match dijkstra::single_target(index, scratch, tail, head) {
            Some(path) => {
                total_cost += path.cost;
                legs.push(build_solution(graph, index, store, tail, &path, options));
            }
            None => {
                return TspOutcome::Illegal {
                    undefined: Vec::new(),
                    unreachable: vec![head],
                };
            }
        }
    }
    let geometry = merge_leg_geometry(&legs);
    TspOutcome::Solved(TspSolution {
        from: cities[0],
        total_cost,
        legs,
        geometry,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{
        IdentityMode, NetworkBlobWriter, NetworkFormat, NetworkHeader, RawLink, RawNode, RawNodeId,
    };
    use crate::multidest;
    use crate::store::{EdgeRecord, MemoryStore};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Complete bidirectional graph over ids 1..=5; ring edges cost 1,
    /// everything else 10, so the unique optimal circuit costs 5.
    fn ring_graph(n: u32) -> Graph {
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
        let mut rowid = 0i64;
        let nodes: Vec<RawNode> = (0..n)
            .map(|i| RawNode {
                index: i,
                id: RawNodeId::Id(i as i64 + 1),
                coord: None,
                links: (0..n)
                    .filter(|&j| j != i)
                    .map(|j| {
                        rowid += 1;
                        let on_ring = (i + 1) % n == j || (j + 1) % n == i;
                        RawLink {
                            rowid,
                            dest: j,
                            cost: if on_ring { 1.0 } else { 10.0 },
                        }
                    })
                    .collect(),
            })
            .collect();
        let blobs = vec![writer.encode_header(), writer.encode_block(&nodes)];
        Graph::from_blobs(&blobs).unwrap()
    }

    #[test]
    fn matrix_holds_pairwise_shortest_costs() {
        let graph = ring_graph(4);
        let index = RoutingIndex::build(&graph);
        let mut scratch = SearchScratch::new(&index);
        let matrix = build_matrix(&index, &mut scratch, &[0, 1, 2, 3]).unwrap();
        assert_eq!(matrix[0][1], 1.0);
        // the direct diagonal edge costs 10 but two ring hops cost 2
        assert_eq!(matrix[0][2], 2.0);
        assert_eq!(matrix[2][0], 2.0);
        assert_eq!(matrix[1][1], 0.0);
    }

    #[test]
    fn finds_the_ring_circuit() {
        let graph = ring_graph(5);
        let index = RoutingIndex::build(&graph);
        let mut scratch = SearchScratch::new(&index);
        let store = MemoryStore::new(Vec::<EdgeRecord>::new(), None);
        let dests = multidest::parse_list(&graph, ',', "2,3,4,5");
        let mut rng = StdRng::seed_from_u64(42);
        let outcome = solve(
            &graph,
            &index,
            &store,
            &mut scratch,
            &mut rng,
            0,
            &dests,
            RowOptions::Simple,
        );
        let tsp = match outcome {
            TspOutcome::Solved(t) => t,
            other => panic!("expected a circuit, got {other:?}"),
        };
        assert_eq!(tsp.legs.len(), 5);
        assert_eq!(tsp.legs[0].from, 0);
        assert_eq!(tsp.legs[4].to, 0);
        assert_eq!(tsp.total_cost, 5.0);
    }

    #[test]
    fn crossover_keeps_every_city_exactly_once() {
        let matrix = vec![vec![1.0; 6]; 6];
        let p1 = Tour {
            order: vec![0, 1, 2, 3, 4, 5],
            total: 6.0,
        };
        let p2 = Tour {
            order: vec![5, 4, 3, 2, 1, 0],
            total: 6.0,
        };
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let child = crossover(&mut rng, &p1, &p2, &matrix);
            let mut seen = vec![false; 6];
            for &c in &child.order {
                assert!(!seen[c], "city {c} placed twice");
                seen[c] = true;
            }
        }
    }
}
