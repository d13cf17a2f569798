//! Point-to-point resolution: routing between two arbitrary coordinates
//! snapped onto nearby links.
//!
//! Each query point yields a set of directed candidate stubs (one per valid
//! traversal direction of every link within tolerance). A stub carries the
//! partial sub-link between the insertion point and the node where it joins
//! the network, plus the straight-line slack between the literal query point
//! and the insertion point. The resolver ranks every entry/exit node pair by
//! `network cost + partial lengths + slacks`, then materializes only the
//! winning combination.

use geo::{Coord, LineString, Point};
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::error::StoreError;
use crate::geometry::{self, PathLine};
use crate::graph::{Graph, NodeId};
use crate::index::{RoutingIndex, SearchScratch};
use crate::search::dijkstra;
use crate::solution::{build_links_quick, RowOptions, Solution, SolvedLink, FETCH_BLOCK};
use crate::store::{LinkRow, NetworkStore};

/// Snap failure: distinguishable from a valid-but-empty route.
#[derive(Debug, Error)]
pub enum P2pError {
    #[error("no link within tolerance {tolerance} of the {side} point")]
    NoCandidates { side: &'static str, tolerance: f64 },
    #[error("no route connects any candidate entry/exit node pair")]
    NoRoute,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The traversed fragment of a snapped link, between the insertion point and
/// the node where it meets the network.
#[derive(Debug, Clone)]
pub struct PartialLink {
    pub rowid: i64,
    pub node: u32,
    pub length: f64,
    pub name: Option<String>,
}

/// A resolved point-to-point path: partial start/end links around an interior
/// network route, with the whole spliced geometry on the summary.
#[derive(Debug, Clone)]
pub struct P2pSolution {
    pub from_point: Point<f64>,
    pub to_point: Point<f64>,
    pub tolerance: f64,
    /// Straight-line slack between the query points and their insertion
    /// points.
    pub from_extra: f64,
    pub to_extra: f64,
    /// Absent when the query point snapped exactly onto a node.
    pub start: Option<PartialLink>,
    pub end: Option<PartialLink>,
    pub route: Solution,
    pub total_cost: f64,
    pub geometry: Option<PathLine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    /// From side: the stub runs insertion point -> downstream node.
    Entry,
    /// To side: the stub runs upstream node -> insertion point.
    Exit,
}

impl Anchor {
    fn side(self) -> &'static str {
        match self {
            Anchor::Entry => "start",
            Anchor::Exit => "end",
        }
    }
}

/// One directed candidate stub.
#[derive(Debug, Clone)]
struct Candidate {
    node: u32,
    rowid: i64,
    path: Option<LineString<f64>>,
    path_len: f64,
    extra_len: f64,
}

pub fn solve(
    graph: &Graph,
    index: &RoutingIndex,
    store: &dyn NetworkStore,
    scratch: &mut SearchScratch,
    from_point: Point<f64>,
    to_point: Point<f64>,
    tolerance: f64,
    options: RowOptions,
) -> Result<P2pSolution, P2pError> {
    let from_cands = candidates(graph, store, from_point, tolerance, Anchor::Entry)?;
    let to_cands = candidates(graph, store, to_point, tolerance, Anchor::Exit)?;

    let entry_nodes = unique_nodes(&from_cands);
    let exit_nodes = unique_nodes(&to_cands);

    // one shared-source pass per entry node covers every combination
    let mut net_cost: FxHashMap<(u32, u32), f64> = FxHashMap::default();
    for &entry in &entry_nodes {
        for (slot, found) in dijkstra::multi_target(index, scratch, entry, &exit_nodes)
            .into_iter()
            .enumerate()
        {
            if let Some(path) = found {
                net_cost.insert((entry, exit_nodes[slot]), path.cost);
            }
        }
    }

    let mut winner: Option<(usize, usize, f64)> = None;
    for (i, fc) in from_cands.iter().enumerate() {
        for (j, tc) in to_cands.iter().enumerate() {
            if let Some(&cost) = net_cost.get(&(fc.node, tc.node)) {
                let total = cost + fc.path_len + fc.extra_len + tc.path_len + tc.extra_len;
                if winner.map_or(true, |(_, _, best)| total < best) {
                    winner = Some((i, j, total));
                }
            }
        }
    }
    let (fi, ti, total_cost) = winner.ok_or(P2pError::NoRoute)?;
    let from_cand = &from_cands[fi];
    let to_cand = &to_cands[ti];

    let path = dijkstra::single_target(index, scratch, from_cand.node, to_cand.node)
        .ok_or(P2pError::NoRoute)?;
    let mut links = build_links_quick(index, &path);

    let want_geometry = options.wants_geometry() && graph.meta().srid.is_some();
    let want_names = matches!(options, RowOptions::Full | RowOptions::NoGeometry)
        && graph.meta().name_column.is_some();

    let mut rows: FxHashMap<i64, LinkRow> = FxHashMap::default();
    if want_geometry || want_names {
        let mut rowids: Vec<i64> = links.iter().map(|l| l.rowid).collect();
        if from_cand.path.is_some() {
            rowids.push(from_cand.rowid);
        }
        if to_cand.path.is_some() {
            rowids.push(to_cand.rowid);
        }
        rows = fetch_rows_by_id(store, rowids);
    }
    if want_names {
        for link in &mut links {
            if let Some(row) = rows.get(&link.rowid) {
                link.name = row.name.clone();
            }
        }
    }

    let start = from_cand.path.as_ref().map(|_| PartialLink {
        rowid: from_cand.rowid,
        node: from_cand.node,
        length: from_cand.path_len,
        name: lookup_name(want_names, &rows, from_cand.rowid),
    });
    let end = to_cand.path.as_ref().map(|_| PartialLink {
        rowid: to_cand.rowid,
        node: to_cand.node,
        length: to_cand.path_len,
        name: lookup_name(want_names, &rows, to_cand.rowid),
    });

    let geometry = if want_geometry {
        splice_geometry(
            graph, &links, &rows, from_point, to_point, from_cand, to_cand, total_cost,
        )
    } else {
        None
    };

    let route = Solution {
        from: from_cand.node,
        to: to_cand.node,
        total_cost: path.cost,
        links,
        geometry: None,
    };

    tracing::debug!(
        entry = from_cand.node,
        exit = to_cand.node,
        total_cost,
        "point-to-point resolved"
    );
    Ok(P2pSolution {
        from_point,
        to_point,
        tolerance,
        from_extra: from_cand.extra_len,
        to_extra: to_cand.extra_len,
        start,
        end,
        route,
        total_cost,
        geometry,
    })
}

fn resolve_node(graph: &Graph, id: &NodeId) -> Option<u32> {
    match id {
        NodeId::Code(code) => graph.find_by_code(code),
        NodeId::Id(id) => graph.find_by_id(*id),
    }
}

fn unique_nodes(cands: &[Candidate]) -> Vec<u32> {
    let mut nodes: Vec<u32> = cands.iter().map(|c| c.node).collect();
    nodes.sort_unstable();
    nodes.dedup();
    nodes
}

fn lookup_name(
    want_names: bool,
    rows: &FxHashMap<i64, LinkRow>,
    rowid: i64,
) -> Option<String> {
    if want_names {
        rows.get(&rowid).and_then(|r| r.name.clone())
    } else {
        None
    }
}

/// Builds every directed candidate stub around one query point.
fn candidates(
    graph: &Graph,
    store: &dyn NetworkStore,
    point: Point<f64>,
    tolerance: f64,
    anchor: Anchor,
) -> Result<Vec<Candidate>, P2pError> {
    let hits = store.edges_within(point, tolerance)?;
    let rowids: Vec<i64> = hits.iter().map(|h| h.rowid).collect();
    let mut out = Vec::new();
    if !rowids.is_empty() {
        for row in store.fetch_links(&rowids)? {
            let line = match &row.geometry {
                Some(line) => line,
                None => continue,
            };
            let (a, b) = match (resolve_node(graph, &row.from), resolve_node(graph, &row.to)) {
                (Some(a), Some(b)) => (a, b),
                _ => continue,
            };
            // an edge row may be traversable in one or both directions
            if graph.find_link(a, b, row.rowid).is_some() {
                out.push(make_stub(row.rowid, a, b, line, false, point, anchor));
            }
            if graph.find_link(b, a, row.rowid).is_some() {
                out.push(make_stub(row.rowid, b, a, line, true, point, anchor));
            }
        }
    }
    if out.is_empty() {
        return Err(P2pError::NoCandidates {
            side: anchor.side(),
            tolerance,
        });
    }
    Ok(out)
}

/// Cuts the partial sub-link for one directed stub. A fraction at (or past)
/// either endpoint clamps to that node with a zero-length partial.
fn make_stub(
    rowid: i64,
    tail: u32,
    head: u32,
    stored: &LineString<f64>,
    reverse: bool,
    point: Point<f64>,
    anchor: Anchor,
) -> Candidate {
    let oriented = if reverse {
        LineString::from(stored.coords().rev().copied().collect::<Vec<Coord<f64>>>())
    } else {
        stored.clone()
    };
    let fraction = geometry::locate_fraction(&oriented, point);

    let endpoint_stub = |node: u32, at: Option<Point<f64>>| {
        let extra_len = at.map_or(0.0, |p| geometry::point_distance(point, p));
        Candidate {
            node,
            rowid,
            path: None,
            path_len: 0.0,
            extra_len,
        }
    };
    let coord_point = |c: Option<&Coord<f64>>| c.map(|c| Point::new(c.x, c.y));

    if fraction <= 0.0 {
        return endpoint_stub(tail, coord_point(oriented.coords().next()));
    }
    if fraction >= 1.0 {
        return endpoint_stub(head, coord_point(oriented.coords().last()));
    }

    let (node, cut) = match anchor {
        Anchor::Entry => (head, geometry::line_substring(&oriented, fraction, 1.0)),
        Anchor::Exit => (tail, geometry::line_substring(&oriented, 0.0, fraction)),
    };
    match cut {
        Some(path) => {
            // insertion point: first vertex of an ingress, last of an egress
            let insertion = match anchor {
                Anchor::Entry => coord_point(path.coords().next()),
                Anchor::Exit => coord_point(path.coords().last()),
            };
            let extra_len = insertion.map_or(0.0, |p| geometry::point_distance(point, p));
            Candidate {
                node,
                rowid,
                path_len: geometry::line_length(&path),
                path: Some(path),
                extra_len,
            }
        }
        // degenerate cut, fall back to the anchoring node
        None => {
            let at = match anchor {
                Anchor::Entry => coord_point(oriented.coords().last()),
                Anchor::Exit => coord_point(oriented.coords().next()),
            };
            endpoint_stub(node, at)
        }
    }
}

/// Chunked rowid fetch; a failing chunk degrades the output instead of
/// failing the solution.
fn fetch_rows_by_id(store: &dyn NetworkStore, mut rowids: Vec<i64>) -> FxHashMap<i64, LinkRow> {
    rowids.sort_unstable();
    rowids.dedup();
    let mut out = FxHashMap::default();
    for chunk in rowids.chunks(FETCH_BLOCK) {
        match store.fetch_links(chunk) {
            Ok(rows) => {
                for row in rows {
                    out.insert(row.rowid, row);
                }
            }
            Err(err) => {
                tracing::warn!(%err, "auxiliary link fetch failed, degrading solution");
            }
        }
    }
    out
}

/// Splices slack points, partial links and interior links into one polyline,
/// M accumulating as traversed cost/length along the whole path.
#[allow(clippy::too_many_arguments)]
fn splice_geometry(
    graph: &Graph,
    links: &[SolvedLink],
    rows: &FxHashMap<i64, LinkRow>,
    from_point: Point<f64>,
    to_point: Point<f64>,
    from_cand: &Candidate,
    to_cand: &Candidate,
    total_cost: f64,
) -> Option<PathLine> {
    let srid = graph.meta().srid?;
    let mut path = PathLine::new(Some(srid));

    // m tracks traversed cost, including the entry slack
    let mut m = 0.0;
    if from_cand.extra_len > 0.0 {
        path.push_point(from_point.x(), from_point.y(), 0.0);
        m = from_cand.extra_len;
    }
    if let Some(line) = &from_cand.path {
        path.append_segment(line, false, m, m + from_cand.path_len);
        m += from_cand.path_len;
    }

    for link in links {
        let row = rows.get(&link.rowid)?;
        let geom = row.geometry.as_ref()?;
        let tail_id = &graph.node(link.from).id;
        let head_id = &graph.node(link.to).id;
        let reverse = if row.from == *tail_id && row.to == *head_id {
            false
        } else if row.from == *head_id && row.to == *tail_id {
            true
        } else {
            tracing::warn!(rowid = link.rowid, "auxiliary row direction mismatch, dropping geometry");
            return None;
        };
        path.append_segment(geom, reverse, m, m + link.cost);
        m += link.cost;
    }

    if let Some(line) = &to_cand.path {
        path.append_segment(line, false, m, m + to_cand.path_len);
    }
    if to_cand.extra_len > 0.0 {
        path.push_point(to_point.x(), to_point.y(), total_cost);
    }

    (!path.is_empty()).then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{
        IdentityMode, NetworkBlobWriter, NetworkFormat, NetworkHeader, RawLink, RawNode, RawNodeId,
    };
    use crate::store::{EdgeRecord, GeometryMetadata, MemoryStore};
    use geo::line_string;

    /// Bidirectional chain 1 -(rowid 1)- 2 -(rowid 2)- 3 laid on the x axis,
    /// costs equal to lengths.
    fn fixture() -> (Graph, MemoryStore) {
        let header = NetworkHeader {
            format: NetworkFormat::Net64,
            node_count: 3,
            identity: IdentityMode::Id,
            max_code_length: 0,
            table: "roads".to_string(),
            from_column: "node_from".to_string(),
            to_column: "node_to".to_string(),
            geometry_column: Some("geometry".to_string()),
            name_column: Some("name".to_string()),
            astar_coeff: None,
        };
        let writer = NetworkBlobWriter::new(header);
        let nodes = vec![
            RawNode {
                index: 0,
                id: RawNodeId::Id(1),
                coord: None,
                links: vec![RawLink { rowid: 1, dest: 1, cost: 10.0 }],
            },
            RawNode {
                index: 1,
                id: RawNodeId::Id(2),
                coord: None,
                links: vec![
                    RawLink { rowid: 1, dest: 0, cost: 10.0 },
                    RawLink { rowid: 2, dest: 2, cost: 10.0 },
                ],
            },
            RawNode {
                index: 2,
                id: RawNodeId::Id(3),
                coord: None,
                links: vec![RawLink { rowid: 2, dest: 1, cost: 10.0 }],
            },
        ];
        let blobs = vec![writer.encode_header(), writer.encode_block(&nodes)];
        let mut graph = Graph::from_blobs(&blobs).unwrap();

        let records = vec![
            EdgeRecord {
                rowid: 1,
                from: NodeId::Id(1),
                to: NodeId::Id(2),
                geometry: Some(line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)]),
                name: Some("West".to_string()),
            },
            EdgeRecord {
                rowid: 2,
                from: NodeId::Id(2),
                to: NodeId::Id(3),
                geometry: Some(line_string![(x: 10.0, y: 0.0), (x: 20.0, y: 0.0)]),
                name: Some("East".to_string()),
            },
        ];
        let store = MemoryStore::new(
            records,
            Some(GeometryMetadata { srid: 4326, has_z: false }),
        );
        graph.set_geometry_metadata(store.geometry_metadata().unwrap());
        (graph, store)
    }

    #[test]
    fn snaps_both_points_and_splices_the_path() {
        let (graph, store) = fixture();
        let index = RoutingIndex::build(&graph);
        let mut scratch = SearchScratch::new(&index);
        let p2p = solve(
            &graph,
            &index,
            &store,
            &mut scratch,
            Point::new(2.0, 1.0),
            Point::new(18.0, -1.0),
            2.0,
            RowOptions::Full,
        )
        .unwrap();

        // best combination: enter at node 2 via the West stub (len 8),
        // exit at node 2 via the East stub (len 8), no interior links
        assert_eq!(p2p.route.from, 1);
        assert_eq!(p2p.route.to, 1);
        assert!(p2p.route.links.is_empty());
        assert_eq!(p2p.from_extra, 1.0);
        assert_eq!(p2p.to_extra, 1.0);
        assert!((p2p.total_cost - 18.0).abs() < 1e-9);

        let start = p2p.start.unwrap();
        assert_eq!(start.rowid, 1);
        assert_eq!(start.name.as_deref(), Some("West"));
        assert!((start.length - 8.0).abs() < 1e-9);
        let end = p2p.end.unwrap();
        assert_eq!(end.rowid, 2);
        assert!((end.length - 8.0).abs() < 1e-9);

        let geom = p2p.geometry.unwrap();
        let pts: Vec<(f64, f64)> = geom.points.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(
            pts,
            vec![(2.0, 1.0), (2.0, 0.0), (10.0, 0.0), (18.0, 0.0), (18.0, -1.0)]
        );
        let ms: Vec<f64> = geom.points.iter().map(|p| p.m).collect();
        assert!((ms[1] - 1.0).abs() < 1e-9);
        assert!((ms[2] - 9.0).abs() < 1e-9);
        assert!((ms[3] - 17.0).abs() < 1e-9);
        assert!((ms[4] - 18.0).abs() < 1e-9);
    }

    #[test]
    fn endpoint_snap_slack_enters_the_measure() {
        let (graph, store) = fixture();
        let index = RoutingIndex::build(&graph);
        let mut scratch = SearchScratch::new(&index);
        // (0, 2) projects onto the very start of the chain: no partial link,
        // just 2 units of slack down to node 1
        let p2p = solve(
            &graph,
            &index,
            &store,
            &mut scratch,
            Point::new(0.0, 2.0),
            Point::new(20.0, 0.0),
            3.0,
            RowOptions::Full,
        )
        .unwrap();
        assert!(p2p.start.is_none());
        assert_eq!(p2p.from_extra, 2.0);
        assert!((p2p.total_cost - 22.0).abs() < 1e-9);

        let geom = p2p.geometry.unwrap();
        let ms: Vec<f64> = geom.points.iter().map(|p| p.m).collect();
        // the slack shifts every network M, keeping M == traversed cost
        assert_eq!(ms, vec![0.0, 2.0, 12.0, 22.0]);
    }

    #[test]
    fn point_on_a_node_skips_the_partial_link() {
        let (graph, store) = fixture();
        let index = RoutingIndex::build(&graph);
        let mut scratch = SearchScratch::new(&index);
        let p2p = solve(
            &graph,
            &index,
            &store,
            &mut scratch,
            Point::new(0.0, 0.0),
            Point::new(20.0, 0.0),
            1.0,
            RowOptions::Full,
        )
        .unwrap();
        assert!(p2p.start.is_none());
        assert!(p2p.end.is_none());
        assert_eq!(p2p.from_extra, 0.0);
        // whole chain traversed as interior links
        assert_eq!(p2p.route.links.len(), 2);
        assert!((p2p.total_cost - 20.0).abs() < 1e-9);
    }

    #[test]
    fn far_point_is_a_distinguishable_failure() {
        let (graph, store) = fixture();
        let index = RoutingIndex::build(&graph);
        let mut scratch = SearchScratch::new(&index);
        let err = solve(
            &graph,
            &index,
            &store,
            &mut scratch,
            Point::new(500.0, 500.0),
            Point::new(18.0, 0.0),
            2.0,
            RowOptions::Full,
        )
        .unwrap_err();
        assert!(matches!(err, P2pError::NoCandidates { side: "start", .. }));
    }

    #[test]
    fn simple_mode_keeps_costs_but_no_geometry_or_names() {
        let (graph, store) = fixture();
        let index = RoutingIndex::build(&graph);
        let mut scratch = SearchScratch::new(&index);
        let p2p = solve(
            &graph,
            &index,
            &store,
            &mut scratch,
            Point::new(2.0, 1.0),
            Point::new(18.0, -1.0),
            2.0,
            RowOptions::Simple,
        )
        .unwrap();
        assert!((p2p.total_cost - 18.0).abs() < 1e-9);
        assert!(p2p.geometry.is_none());
        assert!(p2p.start.unwrap().name.is_none());
    }
}
