//! Solution model and the builder that joins search results with the
//! backing relation.
//!
//! A search yields arc indices; the builder turns them into a [`Solution`]
//! with per-link names and an assembled route geometry, fetching the
//! auxiliary rows in bounded rowid batches. Missing or inconsistent
//! auxiliary data degrades the solution (geometry dropped) without failing
//! the query.

use rustc_hash::FxHashMap;

use crate::geometry::PathLine;
use crate::graph::{Graph, NodeId};
use crate::index::RoutingIndex;
use crate::search::FoundPath;
use crate::store::{LinkRow, NetworkStore};

/// Upper bound on rowids per batched store lookup.
pub const FETCH_BLOCK: usize = 128;

/// Row production options, settable per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowOptions {
    #[default]
    Full,
    /// Summary rows only, no per-link rows.
    NoLinks,
    /// Per-link rows, no geometries.
    NoGeometry,
    /// Summary with total cost only: no links, no geometry, no store access.
    Simple,
}

impl RowOptions {
    pub fn label(self) -> &'static str {
        match self {
            RowOptions::Full => "Full",
            RowOptions::NoLinks => "No Links",
            RowOptions::NoGeometry => "No Geometries",
            RowOptions::Simple => "Simple",
        }
    }

    pub(crate) fn wants_geometry(self) -> bool {
        matches!(self, RowOptions::Full | RowOptions::NoLinks)
    }

    fn wants_store(self) -> bool {
        !matches!(self, RowOptions::Simple)
    }
}

/// One traversed link of a solution.
#[derive(Debug, Clone)]
pub struct SolvedLink {
    pub rowid: i64,
    pub from: u32,
    pub to: u32,
    pub cost: f64,
    pub name: Option<String>,
}

/// A fully built route between two resolved nodes.
#[derive(Debug, Clone)]
pub struct Solution {
    pub from: u32,
    pub to: u32,
    pub total_cost: f64,
    pub links: Vec<SolvedLink>,
    pub geometry: Option<PathLine>,
}

/// Builds a [`Solution`] from a found path, fetching auxiliary data per the
/// session options.
pub fn build_solution(
    graph: &Graph,
    index: &RoutingIndex,
    store: &dyn NetworkStore,
    from: u32,
    path: &FoundPath,
    options: RowOptions,
) -> Solution {
    let mut links: Vec<SolvedLink> = path
        .arcs
        .iter()
        .map(|&arc_idx| {
            let arc = index.arc(arc_idx);
            SolvedLink {
                rowid: arc.rowid,
                from: arc.tail,
                to: arc.head,
                cost: arc.cost,
                name: None,
            }
        })
        .collect();

    let mut geometry = None;
    if options.wants_store() && !links.is_empty() {
        let rows = fetch_rows(store, &links);
        attach_names(&mut links, &rows);
        if options.wants_geometry() {
            geometry = assemble_geometry(graph, &links, &rows);
        }
    }

    Solution {
        from,
        to: path.target,
        total_cost: path.cost,
        links,
        geometry,
    }
}

/// Links-only variant used internally by the point-to-point resolver, which
/// splices geometry itself.
pub(crate) fn build_links_quick(index: &RoutingIndex, path: &FoundPath) -> Vec<SolvedLink> {
    path.arcs
        .iter()
        .map(|&arc_idx| {
            let arc = index.arc(arc_idx);
            SolvedLink {
                rowid: arc.rowid,
                from: arc.tail,
                to: arc.head,
                cost: arc.cost,
                name: None,
            }
        })
        .collect()
}

/// Batched auxiliary-row lookup, keyed by rowid.
pub(crate) fn fetch_rows(
    store: &dyn NetworkStore,
    links: &[SolvedLink],
) -> FxHashMap<i64, LinkRow> {
    let mut rowids: Vec<i64> = links.iter().map(|l| l.rowid).collect();
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

fn attach_names(links: &mut [SolvedLink], rows: &FxHashMap<i64, LinkRow>) {
    for link in links {
        if let Some(row) = rows.get(&link.rowid) {
            link.name = row.name.clone();
        }
    }
}

/// Stitches per-link polylines into one route geometry, reversing links
/// traversed against their stored direction and accumulating the M measure
/// from traversed cost. Any missing or direction-inconsistent row abandons
/// the whole geometry.
fn assemble_geometry(
    graph: &Graph,
    links: &[SolvedLink],
    rows: &FxHashMap<i64, LinkRow>,
) -> Option<PathLine> {
    let srid = graph.meta().srid?;
    let mut path = PathLine::new(Some(srid));
    let mut m = 0.0;
    for link in links {
        let row = match rows.get(&link.rowid) {
            Some(row) => row,
            None => {
                tracing::warn!(rowid = link.rowid, "missing auxiliary row, dropping geometry");
                return None;
            }
        };
        let geom = match &row.geometry {
            Some(geom) => geom,
            None => {
                tracing::warn!(rowid = link.rowid, "link without geometry, dropping geometry");
                return None;
            }
        };
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
        let m_end = m + link.cost;
        path.append_segment(geom, reverse, m, m_end);
        m = m_end;
    }
    (!path.is_empty()).then_some(path)
}

/// Per-destination outcome inside a multi-destination resultset.
#[derive(Debug, Clone)]
pub enum RouteOutcome {
    Route(Solution),
    /// Destination specifier matched no node; carries the original value.
    Undefined(NodeId),
    /// Node exists but no path reaches it.
    Unreachable { from: u32, to: u32 },
}

/// A whole multi-destination (or TSP) resultset, materialized eagerly.
#[derive(Debug, Clone)]
pub struct MultiSolution {
    pub from: u32,
    pub routes: Vec<RouteOutcome>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{
        IdentityMode, NetworkBlobWriter, NetworkFormat, NetworkHeader, RawLink, RawNode, RawNodeId,
    };
    use crate::index::SearchScratch;
    use crate::search::dijkstra;
    use crate::store::{EdgeRecord, GeometryMetadata, MemoryStore};
    use geo::line_string;

    /// Line network 10 -> 11 -> 12; edge 2 is stored reversed (12 -> 11).
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
                id: RawNodeId::Id(10),
                coord: None,
                links: vec![RawLink { rowid: 1, dest: 1, cost: 4.0 }],
            },
            RawNode {
                index: 1,
                id: RawNodeId::Id(11),
                coord: None,
                links: vec![RawLink { rowid: 2, dest: 2, cost: 6.0 }],
            },
            RawNode {
                index: 2,
                id: RawNodeId::Id(12),
                coord: None,
                links: vec![],
            },
        ];
        let blobs = vec![writer.encode_header(), writer.encode_block(&nodes)];
        let mut graph = Graph::from_blobs(&blobs).unwrap();

        let records = vec![
            EdgeRecord {
                rowid: 1,
                from: NodeId::Id(10),
                to: NodeId::Id(11),
                geometry: Some(line_string![(x: 0.0, y: 0.0), (x: 4.0, y: 0.0)]),
                name: Some("First".to_string()),
            },
            EdgeRecord {
                rowid: 2,
                from: NodeId::Id(12),
                to: NodeId::Id(11),
                geometry: Some(line_string![(x: 10.0, y: 0.0), (x: 4.0, y: 0.0)]),
                name: Some("Second".to_string()),
            },
        ];
        let store = MemoryStore::new(
            records,
            Some(GeometryMetadata { srid: 4326, has_z: false }),
        );
        graph.set_geometry_metadata(store.geometry_metadata().unwrap());
        (graph, store)
    }

    use crate::store::NetworkStore;

    #[test]
    fn full_solution_gets_names_and_stitched_geometry() {
        let (graph, store) = fixture();
        let index = RoutingIndex::build(&graph);
        let mut scratch = SearchScratch::new(&index);
        let path = dijkstra::single_target(&index, &mut scratch, 0, 2).unwrap();
        let solution = build_solution(&graph, &index, &store, 0, &path, RowOptions::Full);

        assert_eq!(solution.total_cost, 10.0);
        assert_eq!(solution.links.len(), 2);
        assert_eq!(solution.links[0].name.as_deref(), Some("First"));
        let geom = solution.geometry.unwrap();
        // reversed second edge still flows 0 -> 10 with continuous M
        let xs: Vec<f64> = geom.points.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 4.0, 10.0]);
        let ms: Vec<f64> = geom.points.iter().map(|p| p.m).collect();
        assert_eq!(ms, vec![0.0, 4.0, 10.0]);
    }

    #[test]
    fn simple_solution_never_touches_the_store() {
        let (graph, _store) = fixture();
        let index = RoutingIndex::build(&graph);
        let mut scratch = SearchScratch::new(&index);
        let path = dijkstra::single_target(&index, &mut scratch, 0, 2).unwrap();

        struct PanicStore;
        impl NetworkStore for PanicStore {
            fn fetch_links(
                &self,
                _: &[i64],
            ) -> Result<Vec<LinkRow>, crate::error::StoreError> {
                panic!("store must not be touched in Simple mode")
            }
            fn edges_within(
                &self,
                _: geo::Point<f64>,
                _: f64,
            ) -> Result<Vec<crate::store::EdgeHit>, crate::error::StoreError> {
                panic!("store must not be touched in Simple mode")
            }
            fn geometry_metadata(
                &self,
            ) -> Result<Option<GeometryMetadata>, crate::error::StoreError> {
                Ok(None)
            }
        }

        let solution =
            build_solution(&graph, &index, &PanicStore, 0, &path, RowOptions::Simple);
        assert_eq!(solution.total_cost, 10.0);
        assert!(solution.geometry.is_none());
        assert!(solution.links.iter().all(|l| l.name.is_none()));
    }

    #[test]
    fn missing_aux_row_degrades_geometry_but_keeps_cost() {
        let (mut graph, _) = fixture();
        // store without edge 2: geometry must be dropped, cost preserved
        let store = MemoryStore::new(
            vec![EdgeRecord {
                rowid: 1,
                from: NodeId::Id(10),
                to: NodeId::Id(11),
                geometry: Some(line_string![(x: 0.0, y: 0.0), (x: 4.0, y: 0.0)]),
                name: Some("First".to_string()),
            }],
            Some(GeometryMetadata { srid: 4326, has_z: false }),
        );
        graph.set_geometry_metadata(store.geometry_metadata().unwrap());
        let index = RoutingIndex::build(&graph);
        let mut scratch = SearchScratch::new(&index);
        let path = dijkstra::single_target(&index, &mut scratch, 0, 2).unwrap();
        let solution = build_solution(&graph, &index, &store, 0, &path, RowOptions::Full);
        assert_eq!(solution.total_cost, 10.0);
        assert!(solution.geometry.is_none());
        assert_eq!(solution.links[0].name.as_deref(), Some("First"));
    }

    #[test]
    fn no_geometry_option_keeps_names_only() {
        let (graph, store) = fixture();
        let index = RoutingIndex::build(&graph);
        let mut scratch = SearchScratch::new(&index);
        let path = dijkstra::single_target(&index, &mut scratch, 0, 2).unwrap();
        let solution =
            build_solution(&graph, &index, &store, 0, &path, RowOptions::NoGeometry);
        assert!(solution.geometry.is_none());
        assert_eq!(solution.links[1].name.as_deref(), Some("Second"));
    }
}
