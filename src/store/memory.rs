//! In-memory [`NetworkStore`] backed by an R-tree over edge segments.
//!
//! Serves tests and embedders that keep the whole relation resident. Each
//! edge polyline is decomposed into segments for the spatial index; hits are
//! collapsed back to one entry per rowid keeping the closest segment.

use geo::{LineString, Point};
use rstar::primitives::{GeomWithData, Line};
use rstar::{PointDistance, RTree};
use rustc_hash::FxHashMap;

use super::{EdgeHit, GeometryMetadata, LinkRow, NetworkStore};
use crate::error::StoreError;
use crate::graph::NodeId;

#[derive(Debug, Clone)]
pub struct EdgeRecord {
    pub rowid: i64,
    pub from: NodeId,
    pub to: NodeId,
    pub geometry: Option<LineString<f64>>,
    pub name: Option<String>,
}

type IndexedSegment = GeomWithData<Line<[f64; 2]>, usize>;

pub struct MemoryStore {
    records: Vec<EdgeRecord>,
    by_rowid: FxHashMap<i64, usize>,
    rtree: RTree<IndexedSegment>,
    metadata: Option<GeometryMetadata>,
}

impl MemoryStore {
    pub fn new(records: Vec<EdgeRecord>, metadata: Option<GeometryMetadata>) -> Self {
        let mut by_rowid = FxHashMap::default();
        let mut segments = Vec::new();
        for (idx, record) in records.iter().enumerate() {
            by_rowid.insert(record.rowid, idx);
            if let Some(geom) = &record.geometry {
                for line in geom.lines() {
                    segments.push(IndexedSegment::new(
                        Line::new(
                            [line.start.x, line.start.y],
                            [line.end.x, line.end.y],
                        ),
                        idx,
                    ));
                }
            }
        }
        Self {
            records,
            by_rowid,
            rtree: RTree::bulk_load(segments),
            metadata,
        }
    }
}

impl NetworkStore for MemoryStore {
    fn fetch_links(&self, rowids: &[i64]) -> Result<Vec<LinkRow>, StoreError> {
        Ok(rowids
            .iter()
            .filter_map(|rowid| self.by_rowid.get(rowid))
            .map(|&idx| {
                let r = &self.records[idx];
                LinkRow {
                    rowid: r.rowid,
                    from: r.from.clone(),
                    to: r.to.clone(),
                    geometry: r.geometry.clone(),
                    name: r.name.clone(),
                }
            })
            .collect())
    }

    fn edges_within(&self, point: Point<f64>, tolerance: f64) -> Result<Vec<EdgeHit>, StoreError> {
        let q = [point.x(), point.y()];
        let mut best: FxHashMap<usize, f64> = FxHashMap::default();
        for seg in self.rtree.locate_within_distance(q, tolerance * tolerance) {
            let d2 = seg.distance_2(&q);
            best.entry(seg.data)
                .and_modify(|cur| {
                    if d2 < *cur {
                        *cur = d2;
                    }
                })
                .or_insert(d2);
        }
        let mut hits: Vec<EdgeHit> = best
            .into_iter()
            .map(|(idx, d2)| EdgeHit {
                rowid: self.records[idx].rowid,
                distance: d2.sqrt(),
            })
            .collect();
        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.rowid.cmp(&b.rowid))
        });
        Ok(hits)
    }

    fn geometry_metadata(&self) -> Result<Option<GeometryMetadata>, StoreError> {
        Ok(self.metadata)
    }
}
