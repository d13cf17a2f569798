//! Backing-relation collaborator.
//!
//! The network blob only carries topology. Link geometries, street names and
//! spatial metadata stay in the backing relation; the engine reaches them
//! through this trait using batched key lookups, never row-at-a-time.

mod memory;

pub use memory::{EdgeRecord, MemoryStore};

use geo::{LineString, Point};

use crate::error::StoreError;
use crate::graph::NodeId;

/// Spatial metadata of the backing relation's geometry column.
#[derive(Debug, Clone, Copy)]
pub struct GeometryMetadata {
    pub srid: i32,
    pub has_z: bool,
}

/// One backing-relation row, keyed by rowid.
#[derive(Debug, Clone)]
pub struct LinkRow {
    pub rowid: i64,
    pub from: NodeId,
    pub to: NodeId,
    pub geometry: Option<LineString<f64>>,
    pub name: Option<String>,
}

/// A candidate edge found near a query point.
#[derive(Debug, Clone)]
pub struct EdgeHit {
    pub rowid: i64,
    pub distance: f64,
}

pub trait NetworkStore {
    /// Batched rowid lookup. Missing rowids are simply absent from the
    /// result; callers treat absence as degraded data, not as an error.
    fn fetch_links(&self, rowids: &[i64]) -> Result<Vec<LinkRow>, StoreError>;

    /// Edges whose geometry lies within `tolerance` of `point`, closest
    /// first.
    fn edges_within(&self, point: Point<f64>, tolerance: f64) -> Result<Vec<EdgeHit>, StoreError>;

    /// SRID / dimension discovery; `None` when the relation carries no
    /// usable geometry column.
    fn geometry_metadata(&self) -> Result<Option<GeometryMetadata>, StoreError>;
}
