//! # vialite
//!
//! A routing virtual-table engine: shortest paths, isochrones, travelling
//! salesman circuits and point-to-point resolution over binary network
//! blobs, with link geometries and street names joined in from a backing
//! relation.
//!
//! ## Features
//!
//! - **Binary network blobs**: three little-endian format variants (32-bit,
//!   64-bit, 64-bit with A* coordinates), loaded into a flat node arena
//! - **Search engines**: Dijkstra with lazy-decrease heap semantics, plus
//!   A* on coordinate-bearing networks
//! - **Resultset model**: the sixteen-column relation of the SQL surface,
//!   materialized eagerly per query with session-echo columns on the first
//!   row
//! - **Backing store seam**: geometries, names and spatial lookups go
//!   through the [`store::NetworkStore`] trait; an R-tree backed
//!   [`store::MemoryStore`] ships for tests and embedders
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use vialite::{Column, MemoryStore, RoutingTable, Value};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let blobs: Vec<Vec<u8>> = vec![];
//! # let records = vec![];
//! let store = MemoryStore::new(records, None);
//! let mut table = RoutingTable::new(&blobs, store)?;
//!
//! let mut cursor = table.filter(1, [Value::Integer(1), Value::Integer(4)]);
//! while !cursor.eof() {
//!     let cost = cursor.column(Column::Cost);
//!     println!("{:?} -> {:?}", cursor.column(Column::Role), cost);
//!     cursor.next();
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod formats;
pub mod geometry;
pub mod graph;
pub mod heap;
pub mod index;
pub mod multidest;
pub mod point2point;
pub mod range;
pub mod search;
pub mod solution;
pub mod store;
pub mod tsp;
pub mod vtable;

pub use error::{NetworkFormatError, StoreError};
pub use graph::{Graph, NodeId};
pub use point2point::P2pError;
pub use solution::RowOptions;
pub use store::{MemoryStore, NetworkStore};
pub use vtable::{
    plan, Algorithm, Column, Constraint, ConstraintOp, Cursor, Request, RoutingTable, Session,
    SessionUpdate, TableWrite, Value, WriteError,
};
