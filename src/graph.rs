//! In-memory routing network.
//!
//! Nodes live in a flat arena and links refer to their destination by node
//! index. Identity lookup (text code or integer id, fixed per network) goes
//! through hash side-tables built once at load time.

use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fmt;

use crate::error::NetworkFormatError;
use crate::formats::{parse_block, parse_header, IdentityMode, NetworkFormat, RawNodeId};
use crate::store::GeometryMetadata;

/// Node identity. A network uses codes or ids exclusively, never both.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum NodeId {
    Code(String),
    Id(i64),
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Code(code) => write!(f, "{code}"),
            NodeId::Id(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Link {
    /// Destination node index.
    pub head: u32,
    /// Rowid of the backing relation row this link was built from.
    pub rowid: i64,
    pub cost: f64,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    /// Present only in the A* format variant.
    pub coord: Option<(f64, f64)>,
    pub links: Vec<Link>,
}

/// Backing-relation metadata carried by the header blob, plus the spatial
/// metadata discovered from the store after load.
#[derive(Debug, Clone)]
pub struct GraphMeta {
    pub table: String,
    pub from_column: String,
    pub to_column: String,
    pub geometry_column: Option<String>,
    pub name_column: Option<String>,
    pub astar_coeff: Option<f64>,
    pub srid: Option<i32>,
    pub has_z: bool,
}

#[derive(Debug)]
pub struct Graph {
    format: NetworkFormat,
    identity: IdentityMode,
    nodes: Vec<Node>,
    by_code: FxHashMap<String, u32>,
    by_id: FxHashMap<i64, u32>,
    link_count: usize,
    meta: GraphMeta,
}

impl Graph {
    /// Loads a network from its blob sequence: one header blob followed by
    /// the network blocks.
    pub fn from_blobs<B: AsRef<[u8]>>(blobs: &[B]) -> Result<Self, NetworkFormatError> {
        let mut iter = blobs.iter();
        let header_blob = iter.next().ok_or(NetworkFormatError::Truncated {
            offset: 0,
            needed: 1,
        })?;
        let header = parse_header(header_blob.as_ref())?;

        let mut slots: Vec<Option<Node>> = Vec::new();
        slots.resize_with(header.node_count as usize, || None);
        let mut loaded = 0u32;
        for blob in iter {
            for raw in parse_block(blob.as_ref(), &header)? {
                let slot = &mut slots[raw.index as usize];
                if slot.is_some() {
                    return Err(NetworkFormatError::DuplicateNode(raw.index));
                }
                *slot = Some(Node {
                    id: match raw.id {
                        RawNodeId::Code(code) => NodeId::Code(code),
                        RawNodeId::Id(id) => NodeId::Id(id),
                    },
                    coord: raw.coord,
                    links: raw
                        .links
                        .into_iter()
                        .map(|l| Link {
                            head: l.dest,
                            rowid: l.rowid,
                            cost: l.cost,
                        })
                        .collect(),
                });
                loaded += 1;
            }
        }
        if loaded != header.node_count {
            return Err(NetworkFormatError::NodeCountMismatch {
                declared: header.node_count,
                loaded,
            });
        }

        let nodes: Vec<Node> = slots.into_iter().flatten().collect();
        let mut by_code = FxHashMap::default();
        let mut by_id = FxHashMap::default();
        let mut link_count = 0;
        for (idx, node) in nodes.iter().enumerate() {
            link_count += node.links.len();
            match &node.id {
                NodeId::Code(code) => {
                    by_code.insert(code.clone(), idx as u32);
                }
                NodeId::Id(id) => {
                    by_id.insert(*id, idx as u32);
                }
            }
        }

        tracing::debug!(
            nodes = nodes.len(),
            links = link_count,
            format = ?header.format,
            "network loaded"
        );

        Ok(Self {
            format: header.format,
            identity: header.identity,
            nodes,
            by_code,
            by_id,
            link_count,
            meta: GraphMeta {
                table: header.table,
                from_column: header.from_column,
                to_column: header.to_column,
                geometry_column: header.geometry_column,
                name_column: header.name_column,
                astar_coeff: header.astar_coeff,
                srid: None,
                has_z: false,
            },
        })
    }

    /// Records the SRID / dimension metadata discovered from the backing
    /// store. Absent metadata disables geometry emission downstream.
    pub fn set_geometry_metadata(&mut self, metadata: Option<GeometryMetadata>) {
        match metadata {
            Some(m) => {
                self.meta.srid = Some(m.srid);
                self.meta.has_z = m.has_z;
            }
            None => {
                self.meta.srid = None;
                self.meta.has_z = false;
            }
        }
    }

    pub fn format(&self) -> NetworkFormat {
        self.format
    }

    pub fn identity(&self) -> IdentityMode {
        self.identity
    }

    pub fn meta(&self) -> &GraphMeta {
        &self.meta
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn link_count(&self) -> usize {
        self.link_count
    }

    pub fn node(&self, index: u32) -> &Node {
        &self.nodes[index as usize]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn find_by_code(&self, code: &str) -> Option<u32> {
        self.by_code.get(code).copied()
    }

    pub fn find_by_id(&self, id: i64) -> Option<u32> {
        self.by_id.get(&id).copied()
    }

    /// Looks up the directed link `tail -> head` with the given rowid.
    pub fn find_link(&self, tail: u32, head: u32, rowid: i64) -> Option<&Link> {
        self.node(tail)
            .links
            .iter()
            .find(|l| l.head == head && l.rowid == rowid)
    }

    /// A* is available only when the blob format carries coordinates.
    pub fn supports_astar(&self) -> bool {
        self.format.has_coords()
    }

    /// Heuristic coefficient declared by the network; 1.0 when absent.
    pub fn heuristic_coeff(&self) -> f64 {
        self.meta.astar_coeff.unwrap_or(1.0)
    }
}
