//! Network blob header/block parsing and encoding.

use super::*;
use crate::error::NetworkFormatError;

/// The three on-disk format variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkFormat {
    Net32,
    Net64,
    Net64Astar,
}

impl NetworkFormat {
    pub fn signature(self) -> u8 {
        match self {
            NetworkFormat::Net32 => NET_START_32,
            NetworkFormat::Net64 => NET_START_64,
            NetworkFormat::Net64Astar => NET_START_ASTAR,
        }
    }

    pub fn from_signature(sig: u8) -> Result<Self, NetworkFormatError> {
        match sig {
            NET_START_32 => Ok(NetworkFormat::Net32),
            NET_START_64 => Ok(NetworkFormat::Net64),
            NET_START_ASTAR => Ok(NetworkFormat::Net64Astar),
            other => Err(NetworkFormatError::UnknownFormat(other)),
        }
    }

    /// 64-bit ids/rowids (the legacy variant packs them in 32 bits).
    pub fn wide_ids(self) -> bool {
        !matches!(self, NetworkFormat::Net32)
    }

    /// Per-node coordinates present (required by A*).
    pub fn has_coords(self) -> bool {
        matches!(self, NetworkFormat::Net64Astar)
    }

    fn has_name_column(self) -> bool {
        self.wide_ids()
    }
}

/// How nodes are identified throughout the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityMode {
    Code,
    Id,
}

/// Decoded HEADER blob.
#[derive(Debug, Clone)]
pub struct NetworkHeader {
    pub format: NetworkFormat,
    pub node_count: u32,
    pub identity: IdentityMode,
    /// Fixed width of node codes inside blocks; zero in id mode.
    pub max_code_length: u8,
    pub table: String,
    pub from_column: String,
    pub to_column: String,
    pub geometry_column: Option<String>,
    pub name_column: Option<String>,
    pub astar_coeff: Option<f64>,
}

/// Node identity as read from a block, before graph interning.
#[derive(Debug, Clone, PartialEq)]
pub enum RawNodeId {
    Code(String),
    Id(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawLink {
    pub rowid: i64,
    pub dest: u32,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawNode {
    pub index: u32,
    pub id: RawNodeId,
    pub coord: Option<(f64, f64)>,
    pub links: Vec<RawLink>,
}

/// Decodes a HEADER blob.
pub fn parse_header(blob: &[u8]) -> Result<NetworkHeader, NetworkFormatError> {
    let mut cur = BlobCursor::new(blob);
    let format = NetworkFormat::from_signature(cur.read_u8()?)?;
    cur.expect(NET_HEADER, "header")?;
    let node_count = cur.read_u32()?;
    let identity = {
        let offset = cur.offset();
        match cur.read_u8()? {
            NET_CODES => IdentityMode::Code,
            NET_IDS => IdentityMode::Id,
            found => {
                return Err(NetworkFormatError::BadSignature {
                    what: "identity mode",
                    found,
                    offset,
                })
            }
        }
    };
    let max_code_length = cur.read_u8()?;

    cur.expect(NET_TABLE, "table tag")?;
    let table = cur.read_string("table name")?;
    cur.expect(NET_FROM_COLUMN, "from-column tag")?;
    let from_column = cur.read_string("from-column name")?;
    cur.expect(NET_TO_COLUMN, "to-column tag")?;
    let to_column = cur.read_string("to-column name")?;
    cur.expect(NET_GEOMETRY_COLUMN, "geometry-column tag")?;
    let geometry_column = non_empty(cur.read_string("geometry-column name")?);
    let name_column = if format.has_name_column() {
        cur.expect(NET_NAME_COLUMN, "name-column tag")?;
        non_empty(cur.read_string("name-column name")?)
    } else {
        None
    };
    let astar_coeff = if format.has_coords() {
        cur.expect(NET_ASTAR_COEFF, "heuristic coefficient tag")?;
        Some(cur.read_f64()?)
    } else {
        None
    };
    cur.expect(NET_END_HEADER, "header terminator")?;
    if cur.remaining() != 0 {
        return Err(NetworkFormatError::TrailingBytes(cur.remaining()));
    }

    Ok(NetworkHeader {
        format,
        node_count,
        identity,
        max_code_length,
        table,
        from_column,
        to_column,
        geometry_column,
        name_column,
        astar_coeff,
    })
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Decodes one NETWORK block blob against an already-decoded header.
pub fn parse_block(
    blob: &[u8],
    header: &NetworkHeader,
) -> Result<Vec<RawNode>, NetworkFormatError> {
    let mut cur = BlobCursor::new(blob);
    cur.expect(NET_BLOCK, "block")?;
    let count = cur.read_u16()?;
    let mut nodes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        nodes.push(parse_node(&mut cur, header)?);
    }
    if cur.remaining() != 0 {
        return Err(NetworkFormatError::TrailingBytes(cur.remaining()));
    }
    Ok(nodes)
}

fn parse_node(
    cur: &mut BlobCursor<'_>,
    header: &NetworkHeader,
) -> Result<RawNode, NetworkFormatError> {
    cur.expect(NET_NODE, "node")?;
    let index = cur.read_u32()?;
    if index >= header.node_count {
        return Err(NetworkFormatError::NodeIndexOutOfRange {
            index,
            count: header.node_count,
        });
    }
    let id = match header.identity {
        IdentityMode::Code => {
            let raw = cur.read_bytes(header.max_code_length as usize)?;
            let trimmed: Vec<u8> = raw.iter().copied().take_while(|&b| b != 0).collect();
            let code = String::from_utf8(trimmed)
                .map_err(|_| NetworkFormatError::InvalidText { what: "node code" })?;
            RawNodeId::Code(code)
        }
        IdentityMode::Id => {
            if header.format.wide_ids() {
                RawNodeId::Id(cur.read_i64()?)
            } else {
                RawNodeId::Id(cur.read_i32()? as i64)
            }
        }
    };
    let coord = if header.format.has_coords() {
        let x = cur.read_f64()?;
        let y = cur.read_f64()?;
        Some((x, y))
    } else {
        None
    };
    let link_count = cur.read_u16()?;
    let mut links = Vec::with_capacity(link_count as usize);
    for _ in 0..link_count {
        cur.expect(NET_LINK, "link")?;
        let rowid = if header.format.wide_ids() {
            cur.read_i64()?
        } else {
            cur.read_i32()? as i64
        };
        let dest = cur.read_u32()?;
        if dest >= header.node_count {
            return Err(NetworkFormatError::NodeIndexOutOfRange {
                index: dest,
                count: header.node_count,
            });
        }
        let cost = cur.read_f64()?;
        cur.expect(NET_END, "link terminator")?;
        links.push(RawLink { rowid, dest, cost });
    }
    cur.expect(NET_END, "node terminator")?;
    Ok(RawNode {
        index,
        id,
        coord,
        links,
    })
}

/// Encodes header and block blobs for a network.
///
/// The loader only ever reads; writing exists for the tooling that builds
/// networks and for test fixtures.
pub struct NetworkBlobWriter {
    header: NetworkHeader,
}

impl NetworkBlobWriter {
    pub fn new(header: NetworkHeader) -> Self {
        Self { header }
    }

    pub fn header(&self) -> &NetworkHeader {
        &self.header
    }

    pub fn encode_header(&self) -> Vec<u8> {
        let h = &self.header;
        let mut out = Vec::new();
        out.push(h.format.signature());
        out.push(NET_HEADER);
        out.extend_from_slice(&h.node_count.to_le_bytes());
        out.push(match h.identity {
            IdentityMode::Code => NET_CODES,
            IdentityMode::Id => NET_IDS,
        });
        out.push(h.max_code_length);
        push_string(&mut out, NET_TABLE, &h.table);
        push_string(&mut out, NET_FROM_COLUMN, &h.from_column);
        push_string(&mut out, NET_TO_COLUMN, &h.to_column);
        push_string(&mut out, NET_GEOMETRY_COLUMN, h.geometry_column.as_deref().unwrap_or(""));
        if h.format.has_name_column() {
            push_string(&mut out, NET_NAME_COLUMN, h.name_column.as_deref().unwrap_or(""));
        }
        if h.format.has_coords() {
            out.push(NET_ASTAR_COEFF);
            out.extend_from_slice(&h.astar_coeff.unwrap_or(1.0).to_le_bytes());
        }
        out.push(NET_END_HEADER);
        out
    }

    pub fn encode_block(&self, nodes: &[RawNode]) -> Vec<u8> {
        let h = &self.header;
        let mut out = Vec::new();
        out.push(NET_BLOCK);
        out.extend_from_slice(&(nodes.len() as u16).to_le_bytes());
        for node in nodes {
            out.push(NET_NODE);
            out.extend_from_slice(&node.index.to_le_bytes());
            match &node.id {
                RawNodeId::Code(code) => {
                    let mut fixed = vec![0u8; h.max_code_length as usize];
                    let bytes = code.as_bytes();
                    let n = bytes.len().min(fixed.len());
                    fixed[..n].copy_from_slice(&bytes[..n]);
                    out.extend_from_slice(&fixed);
                }
                RawNodeId::Id(id) => {
                    if h.format.wide_ids() {
                        out.extend_from_slice(&id.to_le_bytes());
                    } else {
                        out.extend_from_slice(&(*id as i32).to_le_bytes());
                    }
                }
            }
            if h.format.has_coords() {
                let (x, y) = node.coord.unwrap_or((0.0, 0.0));
                out.extend_from_slice(&x.to_le_bytes());
                out.extend_from_slice(&y.to_le_bytes());
            }
            out.extend_from_slice(&(node.links.len() as u16).to_le_bytes());
            for link in &node.links {
                out.push(NET_LINK);
                if h.format.wide_ids() {
                    out.extend_from_slice(&link.rowid.to_le_bytes());
                } else {
                    out.extend_from_slice(&(link.rowid as i32).to_le_bytes());
                }
                out.extend_from_slice(&link.dest.to_le_bytes());
                out.extend_from_slice(&link.cost.to_le_bytes());
                out.push(NET_END);
            }
            out.push(NET_END);
        }
        out
    }
}

fn push_string(out: &mut Vec<u8>, tag: u8, s: &str) {
    out.push(tag);
    out.extend_from_slice(&(s.len() as u16).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
}
