//! Binary network blob format.
//!
//! A network is persisted as a sequence of blobs: one HEADER blob describing
//! the backing relation and node identification scheme, followed by any
//! number of NETWORK blocks each carrying a batch of nodes with their
//! outgoing links. Three format variants exist:
//!
//! - `NET_32`: legacy, 32-bit integer node ids and rowids
//! - `NET_64`: 64-bit ids/rowids plus an optional name column
//! - `NET_64_ASTAR`: as `NET_64`, with per-node coordinates and the
//!   pre-computed A* heuristic coefficient
//!
//! All multi-byte fields are little-endian.

mod cursor;
mod network;

pub use cursor::BlobCursor;
pub use network::{
    parse_block, parse_header, IdentityMode, NetworkBlobWriter, NetworkFormat, NetworkHeader,
    RawLink, RawNode, RawNodeId,
};

/// Format signature: legacy 32-bit variant.
pub const NET_START_32: u8 = 0x4e;
/// Format signature: 64-bit variant.
pub const NET_START_64: u8 = 0x4f;
/// Format signature: 64-bit variant with A* support.
pub const NET_START_ASTAR: u8 = 0x50;

pub const NET_HEADER: u8 = 0x3c;
pub const NET_END_HEADER: u8 = 0x3e;

/// Node identity mode: text codes.
pub const NET_CODES: u8 = 0x01;
/// Node identity mode: integer ids.
pub const NET_IDS: u8 = 0x02;

pub const NET_TABLE: u8 = 0x10;
pub const NET_FROM_COLUMN: u8 = 0x11;
pub const NET_TO_COLUMN: u8 = 0x12;
pub const NET_GEOMETRY_COLUMN: u8 = 0x13;
pub const NET_NAME_COLUMN: u8 = 0x14;
pub const NET_ASTAR_COEFF: u8 = 0x15;

pub const NET_BLOCK: u8 = 0x42;
pub const NET_NODE: u8 = 0x4a;
pub const NET_LINK: u8 = 0x4c;
pub const NET_END: u8 = 0x3f;
