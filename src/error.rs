//! Error types for network blob decoding and backing-store access.

use thiserror::Error;

/// Failures raised while decoding a binary network blob.
///
/// Any of these aborts graph construction: a half-loaded network is never
/// exposed to the query layer.
#[derive(Debug, Error)]
pub enum NetworkFormatError {
    #[error("network blob truncated at offset {offset}: {needed} more bytes required")]
    Truncated { offset: usize, needed: usize },

    #[error("unknown network format signature 0x{0:02x}")]
    UnknownFormat(u8),

    #[error("bad {what} signature 0x{found:02x} at offset {offset}")]
    BadSignature {
        what: &'static str,
        found: u8,
        offset: usize,
    },

    #[error("invalid utf-8 in {what}")]
    InvalidText { what: &'static str },

    #[error("node index {index} out of range (declared node count {count})")]
    NodeIndexOutOfRange { index: u32, count: u32 },

    #[error("duplicate node index {0}")]
    DuplicateNode(u32),

    #[error("header declares {declared} nodes but the blocks define {loaded}")]
    NodeCountMismatch { declared: u32, loaded: u32 },

    #[error("trailing garbage: {0} undecoded bytes after the last block element")]
    TrailingBytes(usize),
}

/// Failures raised by a [`NetworkStore`](crate::store::NetworkStore)
/// implementation.
///
/// The solution builder treats these as "no auxiliary data": costs and link
/// lists survive, geometries and names are dropped.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backing store failure: {0}")]
    Backend(String),
}
