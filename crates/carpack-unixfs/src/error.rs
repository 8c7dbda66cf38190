//! Error types for codec and DAG construction.

/// Errors that can occur while encoding, decoding, or building DAGs.
#[derive(Debug, thiserror::Error)]
pub enum UnixfsError {
    /// An I/O error occurred while reading input data.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to store a produced block.
    #[error("store error: {0}")]
    Store(#[from] carpack_store::StoreError),

    /// A block's bytes do not form a valid dag-pb / UnixFS node.
    #[error("decode error: {0}")]
    Decode(String),

    /// CID construction or parsing failed.
    #[error("cid error: {0}")]
    Cid(#[from] cid::Error),

    /// Multihash construction failed.
    #[error("multihash error: {0}")]
    Multihash(#[from] multihash::Error),
}
