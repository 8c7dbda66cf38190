//! Error types for block storage.

use cid::Cid;

/// Errors that can occur during block store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A block required by a traversal is missing from the store.
    #[error("block not found: {0}")]
    NotFound(Cid),

    /// An I/O error occurred in a persistent backend.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
