//! Error types for the generation pipeline.

use std::path::PathBuf;

/// Errors that can occur during CAR generation and extraction.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Bad configuration, rejected before any I/O.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An I/O error on input files, CAR output, or the manifest.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Block store access failed.
    #[error("store error: {0}")]
    Store(#[from] carpack_store::StoreError),

    /// Codec or DAG construction failed.
    #[error("unixfs error: {0}")]
    Unixfs(#[from] carpack_unixfs::UnixfsError),

    /// CAR stream reading or writing failed.
    #[error("car error: {0}")]
    Car(#[from] carpack_car::CarError),

    /// A DAG node could not be decoded during traversal.
    #[error("corrupt dag: {0}")]
    Corrupt(String),

    /// The input CAR uses a feature this pipeline does not handle.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Extraction refuses to overwrite an existing path.
    #[error("path already exists and overwriting is not allowed: {0}")]
    PathExists(PathBuf),

    /// A directory entry name is unsafe to materialize on a filesystem.
    #[error("invalid directory entry name: {0:?}")]
    InvalidEntryName(String),

    /// The operation was cancelled.
    #[error("operation cancelled")]
    Cancelled,

    /// A leaf-build worker panicked.
    #[error("worker failed: {0}")]
    Worker(String),
}
