//! Error types for CAR streams.

/// Errors that can occur while reading or writing CAR streams.
#[derive(Debug, thiserror::Error)]
pub enum CarError {
    /// An I/O error on the underlying stream.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream is not a well-formed CAR v1 file.
    #[error("corrupt car: {0}")]
    Corrupt(String),

    /// A block uses a multihash this implementation cannot verify.
    #[error("unsupported multihash code {0:#x}")]
    UnsupportedHash(u64),

    /// A block's bytes do not hash to its CID.
    #[error("block digest mismatch for {0}")]
    DigestMismatch(cid::Cid),

    /// Block store access failed.
    #[error("store error: {0}")]
    Store(#[from] carpack_store::StoreError),

    /// A traversed block is not valid dag-pb.
    #[error("codec error: {0}")]
    Unixfs(#[from] carpack_unixfs::UnixfsError),

    /// CID parsing failed.
    #[error("cid error: {0}")]
    Cid(#[from] cid::Error),
}
