//! Core trait for block storage.

use bytes::Bytes;
use cid::Cid;

use crate::error::StoreError;

/// Trait for storing and retrieving content-addressed blocks.
///
/// All implementations must be `Send + Sync`: leaf builders insert blocks
/// concurrently during a build. Data is passed as [`Bytes`] so blocks flow
/// to the CAR writer without copies.
///
/// Insertion is idempotent on equal CID — a block's bytes are fixed by its
/// CID, so re-inserting is a no-op.
#[async_trait::async_trait]
pub trait BlockStore: Send + Sync {
    /// Store a block under its CID.
    async fn put(&self, cid: Cid, data: Bytes) -> Result<(), StoreError>;

    /// Retrieve a block by CID. Returns `None` if not present.
    async fn get(&self, cid: &Cid) -> Result<Option<Bytes>, StoreError>;

    /// Retrieve a block that must exist (traversal path).
    ///
    /// Returns [`StoreError::NotFound`] instead of `None` when absent.
    async fn require(&self, cid: &Cid) -> Result<Bytes, StoreError> {
        self.get(cid).await?.ok_or(StoreError::NotFound(*cid))
    }

    /// Check whether a block is present.
    async fn has(&self, cid: &Cid) -> Result<bool, StoreError>;

    /// Number of blocks currently stored.
    async fn block_count(&self) -> Result<usize, StoreError>;

    /// Total payload bytes currently stored.
    async fn total_bytes(&self) -> Result<u64, StoreError>;
}
