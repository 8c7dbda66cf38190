//! In-memory block store.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use cid::Cid;
use tracing::trace;

use crate::error::StoreError;
use crate::traits::BlockStore;

/// In-memory block store backed by a `RwLock<HashMap>`.
///
/// Scoped to a single CAR build: it holds every block of one graph slice
/// and is dropped once the CAR stream has been flushed. Used bytes are
/// maintained incrementally via an atomic counter.
#[derive(Default, Debug)]
pub struct MemoryBlockStore {
    blocks: RwLock<HashMap<Cid, Bytes>>,
    used_bytes: AtomicU64,
}

impl MemoryBlockStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl BlockStore for MemoryBlockStore {
    async fn put(&self, cid: Cid, data: Bytes) -> Result<(), StoreError> {
        let mut map = self.blocks.write().expect("lock poisoned");
        // Idempotent on equal CID: the bytes are fixed by the hash.
        if map.contains_key(&cid) {
            trace!(%cid, "block already present, skipping");
            return Ok(());
        }
        self.used_bytes
            .fetch_add(data.len() as u64, Ordering::Relaxed);
        trace!(%cid, size = data.len(), "storing block");
        map.insert(cid, data);
        Ok(())
    }

    async fn get(&self, cid: &Cid) -> Result<Option<Bytes>, StoreError> {
        let map = self.blocks.read().expect("lock poisoned");
        Ok(map.get(cid).cloned())
    }

    async fn has(&self, cid: &Cid) -> Result<bool, StoreError> {
        let map = self.blocks.read().expect("lock poisoned");
        Ok(map.contains_key(cid))
    }

    async fn block_count(&self) -> Result<usize, StoreError> {
        let map = self.blocks.read().expect("lock poisoned");
        Ok(map.len())
    }

    async fn total_bytes(&self) -> Result<u64, StoreError> {
        Ok(self.used_bytes.load(Ordering::Relaxed))
    }
}
