//! Balanced file-DAG construction.
//!
//! Leaves hold one chunk each; parent nodes reference up to
//! [`MAX_LINKS`](carpack_types::MAX_LINKS) consecutive children, built
//! level by level until a single root remains. A single-chunk file's leaf
//! is its own root.

use carpack_store::BlockStore;
use carpack_types::{CHUNK_SIZE, MAX_LINKS};
use cid::Cid;
use tokio::io::AsyncRead;

use crate::chunker::Chunker;
use crate::dagpb::{PbLink, PbNode};
use crate::error::UnixfsError;
use crate::unixfs::UnixfsData;

/// Handle to a finished file DAG root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileDagRoot {
    /// CID of the root block.
    pub cid: Cid,
    /// Cumulative encoded size of the whole DAG (link Tsize semantics).
    pub tsize: u64,
    /// Number of file payload bytes the DAG covers.
    pub filesize: u64,
}

/// Builds balanced UnixFS file DAGs into a shared block store.
pub struct FileDagBuilder<'a, S: BlockStore + ?Sized> {
    store: &'a S,
    chunker: Chunker,
    max_links: usize,
}

impl<'a, S: BlockStore + ?Sized> FileDagBuilder<'a, S> {
    /// Builder with the interface constants: 1 MiB chunks, 1024 links.
    pub fn new(store: &'a S) -> Self {
        Self::with_layout(store, CHUNK_SIZE as usize, MAX_LINKS)
    }

    /// Builder with an explicit layout, for tests that want small DAGs.
    pub fn with_layout(store: &'a S, chunk_size: usize, max_links: usize) -> Self {
        Self {
            store,
            chunker: Chunker::new(chunk_size),
            max_links,
        }
    }

    /// Chunk `reader` to exhaustion and build the balanced DAG.
    ///
    /// Every produced block is inserted into the store. An empty input
    /// yields the canonical empty-file leaf.
    pub async fn build(
        &self,
        mut reader: impl AsyncRead + Unpin,
    ) -> Result<FileDagRoot, UnixfsError> {
        let mut level = Vec::new();
        while let Some(chunk) = self.chunker.next_chunk(&mut reader).await? {
            level.push(self.put_leaf(chunk).await?);
        }
        if level.is_empty() {
            level.push(self.put_leaf(Vec::new()).await?);
        }

        while level.len() > 1 {
            let mut next = Vec::with_capacity(level.len().div_ceil(self.max_links));
            for group in level.chunks(self.max_links) {
                next.push(self.put_parent(group).await?);
            }
            level = next;
        }

        // The level always holds exactly one node here.
        Ok(level[0])
    }

    /// Encode one chunk as a file leaf and store it.
    async fn put_leaf(&self, chunk: Vec<u8>) -> Result<FileDagRoot, UnixfsError> {
        let filesize = chunk.len() as u64;
        let node = PbNode {
            links: Vec::new(),
            data: UnixfsData::file_leaf(chunk).encode(),
        };
        let block = node.into_block()?;
        let root = FileDagRoot {
            cid: block.cid,
            tsize: block.data.len() as u64,
            filesize,
        };
        self.store.put(block.cid, block.data).await?;
        Ok(root)
    }

    /// Link a run of children under a new file parent node and store it.
    async fn put_parent(&self, children: &[FileDagRoot]) -> Result<FileDagRoot, UnixfsError> {
        let links = children
            .iter()
            .map(|c| PbLink {
                cid: c.cid,
                name: String::new(),
                tsize: c.tsize,
            })
            .collect();
        let blocksizes = children.iter().map(|c| c.filesize).collect();
        let node = PbNode {
            links,
            data: UnixfsData::file_parent(blocksizes).encode(),
        };
        let block = node.into_block()?;
        let root = FileDagRoot {
            cid: block.cid,
            tsize: block.data.len() as u64 + children.iter().map(|c| c.tsize).sum::<u64>(),
            filesize: children.iter().map(|c| c.filesize).sum(),
        };
        self.store.put(block.cid, block.data).await?;
        Ok(root)
    }
}
