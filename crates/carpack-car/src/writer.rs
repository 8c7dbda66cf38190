//! Deterministic CAR v1 writing.
//!
//! The writer walks the DAG depth-first from the root, left to right in
//! link order, emitting each block the first time it is visited. The
//! stream order therefore depends only on the finished DAG, never on how
//! it was built.

use std::collections::HashSet;

use bytes::{Bytes, BytesMut};
use carpack_store::BlockStore;
use carpack_unixfs::PbNode;
use cid::Cid;
use futures::SinkExt;
use tokio::io::AsyncWrite;
use tokio_util::codec::FramedWrite;
use tracing::debug;

use crate::error::CarError;
use crate::header::CarHeader;

type VarintFrameCodec = unsigned_varint::codec::UviBytes<Bytes>;

/// Write a single-root CAR v1 stream for the DAG rooted at `root`.
///
/// Every reachable block must be present in `store`; all blocks are
/// expected to be dag-pb (their links drive the traversal). Returns the
/// number of blocks written.
pub async fn write_car<S, W>(store: &S, root: Cid, out: W) -> Result<usize, CarError>
where
    S: BlockStore + ?Sized,
    W: AsyncWrite + Unpin,
{
    let mut frames = FramedWrite::new(out, VarintFrameCodec::default());

    let header = CarHeader::single_root(root).encode()?;
    frames.send(Bytes::from(header)).await?;

    let mut visited: HashSet<Cid> = HashSet::new();
    let mut stack = vec![root];
    let mut blocks = 0usize;

    while let Some(cid) = stack.pop() {
        if !visited.insert(cid) {
            continue;
        }
        let data = store.require(&cid).await?;
        let node = PbNode::decode(&data)?;
        // Push right-to-left so the leftmost link is visited first.
        for link in node.links.iter().rev() {
            if !visited.contains(&link.cid) {
                stack.push(link.cid);
            }
        }

        let cid_bytes = cid.to_bytes();
        let mut frame = BytesMut::with_capacity(cid_bytes.len() + data.len());
        frame.extend_from_slice(&cid_bytes);
        frame.extend_from_slice(&data);
        frames.send(frame.freeze()).await?;
        blocks += 1;
    }

    debug!(%root, blocks, "car stream written");
    Ok(blocks)
}
