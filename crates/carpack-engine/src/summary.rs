//! Logical tree summarization for the manifest `detail` column.

use carpack_store::BlockStore;
use carpack_types::FsEntry;
use carpack_unixfs::{PbNode, UnixfsData};
use cid::Cid;
use futures::FutureExt;
use futures::future::BoxFuture;

use crate::error::EngineError;

/// Walk the DAG from `root` and produce the nested
/// `(Name, Hash, Size, Link)` summary.
///
/// The root entry carries an empty name and the node's own UnixFS size;
/// every child entry carries its link name and the link's cumulative
/// size. Decode failures surface as [`EngineError::Corrupt`] — no
/// manifest row should be produced from a broken DAG.
pub async fn summarize<S: BlockStore + ?Sized>(
    store: &S,
    root: Cid,
) -> Result<FsEntry, EngineError> {
    let fs_data = decode_node(store, &root).await?.1;
    let mut entry = FsEntry {
        name: String::new(),
        hash: root.to_string(),
        size: fs_data.file_size(),
        links: Vec::new(),
    };
    if fs_data.is_dir() {
        entry.links = child_entries(store, &root).await?;
    }
    Ok(entry)
}

fn walk_link<'a, S: BlockStore + ?Sized>(
    store: &'a S,
    name: String,
    cid: Cid,
    size: u64,
) -> BoxFuture<'a, Result<FsEntry, EngineError>> {
    async move {
        let mut entry = FsEntry {
            name,
            hash: cid.to_string(),
            size,
            links: Vec::new(),
        };
        let (_, fs_data) = decode_node(store, &cid).await?;
        if fs_data.is_dir() {
            entry.links = child_entries(store, &cid).await?;
        }
        Ok(entry)
    }
    .boxed()
}

async fn child_entries<S: BlockStore + ?Sized>(
    store: &S,
    cid: &Cid,
) -> Result<Vec<FsEntry>, EngineError> {
    let (node, _) = decode_node(store, cid).await?;
    let mut entries = Vec::with_capacity(node.links.len());
    for link in node.links {
        entries.push(walk_link(store, link.name, link.cid, link.tsize).await?);
    }
    Ok(entries)
}

async fn decode_node<S: BlockStore + ?Sized>(
    store: &S,
    cid: &Cid,
) -> Result<(PbNode, UnixfsData), EngineError> {
    let bytes = store.require(cid).await?;
    let node =
        PbNode::decode(&bytes).map_err(|e| EngineError::Corrupt(format!("node {cid}: {e}")))?;
    let fs_data = UnixfsData::decode(&node.data)
        .map_err(|e| EngineError::Corrupt(format!("node {cid}: {e}")))?;
    Ok((node, fs_data))
}
