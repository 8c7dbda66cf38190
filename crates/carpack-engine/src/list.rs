//! Read-side inspection of CAR files.

use std::path::Path;

use carpack_car::CarReader;
use carpack_store::BlockStore;
use carpack_unixfs::{PbNode, UnixfsData};
use cid::Cid;

use crate::error::EngineError;
use crate::extract::import_single_root;

/// One named file inside a CAR archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarFileInfo {
    /// Slash-joined path of the entry from the archive root.
    pub path: String,
    /// CID of the file node.
    pub cid: Cid,
    /// UnixFS file size in bytes.
    pub size: u64,
}

/// Parse only the CAR header and return its first root.
pub async fn get_car_root(car_path: &Path) -> Result<Cid, EngineError> {
    let file = tokio::fs::File::open(car_path).await?;
    let reader = CarReader::new(file).await?;
    Ok(reader.roots()[0])
}

/// Iterate a CAR and emit one record per named file entry, in
/// depth-first link order.
pub async fn list_car_file(car_path: &Path) -> Result<Vec<CarFileInfo>, EngineError> {
    let (store, root) = import_single_root(car_path).await?;

    let mut out = Vec::new();
    // Stack of (path prefix, name, cid); popped left-to-right.
    let mut stack: Vec<(String, String, Cid)> = vec![(String::new(), String::new(), root)];
    while let Some((prefix, name, cid)) = stack.pop() {
        let bytes = store.require(&cid).await?;
        let node = PbNode::decode(&bytes)
            .map_err(|e| EngineError::Corrupt(format!("node {cid}: {e}")))?;
        let fs_data = UnixfsData::decode(&node.data)
            .map_err(|e| EngineError::Corrupt(format!("node {cid}: {e}")))?;

        let path = join_path(&prefix, &name);
        if fs_data.is_dir() {
            for link in node.links.into_iter().rev() {
                stack.push((path.clone(), link.name, link.cid));
            }
        } else if !name.is_empty() {
            out.push(CarFileInfo {
                path,
                cid,
                size: fs_data.file_size(),
            });
        }
    }
    Ok(out)
}

fn join_path(prefix: &str, name: &str) -> String {
    match (prefix.is_empty(), name.is_empty()) {
        (_, true) => prefix.to_string(),
        (true, false) => name.to_string(),
        (false, false) => format!("{prefix}/{name}"),
    }
}
