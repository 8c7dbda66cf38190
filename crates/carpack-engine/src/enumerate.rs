//! File enumeration: walking input paths into [`FileRef`] sequences.

use std::path::{Path, PathBuf};

use carpack_types::FileRef;
use tracing::debug;

use crate::error::EngineError;

/// Enumerate input paths into file descriptors.
///
/// Directories are walked recursively; regular files are yielded in stable
/// lexicographic order within each directory. With `attach_uuid` set every
/// descriptor gets a fresh UUID tag folded into its display name.
pub async fn enumerate_paths(
    paths: &[PathBuf],
    attach_uuid: bool,
) -> Result<Vec<FileRef>, EngineError> {
    let paths = paths.to_vec();
    tokio::task::spawn_blocking(move || walk(&paths, attach_uuid))
        .await
        .map_err(|e| EngineError::Worker(e.to_string()))?
}

/// Enumerate flat files with a caller-supplied UUID per path.
///
/// `uuids` must align 1:1 with `files`, and every path must be a regular
/// file — directory inputs cannot be paired with a flat UUID array.
pub async fn enumerate_files_with_uuids(
    files: &[PathBuf],
    uuids: &[String],
) -> Result<Vec<FileRef>, EngineError> {
    if files.len() != uuids.len() {
        return Err(EngineError::InvalidArgument(format!(
            "uuid count {} does not match file count {}",
            uuids.len(),
            files.len()
        )));
    }
    let mut refs = Vec::with_capacity(files.len());
    for (path, uuid) in files.iter().zip(uuids) {
        let meta = tokio::fs::metadata(path).await?;
        if !meta.is_file() {
            return Err(EngineError::InvalidArgument(format!(
                "not a regular file: {}",
                path.display()
            )));
        }
        refs.push(FileRef::with_uuid(path, meta.len(), uuid.clone()));
    }
    Ok(refs)
}

fn walk(paths: &[PathBuf], attach_uuid: bool) -> Result<Vec<FileRef>, EngineError> {
    let mut out = Vec::new();
    for path in paths {
        let meta = std::fs::metadata(path)?;
        if meta.is_dir() {
            walk_dir(path, attach_uuid, &mut out)?;
        } else if meta.is_file() {
            out.push(make_ref(path, meta.len(), attach_uuid));
        } else {
            debug!(path = %path.display(), "skipping non-regular input");
        }
    }
    Ok(out)
}

fn walk_dir(dir: &Path, attach_uuid: bool, out: &mut Vec<FileRef>) -> Result<(), EngineError> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(|e| e.file_name());
    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            walk_dir(&path, attach_uuid, out)?;
        } else if file_type.is_file() {
            let meta = entry.metadata()?;
            out.push(make_ref(&path, meta.len(), attach_uuid));
        } else {
            debug!(path = %path.display(), "skipping non-regular entry");
        }
    }
    Ok(())
}

fn make_ref(path: &Path, size: u64, attach_uuid: bool) -> FileRef {
    if attach_uuid {
        FileRef::with_uuid(path, size, uuid::Uuid::new_v4().to_string())
    } else {
        FileRef::new(path, size)
    }
}
