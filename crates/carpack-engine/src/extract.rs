//! CAR extraction back to the filesystem.
//!
//! Extraction refuses to overwrite anything: every target path must be
//! absent (checked without following symlinks), leaf files are created
//! with `O_EXCL` and, on Unix, `O_NOFOLLOW`. Entry names that cannot be
//! materialized safely (`""`, `"."`, `".."`, embedded `/` or NUL) abort
//! the extraction.

use std::path::{Path, PathBuf};

use carpack_car::load_car;
use carpack_store::{BlockStore, MemoryBlockStore};
use carpack_unixfs::{PbNode, UnixfsData};
use cid::Cid;
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::EngineError;

/// Extract every file and directory of a CAR into `output_dir`.
///
/// The CAR's root directory entries land directly inside `output_dir`,
/// which is created if missing.
pub async fn car_to_files(car_path: &Path, output_dir: &Path) -> Result<(), EngineError> {
    let (store, root) = import_single_root(car_path).await?;
    tokio::fs::create_dir_all(output_dir).await?;
    export_children(&store, &root, output_dir, None).await?;
    info!(car = %car_path.display(), out = %output_dir.display(), "car extracted");
    Ok(())
}

/// Extract only the files whose entry name equals `target_name`.
///
/// The directory structure above matching files is still materialized.
pub async fn extract_file_from_car(
    car_path: &Path,
    output_dir: &Path,
    target_name: &str,
) -> Result<(), EngineError> {
    let (store, root) = import_single_root(car_path).await?;
    tokio::fs::create_dir_all(output_dir).await?;
    export_children(&store, &root, output_dir, Some(target_name)).await?;
    info!(car = %car_path.display(), target = target_name, "file extracted from car");
    Ok(())
}

/// Import a CAR into a fresh store, rejecting anything but exactly one
/// root.
pub(crate) async fn import_single_root(
    car_path: &Path,
) -> Result<(MemoryBlockStore, Cid), EngineError> {
    let file = tokio::fs::File::open(car_path).await?;
    let store = MemoryBlockStore::new();
    let roots = load_car(&store, file).await?;
    if roots.len() != 1 {
        return Err(EngineError::Unsupported(format!(
            "cannot import car with {} roots",
            roots.len()
        )));
    }
    Ok((store, roots[0]))
}

/// Export every entry of the directory node `dir_cid` into `dir`.
async fn export_children<S: BlockStore + ?Sized>(
    store: &S,
    dir_cid: &Cid,
    dir: &Path,
    filter: Option<&str>,
) -> Result<(), EngineError> {
    let (node, fs_data) = decode_node(store, dir_cid).await?;
    if !fs_data.is_dir() {
        return Err(EngineError::Unsupported(
            "car root is not a unixfs directory".into(),
        ));
    }
    for link in &node.links {
        validate_entry_name(&link.name)?;
        export_node(store, link.cid, dir.join(&link.name), &link.name, filter).await?;
    }
    Ok(())
}

fn export_node<'a, S: BlockStore + ?Sized>(
    store: &'a S,
    cid: Cid,
    target: PathBuf,
    name: &'a str,
    filter: Option<&'a str>,
) -> BoxFuture<'a, Result<(), EngineError>> {
    async move {
        let (node, fs_data) = decode_node(store, &cid).await?;
        if fs_data.is_dir() {
            ensure_absent(&target).await?;
            tokio::fs::create_dir(&target).await?;
            for link in &node.links {
                validate_entry_name(&link.name)?;
                export_node(store, link.cid, target.join(&link.name), &link.name, filter).await?;
            }
            return Ok(());
        }

        if filter.is_some_and(|t| t != name) {
            return Ok(());
        }
        ensure_absent(&target).await?;
        let mut file = create_new_file(&target).await?;
        write_file_contents(store, &cid, &mut file).await?;
        file.flush().await?;
        debug!(path = %target.display(), "file written");
        Ok(())
    }
    .boxed()
}

/// Stream a file DAG's leaf data, in order, into `file`.
///
/// No visited set: repeated identical chunks must be written once per
/// occurrence.
async fn write_file_contents<S: BlockStore + ?Sized>(
    store: &S,
    cid: &Cid,
    file: &mut tokio::fs::File,
) -> Result<(), EngineError> {
    let mut stack = vec![*cid];
    while let Some(current) = stack.pop() {
        let (node, fs_data) = decode_node(store, &current).await?;
        if node.links.is_empty() {
            file.write_all(&fs_data.data).await?;
        } else {
            for link in node.links.iter().rev() {
                stack.push(link.cid);
            }
        }
    }
    Ok(())
}

fn validate_entry_name(name: &str) -> Result<(), EngineError> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') || name.contains('\0') {
        return Err(EngineError::InvalidEntryName(name.to_string()));
    }
    Ok(())
}

/// Fail with [`EngineError::PathExists`] when `path` already exists,
/// without following a symlink at `path`.
async fn ensure_absent(path: &Path) -> Result<(), EngineError> {
    match tokio::fs::symlink_metadata(path).await {
        Ok(_) => Err(EngineError::PathExists(path.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Create a leaf file that must not exist yet, refusing to follow a
/// symlink left at the target path.
async fn create_new_file(path: &Path) -> Result<tokio::fs::File, EngineError> {
    let mut opts = tokio::fs::OpenOptions::new();
    opts.write(true).create_new(true);
    #[cfg(unix)]
    opts.custom_flags(libc::O_NOFOLLOW);
    match opts.open(path).await {
        Ok(file) => Ok(file),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            Err(EngineError::PathExists(path.to_path_buf()))
        }
        Err(e) => Err(e.into()),
    }
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

// ---------------------------------------------------------------------------
// Merging sliced pieces
// ---------------------------------------------------------------------------

/// Suffix of the first piece of a sliced file.
const FIRST_PIECE_SUFFIX: &str = ".00000000";

/// Recombine `<base>.00000000`, `<base>.00000001`, … pieces under `dir`
/// back into `<base>`, deleting the pieces. Concatenation runs in
/// ascending index order and stops at the first missing index. Returns
/// the number of files reassembled.
pub async fn merge_sliced_files(dir: &Path) -> Result<usize, EngineError> {
    let root = dir.to_path_buf();
    let bases = tokio::task::spawn_blocking(move || find_merge_bases(&root))
        .await
        .map_err(|e| EngineError::Worker(e.to_string()))??;
    for base in &bases {
        merge_one(base).await?;
    }
    Ok(bases.len())
}

fn find_merge_bases(dir: &Path) -> Result<Vec<PathBuf>, EngineError> {
    let mut bases = Vec::new();
    let mut entries: Vec<_> = std::fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(|e| e.file_name());
    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            bases.extend(find_merge_bases(&path)?);
        } else if file_type.is_file()
            && let Some(name) = path.file_name().and_then(|n| n.to_str())
            && let Some(stem) = name.strip_suffix(FIRST_PIECE_SUFFIX)
            && !stem.is_empty()
        {
            bases.push(path.with_file_name(stem));
        }
    }
    Ok(bases)
}

async fn merge_one(base: &Path) -> Result<(), EngineError> {
    let mut out = tokio::fs::File::create(base).await?;
    let mut index = 0u32;
    loop {
        let piece = piece_path(base, index);
        let mut piece_file = match tokio::fs::File::open(&piece).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => break,
            Err(e) => return Err(e.into()),
        };
        tokio::io::copy(&mut piece_file, &mut out).await?;
        tokio::fs::remove_file(&piece).await?;
        index += 1;
    }
    out.flush().await?;
    info!(target = %base.display(), pieces = index, "sliced file merged");
    Ok(())
}

fn piece_path(base: &Path, index: u32) -> PathBuf {
    let mut name = base.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".{index:08}"));
    base.with_file_name(name)
}
