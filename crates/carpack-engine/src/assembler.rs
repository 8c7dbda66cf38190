//! DAG assembly for one graph slice.
//!
//! File DAGs are built in parallel on a bounded worker pool, then the
//! directory tree mirroring the input paths is materialized sequentially
//! in an arena and frozen into the block store. The resulting root CID
//! depends only on input order, never on worker timing.

use std::collections::HashMap;
use std::io::SeekFrom;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

use carpack_store::{BlockStore, MemoryBlockStore};
use carpack_types::FileRef;
use carpack_unixfs::{FileDagBuilder, FileDagRoot, PbLink, PbNode, UnixfsData};
use cid::Cid;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::EngineError;

/// A finished slice DAG: the root directory CID and the store holding
/// every block of the slice.
#[derive(Debug)]
pub struct SliceDag {
    /// CID of the root directory node.
    pub root: Cid,
    /// Ephemeral store scoped to this slice.
    pub store: Arc<MemoryBlockStore>,
}

/// Builds the UnixFS DAG for one slice of files.
#[derive(Debug)]
pub struct DagAssembler {
    parent_path: PathBuf,
    parallel: usize,
    cancel: CancellationToken,
}

impl DagAssembler {
    /// Create an assembler.
    ///
    /// `parent_path` is the prefix stripped from each file's directory to
    /// derive its position in the tree. `parallel` bounds the leaf-build
    /// worker pool and is clamped to the logical CPU count.
    pub fn new(
        parent_path: impl Into<PathBuf>,
        parallel: usize,
        cancel: CancellationToken,
    ) -> Result<Self, EngineError> {
        if parallel == 0 {
            return Err(EngineError::InvalidArgument(
                "parallel must be greater than 0".into(),
            ));
        }
        Ok(Self {
            parent_path: parent_path.into(),
            parallel,
            cancel,
        })
    }

    /// Build the complete DAG for `files` into a fresh block store.
    pub async fn build_slice(&self, files: &[FileRef]) -> Result<SliceDag, EngineError> {
        let store = Arc::new(MemoryBlockStore::new());
        let file_dags = self.build_file_dags(files, &store).await?;

        let mut arena = DirArena::new();
        for (file, dag) in files.iter().zip(&file_dags) {
            let dirs = relative_dirs(&file.path, &self.parent_path);
            arena.place_file(&dirs, file.display_name.clone(), dag)?;
        }
        let root = arena.freeze(store.as_ref()).await?;
        Ok(SliceDag { root, store })
    }

    /// Build every file DAG on a bounded worker pool.
    ///
    /// Failures do not abort in-flight workers; the first error is
    /// returned once all tasks have finished.
    async fn build_file_dags(
        &self,
        files: &[FileRef],
        store: &Arc<MemoryBlockStore>,
    ) -> Result<Vec<FileDagRoot>, EngineError> {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let semaphore = Arc::new(Semaphore::new(self.parallel.min(cpus)));
        let results: Arc<Mutex<Vec<Option<FileDagRoot>>>> =
            Arc::new(Mutex::new(vec![None; files.len()]));

        let mut tasks = JoinSet::new();
        for (i, file) in files.iter().enumerate() {
            let file = file.clone();
            let store = store.clone();
            let semaphore = semaphore.clone();
            let results = results.clone();
            let cancel = self.cancel.clone();
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| EngineError::Worker(e.to_string()))?;
                if cancel.is_cancelled() {
                    return Err(EngineError::Cancelled);
                }
                let dag = build_file_node(&file, store.as_ref()).await?;
                info!(
                    path = %file.path.display(),
                    cid = %dag.cid,
                    uuid = file.uuid.as_deref().unwrap_or(""),
                    size = dag.tsize,
                    "file dag built"
                );
                results.lock().expect("lock poisoned")[i] = Some(dag);
                Ok(())
            });
        }

        let mut first_err: Option<EngineError> = None;
        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(join_err) => Err(EngineError::Worker(join_err.to_string())),
            };
            if let Err(e) = outcome
                && first_err.is_none()
            {
                first_err = Some(e);
            }
        }
        if let Some(e) = first_err {
            return Err(e);
        }

        let results = results.lock().expect("lock poisoned");
        results
            .iter()
            .map(|r| (*r).ok_or_else(|| EngineError::Worker("missing file dag".into())))
            .collect()
    }
}

/// Build one file's balanced DAG, honoring its byte window.
async fn build_file_node(
    file: &FileRef,
    store: &MemoryBlockStore,
) -> Result<FileDagRoot, EngineError> {
    let mut f = tokio::fs::File::open(&file.path).await?;
    let builder = FileDagBuilder::new(store);
    let dag = match file.window {
        Some(window) => {
            f.seek(SeekFrom::Start(window.start)).await?;
            builder.build(f.take(window.len())).await?
        }
        None => builder.build(f).await?,
    };
    Ok(dag)
}

/// Directory names between `parent` and the file at `path`, outermost
/// first. Empty when the file sits directly under `parent`, or when the
/// parent path is the file itself (single-file input).
fn relative_dirs(path: &Path, parent: &Path) -> Vec<String> {
    if path.components().eq(parent.components()) {
        return Vec::new();
    }
    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let stripped = dir.strip_prefix(parent).unwrap_or(dir);
    stripped
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Directory arena
// ---------------------------------------------------------------------------

/// Reference from a directory entry to its child.
enum ChildRef {
    File { cid: Cid, tsize: u64 },
    Dir(usize),
}

/// One mutable directory under construction.
#[derive(Default)]
struct DirNode {
    /// Entries in first-addition order.
    entries: Vec<(String, ChildRef)>,
    /// Entry name → position, for collision checks.
    names: HashMap<String, usize>,
}

/// Arena of directory records addressed by index, with a dotted-prefix
/// map for lookup. Re-linking an existing directory is a no-op on entry
/// order: the entry holds the arena index, not a frozen link.
struct DirArena {
    nodes: Vec<DirNode>,
    index: HashMap<String, usize>,
}

/// Arena slot of the virtual root.
const ROOT: usize = 0;

impl DirArena {
    fn new() -> Self {
        Self {
            nodes: vec![DirNode::default()],
            index: HashMap::new(),
        }
    }

    /// Place one file under the directory chain `dirs`, creating missing
    /// directories on the way down.
    fn place_file(
        &mut self,
        dirs: &[String],
        name: String,
        dag: &FileDagRoot,
    ) -> Result<(), EngineError> {
        let mut parent = ROOT;
        let mut key = String::new();
        for dir in dirs {
            if !key.is_empty() {
                key.push('.');
            }
            key.push_str(dir);
            parent = self.dir_at(parent, dir, &key)?;
        }

        let node = &mut self.nodes[parent];
        if node.names.contains_key(&name) {
            return Err(EngineError::InvalidArgument(format!(
                "duplicate entry name {name:?} in one directory"
            )));
        }
        node.names.insert(name.clone(), node.entries.len());
        node.entries.push((
            name,
            ChildRef::File {
                cid: dag.cid,
                tsize: dag.tsize,
            },
        ));
        Ok(())
    }

    /// Look up or create the directory at dotted prefix `key`, linking a
    /// new directory into `parent` under `dir_name`.
    fn dir_at(&mut self, parent: usize, dir_name: &str, key: &str) -> Result<usize, EngineError> {
        if let Some(&idx) = self.index.get(key) {
            return Ok(idx);
        }
        let idx = self.nodes.len();
        self.nodes.push(DirNode::default());
        self.index.insert(key.to_string(), idx);

        let pnode = &mut self.nodes[parent];
        if pnode.names.contains_key(dir_name) {
            return Err(EngineError::InvalidArgument(format!(
                "directory name {dir_name:?} collides with an existing entry"
            )));
        }
        pnode.names.insert(dir_name.to_string(), pnode.entries.len());
        pnode
            .entries
            .push((dir_name.to_string(), ChildRef::Dir(idx)));
        Ok(idx)
    }

    /// Encode every directory and insert it into the store. Children are
    /// frozen before their parents; returns the root CID.
    async fn freeze<S: BlockStore + ?Sized>(self, store: &S) -> Result<Cid, EngineError> {
        let mut frozen: Vec<Option<(Cid, u64)>> = vec![None; self.nodes.len()];
        let mut blocks = Vec::with_capacity(self.nodes.len());

        // A child directory always has a higher index than its parent, so
        // reverse index order is a valid bottom-up traversal.
        for idx in (0..self.nodes.len()).rev() {
            let node = &self.nodes[idx];
            let mut links = Vec::with_capacity(node.entries.len());
            for (name, child) in &node.entries {
                let (cid, tsize) = match child {
                    ChildRef::File { cid, tsize } => (*cid, *tsize),
                    ChildRef::Dir(i) => frozen[*i].expect("child frozen before parent"),
                };
                links.push(PbLink {
                    cid,
                    name: name.clone(),
                    tsize,
                });
            }
            let child_tsizes: u64 = links.iter().map(|l| l.tsize).sum();
            let block = PbNode {
                links,
                data: UnixfsData::directory().encode(),
            }
            .into_block()?;
            frozen[idx] = Some((block.cid, block.data.len() as u64 + child_tsizes));
            blocks.push(block);
        }

        for block in blocks {
            store.put(block.cid, block.data).await?;
        }
        Ok(frozen[ROOT].expect("root frozen").0)
    }
}
