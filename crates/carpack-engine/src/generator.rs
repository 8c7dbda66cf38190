//! [`CarGenerator`] — the orchestrator tying the pipeline together.
//!
//! A generator owns the output directory, build options, and cancellation
//! token, and drives enumerate → plan → assemble → write → record for
//! every slice.

use std::path::{Path, PathBuf};

use carpack_types::{BuildOptions, FileRef};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::assembler::{DagAssembler, SliceDag};
use crate::enumerate::{enumerate_files_with_uuids, enumerate_paths};
use crate::error::EngineError;
use crate::manifest;
use crate::planner::plan_slices;
use crate::summary::summarize;

/// Orchestrates CAR generation into one output directory.
pub struct CarGenerator {
    output_dir: PathBuf,
    options: BuildOptions,
    cancel: CancellationToken,
}

impl CarGenerator {
    /// Create a generator with default build options.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            options: BuildOptions::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the build options.
    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// Attach a cancellation token. Cancelling aborts the build at the
    /// next safe point and removes any partially written CAR.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Build CARs from a list of files and/or directories.
    ///
    /// Directory layout inside the DAG mirrors the full input paths.
    /// Returns the first CAR's file name, or `None` when the inputs carry
    /// zero bytes.
    pub async fn generate_from_files(
        &self,
        files: &[PathBuf],
        slice_size: u64,
    ) -> Result<Option<String>, EngineError> {
        self.validate(slice_size)?;
        let refs = enumerate_paths(files, self.options.attach_uuid).await?;
        let graph_name = files.first().map(|p| derive_graph_name(p));
        self.generate(
            &refs,
            graph_name.as_deref().unwrap_or("graph"),
            Path::new("/"),
            slice_size,
        )
        .await
    }

    /// As [`generate_from_files`](Self::generate_from_files), with one
    /// caller-supplied UUID per file folded into the display names.
    pub async fn generate_from_files_with_uuid(
        &self,
        files: &[PathBuf],
        uuids: &[String],
        slice_size: u64,
    ) -> Result<Option<String>, EngineError> {
        self.validate(slice_size)?;
        let refs = enumerate_files_with_uuids(files, uuids).await?;
        let graph_name = files.first().map(|p| derive_graph_name(p));
        self.generate(
            &refs,
            graph_name.as_deref().unwrap_or("graph"),
            Path::new("/"),
            slice_size,
        )
        .await
    }

    /// Build CARs from one directory root.
    ///
    /// The DAG mirrors the tree relative to `dir`.
    pub async fn generate_from_dir(
        &self,
        dir: &Path,
        slice_size: u64,
    ) -> Result<Option<String>, EngineError> {
        self.validate(slice_size)?;
        let refs = enumerate_paths(&[dir.to_path_buf()], self.options.attach_uuid).await?;
        self.generate(&refs, &derive_graph_name(dir), dir, slice_size)
            .await
    }

    /// Fail fast on bad configuration, before any I/O.
    fn validate(&self, slice_size: u64) -> Result<(), EngineError> {
        if slice_size == 0 {
            return Err(EngineError::InvalidArgument(
                "slice size must be greater than 0".into(),
            ));
        }
        if self.options.parallel == 0 {
            return Err(EngineError::InvalidArgument(
                "parallel must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    async fn generate(
        &self,
        files: &[FileRef],
        graph_name: &str,
        parent_path: &Path,
        slice_size: u64,
    ) -> Result<Option<String>, EngineError> {
        let slices = plan_slices(files, graph_name, slice_size)?;
        if slices.is_empty() {
            warn!("empty folder or file, nothing to archive");
            return Ok(None);
        }
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let assembler = DagAssembler::new(parent_path, self.options.parallel, self.cancel.clone())?;
        let mut first_car = None;
        for slice in &slices {
            if self.cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            let dag = assembler.build_slice(&slice.files).await?;
            let car_name = format!("{}.car", dag.root);
            self.write_car_file(&dag, &self.output_dir.join(&car_name))
                .await?;

            // Summarize before recording: a broken DAG must not leave a
            // manifest row behind.
            let detail = summarize(dag.store.as_ref(), dag.root).await?;
            manifest::append_row(
                &self.output_dir,
                &dag.root,
                &slice.name,
                &detail.to_detail_json(),
            )
            .await?;

            info!(
                root = %dag.root,
                car = car_name,
                graph = %slice.name,
                files = slice.files.len(),
                "car written"
            );
            first_car.get_or_insert(car_name);
        }
        Ok(first_car)
    }

    /// Write one CAR file; a failed or cancelled write leaves no partial
    /// file behind.
    async fn write_car_file(&self, dag: &SliceDag, car_path: &Path) -> Result<(), EngineError> {
        let mut file = tokio::fs::File::create(car_path).await?;
        let result = match carpack_car::write_car(dag.store.as_ref(), dag.root, &mut file).await {
            Ok(_) if self.cancel.is_cancelled() => Err(EngineError::Cancelled),
            Ok(_) => file.sync_all().await.map_err(EngineError::from),
            Err(e) => Err(e.into()),
        };
        if result.is_err() {
            let _ = tokio::fs::remove_file(car_path).await;
        }
        result
    }
}

/// Graph name derived from an input path: its final component without
/// extension.
fn derive_graph_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "graph".to_string())
}

// ---------------------------------------------------------------------------
// Free-function surface
// ---------------------------------------------------------------------------

/// Build one or more CARs from files and/or directories.
pub async fn generate_car_from_files(
    output_dir: impl Into<PathBuf>,
    files: &[PathBuf],
    slice_size: u64,
) -> Result<Option<String>, EngineError> {
    CarGenerator::new(output_dir)
        .generate_from_files(files, slice_size)
        .await
}

/// Build one or more CARs from flat files with 1:1 UUID tags.
pub async fn generate_car_from_files_with_uuid(
    output_dir: impl Into<PathBuf>,
    files: &[PathBuf],
    uuids: &[String],
    slice_size: u64,
) -> Result<Option<String>, EngineError> {
    CarGenerator::new(output_dir)
        .generate_from_files_with_uuid(files, uuids, slice_size)
        .await
}

/// Build one or more CARs from a directory root.
pub async fn generate_car_from_dir(
    output_dir: impl Into<PathBuf>,
    dir: impl AsRef<Path>,
    slice_size: u64,
) -> Result<Option<String>, EngineError> {
    CarGenerator::new(output_dir)
        .generate_from_dir(dir.as_ref(), slice_size)
        .await
}
