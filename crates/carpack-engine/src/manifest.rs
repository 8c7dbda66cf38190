//! Manifest CSV recording.

use std::path::Path;

use cid::Cid;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::EngineError;

/// File name of the manifest inside the output directory.
pub const MANIFEST_FILE: &str = "manifest.csv";

/// Header line written exactly once, when the manifest is created.
pub const MANIFEST_HEADER: &str = "payload_cid,filename,detail\n";

/// Append one `<root>,<graph name>,<detail json>` row to the manifest,
/// creating the file (with its header) on first use.
///
/// The detail column is compact JSON and is written verbatim — the
/// manifest is a fixed three-column format, not quoted CSV.
pub async fn append_row(
    output_dir: &Path,
    root: &Cid,
    graph_name: &str,
    detail: &str,
) -> Result<(), EngineError> {
    let path = output_dir.join(MANIFEST_FILE);
    let is_create = match tokio::fs::metadata(&path).await {
        Ok(_) => false,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => return Err(e.into()),
    };

    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(&path)
        .await?;
    if is_create {
        file.write_all(MANIFEST_HEADER.as_bytes()).await?;
    }
    file.write_all(format!("{root},{graph_name},{detail}\n").as_bytes())
        .await?;
    file.flush().await?;

    debug!(manifest = %path.display(), graph = graph_name, "manifest row appended");
    Ok(())
}
