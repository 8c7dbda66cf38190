//! Shared types and constants for the carpack workspace.
//!
//! This crate defines the data model used across the workspace:
//! input descriptors ([`FileRef`], [`ByteWindow`]), the manifest tree
//! summary ([`FsEntry`]), build configuration ([`BuildOptions`]), and the
//! interface constants ([`CHUNK_SIZE`], [`MAX_LINKS`]).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Size of one UnixFS leaf chunk in bytes (1 MiB).
///
/// Part of the interface: changing it changes every produced CID.
pub const CHUNK_SIZE: u64 = 1 << 20;

/// Maximum number of links per internal DAG node.
///
/// Part of the interface: changing it changes every produced CID.
pub const MAX_LINKS: usize = 1 << 10;

/// Joiner between a file's base name and its UUID tag in display names.
pub const UUID_JOINER: &str = "-uuid-";

// ---------------------------------------------------------------------------
// Input descriptors
// ---------------------------------------------------------------------------

/// An inclusive byte range into a file.
///
/// Invariant: `start <= end`, and `end < file size` for the file the window
/// belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteWindow {
    /// First byte covered, inclusive.
    pub start: u64,
    /// Last byte covered, inclusive.
    pub end: u64,
}

impl ByteWindow {
    /// Number of bytes covered by the window.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Windows always cover at least one byte.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// One file (or a byte window of a file) queued for DAG construction.
///
/// `display_name` is the link name used inside the DAG: the file's base name,
/// optionally tagged with a UUID suffix, and — for windowed pieces — an
/// 8-digit piece index appended by the slice planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    /// Absolute or caller-relative path of the underlying file.
    pub path: PathBuf,
    /// Link name used for this entry inside the DAG.
    pub display_name: String,
    /// UUID tag, when the enumeration attached one.
    pub uuid: Option<String>,
    /// Size of the underlying file in bytes.
    pub size: u64,
    /// Byte window into `path`; `None` means the whole file.
    pub window: Option<ByteWindow>,
}

impl FileRef {
    /// Create a descriptor covering a whole file.
    ///
    /// The display name is the path's final component.
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        let display_name = base_name(&path);
        Self {
            path,
            display_name,
            uuid: None,
            size,
            window: None,
        }
    }

    /// Create a descriptor whose display name carries a UUID tag.
    pub fn with_uuid(path: impl Into<PathBuf>, size: u64, uuid: impl Into<String>) -> Self {
        let path = path.into();
        let uuid = uuid.into();
        let display_name = format!("{}{UUID_JOINER}{uuid}", base_name(&path));
        Self {
            path,
            display_name,
            uuid: Some(uuid),
            size,
            window: None,
        }
    }

    /// Number of payload bytes this entry contributes to a slice.
    pub fn payload_len(&self) -> u64 {
        match self.window {
            Some(w) => w.len(),
            None => self.size,
        }
    }

    /// Whether this entry is a fractional window of its file.
    pub fn is_windowed(&self) -> bool {
        self.window.is_some()
    }
}

/// Final path component as an owned string (lossy on non-UTF-8 names).
fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Build configuration
// ---------------------------------------------------------------------------

/// Options controlling a CAR build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Upper bound on concurrent leaf builders.
    ///
    /// Clamped to the number of logical CPUs at build time. Must be > 0.
    pub parallel: usize,
    /// Attach a fresh UUID tag to every enumerated file name.
    pub attach_uuid: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            parallel: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            attach_uuid: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Manifest tree summary
// ---------------------------------------------------------------------------

/// One node of the logical tree summary embedded in the manifest.
///
/// Serialized with the exact field names and order consumers expect:
/// `Name`, `Hash`, `Size`, `Link`. `Link` is always present and empty for
/// non-directory nodes; the root carries an empty `Name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsEntry {
    /// Link name of this entry; empty for the root.
    #[serde(rename = "Name")]
    pub name: String,
    /// CID of the entry, stringified (base58 for CIDv0).
    #[serde(rename = "Hash")]
    pub hash: String,
    /// Cumulative size reported by the link that referenced this entry.
    #[serde(rename = "Size")]
    pub size: u64,
    /// Children, in link order. Empty for files.
    #[serde(rename = "Link")]
    pub links: Vec<FsEntry>,
}

impl FsEntry {
    /// Compact JSON rendering used for the manifest `detail` column.
    ///
    /// `FsEntry` contains no map types, so `serde_json` preserves the
    /// declared field order and emits no newlines.
    pub fn to_detail_json(&self) -> String {
        serde_json::to_string(self).expect("FsEntry serialization cannot fail")
    }
}
