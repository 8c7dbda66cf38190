//! Shared test harness for carpack integration tests.
//!
//! Provides filesystem fixtures under [`TempDir`] and a deterministic
//! data generator, so every integration target builds the same trees
//! without repeating setup code.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;

use tempfile::TempDir;

static INIT_LOGGING: Once = Once::new();

/// Install a `tracing` subscriber honoring `RUST_LOG`, once per process.
///
/// Call at the top of a test to see pipeline logs while debugging.
pub fn init_logging() {
    INIT_LOGGING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}

/// UUIDs used by the uuid-tagging scenarios.
pub const SAMPLE_UUIDS: [&str; 5] = [
    "94d6a0d0-3e76-45b7-9705-4d829e0e3ca8",
    "571e4e2b-d50b-4ac2-a89f-07795b684148",
    "36f4da38-a028-493a-a855-51b07269e709",
    "e99d2819-09a8-4e53-8158-a48d8154e057",
    "6631aa2a-5e89-4f98-b114-86bf4403f1c2",
];

/// Generate deterministic, non-repeating test data.
///
/// A simple LCG keeps chunks distinct so content addressing does not
/// collapse them.
pub fn test_data(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut state: u32 = 0xDEAD_BEEF;
    for _ in 0..size {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        data.push((state >> 16) as u8);
    }
    data
}

/// Write `contents` at `path`, creating parent directories.
pub fn touch(path: &Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// The standard five-file input tree:
///
/// ```text
/// input/
///   test0
///   test4
///   dir1/test1
///   dir1/dir2/test2
///   dir1/dir2/test3
/// ```
///
/// Returns the tempdir guard, the `input/` root, and the five file paths
/// in enumeration-friendly order.
pub fn sample_tree(file_size: usize) -> (TempDir, PathBuf, Vec<PathBuf>) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("input");
    let files = vec![
        root.join("test0"),
        root.join("test4"),
        root.join("dir1/test1"),
        root.join("dir1/dir2/test2"),
        root.join("dir1/dir2/test3"),
    ];
    for (i, path) in files.iter().enumerate() {
        // Offset each file's data so contents differ.
        let mut data = test_data(file_size);
        if !data.is_empty() {
            data[0] = data[0].wrapping_add(i as u8);
        }
        touch(path, &data);
    }
    (tmp, root, files)
}

/// Read a manifest back as (header, rows).
pub fn read_manifest(output_dir: &Path) -> (String, Vec<String>) {
    let contents = fs::read_to_string(output_dir.join("manifest.csv")).unwrap();
    let mut lines = contents.lines().map(str::to_string);
    let header = lines.next().unwrap();
    (header, lines.collect())
}
