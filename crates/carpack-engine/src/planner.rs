//! Slice planning: partitioning a file sequence into graph slices.
//!
//! Each slice covers at most `slice_size` payload bytes. A file larger
//! than the remaining budget is cut: the head window fills the current
//! slice, full-size windows each take a slice of their own, and a short
//! tail window opens the next slice. Windowed pieces are renamed
//! `<display_name>.<8-digit index>` with a per-file index starting at 0.

use carpack_types::{ByteWindow, FileRef};
use tracing::debug;

use crate::error::EngineError;

/// One planned graph slice: its manifest name and the files it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphSlice {
    /// Archive name recorded in the manifest (`<graph>.car` or
    /// `<graph>-total-<N>-part-<k>.car`).
    pub name: String,
    /// Files and windows covered, in input order.
    pub files: Vec<FileRef>,
}

/// Partition `files` into slices of at most `slice_size` payload bytes.
///
/// Returns no slices when the inputs carry zero bytes. The concatenation
/// of all slice windows, in order, reproduces the input byte streams.
pub fn plan_slices(
    files: &[FileRef],
    graph_name: &str,
    slice_size: u64,
) -> Result<Vec<GraphSlice>, EngineError> {
    if slice_size == 0 {
        return Err(EngineError::InvalidArgument(
            "slice size must be greater than 0".into(),
        ));
    }

    let total: u64 = files.iter().map(|f| f.payload_len()).sum();
    if total == 0 {
        return Ok(Vec::new());
    }
    let slice_total = total.div_ceil(slice_size) as usize;

    let mut slices = Vec::with_capacity(slice_total);
    let mut current: Vec<FileRef> = Vec::new();
    let mut cumu = 0u64;

    let close = |current: &mut Vec<FileRef>, cumu: &mut u64, slices: &mut Vec<GraphSlice>| {
        let name = graph_slice_name(graph_name, slices.len(), slice_total);
        debug!(slice = %name, files = current.len(), bytes = *cumu, "slice planned");
        slices.push(GraphSlice {
            name,
            files: std::mem::take(current),
        });
        *cumu = 0;
    };

    for file in files {
        let fsize = file.size;
        if cumu + fsize < slice_size {
            cumu += fsize;
            current.push(file.clone());
        } else if cumu + fsize == slice_size {
            current.push(file.clone());
            cumu += fsize;
            close(&mut current, &mut cumu, &mut slices);
        } else {
            // The file spills over the slice boundary: head window fills
            // the current slice, then successive windows are carved off.
            let first_cut = slice_size - cumu;
            let mut piece_index = 0u32;
            let mut seek_end = first_cut - 1;
            current.push(windowed(file, 0, seek_end, piece_index));
            piece_index += 1;
            cumu += first_cut;
            close(&mut current, &mut cumu, &mut slices);

            while seek_end < fsize - 1 {
                let seek_start = seek_end + 1;
                seek_end = (seek_start + slice_size - 1).min(fsize - 1);
                current.push(windowed(file, seek_start, seek_end, piece_index));
                piece_index += 1;
                cumu += seek_end - seek_start + 1;
                if seek_end - seek_start == slice_size - 1 {
                    close(&mut current, &mut cumu, &mut slices);
                }
            }
        }
    }
    if cumu > 0 {
        close(&mut current, &mut cumu, &mut slices);
    }

    Ok(slices)
}

/// Manifest name for slice `index` (0-based) out of `total`.
fn graph_slice_name(graph_name: &str, index: usize, total: usize) -> String {
    if total == 1 {
        format!("{graph_name}.car")
    } else {
        format!("{graph_name}-total-{total}-part-{}.car", index + 1)
    }
}

/// A windowed piece of `file`, renamed with its per-file piece index.
fn windowed(file: &FileRef, start: u64, end: u64, piece_index: u32) -> FileRef {
    let mut piece = file.clone();
    piece.display_name = format!("{}.{piece_index:08}", file.display_name);
    piece.window = Some(ByteWindow { start, end });
    piece
}
