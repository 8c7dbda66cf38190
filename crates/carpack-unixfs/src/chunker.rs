//! Fixed-size chunker for splitting input streams into leaf chunks.

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::UnixfsError;

/// Fixed-size chunker. The last chunk may be short; empty input produces
/// zero chunks.
pub struct Chunker {
    chunk_size: usize,
}

impl Chunker {
    /// Create a chunker with the given chunk size in bytes.
    pub fn new(chunk_size: usize) -> Self {
        Self { chunk_size }
    }

    /// Read the next chunk from the reader.
    ///
    /// Fills up to `chunk_size` bytes, tolerating short reads. Returns
    /// `None` once the reader is exhausted.
    pub async fn next_chunk(
        &self,
        reader: &mut (impl AsyncRead + Unpin),
    ) -> Result<Option<Vec<u8>>, UnixfsError> {
        let mut buf = vec![0u8; self.chunk_size];
        let mut filled = 0;

        while filled < self.chunk_size {
            let n = reader.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled == 0 {
            return Ok(None);
        }
        buf.truncate(filled);
        Ok(Some(buf))
    }
}
