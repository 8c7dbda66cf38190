//! Streaming CAR v1 reading.

use bytes::Bytes;
use carpack_store::BlockStore;
use cid::Cid;
use futures::StreamExt;
use sha2::{Digest, Sha256};
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;
use tracing::debug;

use crate::error::CarError;
use crate::header::CarHeader;

type VarintFrameCodec = unsigned_varint::codec::UviBytes<Bytes>;

/// Streaming reader over the varint frames of a CAR v1 stream.
pub struct CarReader<R> {
    frames: FramedRead<R, VarintFrameCodec>,
    header: CarHeader,
}

impl<R> std::fmt::Debug for CarReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarReader")
            .field("header", &self.header)
            .finish_non_exhaustive()
    }
}

impl<R: AsyncRead + Unpin> CarReader<R> {
    /// Open a CAR stream, decoding and validating its header frame.
    pub async fn new(reader: R) -> Result<Self, CarError> {
        let mut frames = FramedRead::new(reader, VarintFrameCodec::default());
        let first = frames
            .next()
            .await
            .ok_or_else(|| CarError::Corrupt("empty car stream".into()))??;
        let header = CarHeader::decode(&first)?;
        Ok(Self { frames, header })
    }

    /// The decoded header.
    pub fn header(&self) -> &CarHeader {
        &self.header
    }

    /// The header's root CIDs.
    pub fn roots(&self) -> &[Cid] {
        &self.header.roots
    }

    /// Read the next `cid || bytes` block frame. `None` at end of stream.
    pub async fn next_block(&mut self) -> Result<Option<(Cid, Bytes)>, CarError> {
        let Some(frame) = self.frames.next().await else {
            return Ok(None);
        };
        let frame = frame?;
        let mut cursor = std::io::Cursor::new(&frame[..]);
        let cid = Cid::read_bytes(&mut cursor)
            .map_err(|e| CarError::Corrupt(format!("invalid block cid: {e}")))?;
        let data = Bytes::copy_from_slice(&frame[cursor.position() as usize..]);
        Ok(Some((cid, data)))
    }
}

/// Import every block of a CAR stream into `store`, verifying each
/// block's digest against its CID. Returns the header roots.
pub async fn load_car<S, R>(store: &S, reader: R) -> Result<Vec<Cid>, CarError>
where
    S: BlockStore + ?Sized,
    R: AsyncRead + Unpin,
{
    let mut car = CarReader::new(reader).await?;
    let mut blocks = 0usize;
    while let Some((cid, data)) = car.next_block().await? {
        verify_digest(&cid, &data)?;
        store.put(cid, data).await?;
        blocks += 1;
    }
    debug!(roots = car.roots().len(), blocks, "car stream imported");
    Ok(car.header.roots)
}

/// Check that `data` hashes to the digest carried in `cid`.
fn verify_digest(cid: &Cid, data: &[u8]) -> Result<(), CarError> {
    const SHA2_256: u64 = 0x12;
    match cid.hash().code() {
        SHA2_256 => {
            let digest = Sha256::digest(data);
            if digest[..] != *cid.hash().digest() {
                return Err(CarError::DigestMismatch(*cid));
            }
            Ok(())
        }
        other => Err(CarError::UnsupportedHash(other)),
    }
}
