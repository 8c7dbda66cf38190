//! Content-addressed blocks and CIDv0 construction.

use bytes::Bytes;
use cid::Cid;
use multihash::Multihash;
use sha2::{Digest, Sha256};

use crate::error::UnixfsError;

/// Multihash code for sha2-256.
const SHA2_256: u64 = 0x12;

/// An immutable block: bytes plus the CID that addresses them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// CIDv0 of `data`.
    pub cid: Cid,
    /// The encoded block bytes.
    pub data: Bytes,
}

impl Block {
    /// Hash `data` and wrap it into an addressed block.
    pub fn new(data: Bytes) -> Result<Self, UnixfsError> {
        let cid = cid_v0(&data)?;
        Ok(Self { cid, data })
    }
}

/// Compute the CIDv0 of a dag-pb block: sha2-256 multihash, dag-pb codec.
pub fn cid_v0(data: &[u8]) -> Result<Cid, UnixfsError> {
    let digest = Sha256::digest(data);
    let mh = Multihash::wrap(SHA2_256, &digest)?;
    Ok(Cid::new_v0(mh)?)
}
