//! Canonical dag-pb / UnixFS codec, chunker, and balanced DAG layout.
//!
//! This crate provides:
//! - [`PbNode`] / [`PbLink`] — the dag-pb wire format in its canonical
//!   encoding (links before data, link fields in Hash/Name/Tsize order).
//! - [`UnixfsData`] — the UnixFS `Data` message carried inside dag-pb
//!   nodes (file, directory, raw).
//! - [`Chunker`] — fixed-size splitting of a byte stream into leaf chunks.
//! - [`FileDagBuilder`] — balanced file-DAG construction over a
//!   [`BlockStore`](carpack_store::BlockStore).
//!
//! CIDs are v0 throughout: dag-pb codec, sha2-256 multihash, base58btc
//! when stringified. Both constants that shape the DAG —
//! [`CHUNK_SIZE`](carpack_types::CHUNK_SIZE) and
//! [`MAX_LINKS`](carpack_types::MAX_LINKS) — are part of the interface.

mod balanced;
mod block;
mod chunker;
mod dagpb;
mod error;
mod unixfs;

pub use balanced::{FileDagBuilder, FileDagRoot};
pub use block::{Block, cid_v0};
pub use chunker::Chunker;
pub use dagpb::{PbLink, PbNode};
pub use error::UnixfsError;
pub use unixfs::{UnixfsData, UnixfsType};
