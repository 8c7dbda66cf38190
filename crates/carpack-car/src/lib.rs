//! CAR v1 stream reading and writing.
//!
//! A CAR v1 stream is a varint-framed sequence: first a DAG-CBOR header
//! carrying `{roots, version}`, then zero or more `cid || bytes` block
//! frames. This crate provides:
//! - [`CarHeader`] — header codec.
//! - [`write_car`] — deterministic depth-first emission of a DAG from a
//!   [`BlockStore`](carpack_store::BlockStore).
//! - [`CarReader`] — streaming block iteration, and [`load_car`] to
//!   import a verified CAR into a store.

mod error;
mod header;
mod reader;
mod writer;

pub use error::CarError;
pub use header::CarHeader;
pub use reader::{CarReader, load_car};
pub use writer::write_car;
