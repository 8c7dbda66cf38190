//! CAR v1 header codec.

use cid::Cid;
use serde::{Deserialize, Serialize};

use crate::error::CarError;

/// The DAG-CBOR header opening every CAR v1 stream.
///
/// Field declaration order matters: DAG-CBOR maps are key-sorted
/// (`roots` before `version`), which here coincides with declaration
/// order, so the encoded header is byte-identical to the reference
/// writers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarHeader {
    /// Root CIDs of the DAGs contained in the stream.
    pub roots: Vec<Cid>,
    /// Format version; always 1.
    pub version: u64,
}

impl CarHeader {
    /// Header for a single-root CAR.
    pub fn single_root(root: Cid) -> Self {
        Self {
            roots: vec![root],
            version: 1,
        }
    }

    /// Encode to DAG-CBOR bytes.
    pub fn encode(&self) -> Result<Vec<u8>, CarError> {
        serde_ipld_dagcbor::to_vec(self).map_err(|e| CarError::Corrupt(e.to_string()))
    }

    /// Decode from DAG-CBOR bytes, enforcing version 1 and at least one
    /// root.
    pub fn decode(bytes: &[u8]) -> Result<Self, CarError> {
        let header: CarHeader = serde_ipld_dagcbor::from_slice(bytes)
            .map_err(|e| CarError::Corrupt(format!("invalid header: {e}")))?;
        if header.version != 1 {
            return Err(CarError::Corrupt(format!(
                "unsupported car version {}",
                header.version
            )));
        }
        if header.roots.is_empty() {
            return Err(CarError::Corrupt("car header has no roots".into()));
        }
        Ok(header)
    }
}
