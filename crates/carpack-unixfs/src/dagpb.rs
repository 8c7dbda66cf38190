//! Canonical dag-pb wire format.
//!
//! dag-pb is a restricted protobuf schema with a fixed canonical encoding:
//! a node's links are written before its data field, links appear in list
//! order, and each link writes Hash, Name, Tsize in that order. Matching
//! this byte layout exactly is what keeps CIDs stable across
//! implementations.

use bytes::Bytes;
use cid::Cid;

use crate::block::Block;
use crate::error::UnixfsError;

// Wire types.
const WIRE_VARINT: u64 = 0;
const WIRE_LEN: u64 = 2;

/// A link from a dag-pb node to a child block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PbLink {
    /// CID of the child block.
    pub cid: Cid,
    /// Link name; empty for the internal links of a file DAG.
    pub name: String,
    /// Cumulative size of the child subtree: the child's encoded length
    /// plus the Tsize of every link it carries.
    pub tsize: u64,
}

/// A dag-pb node: an ordered link list plus an opaque data payload.
///
/// For UnixFS the payload is an encoded
/// [`UnixfsData`](crate::UnixfsData) message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PbNode {
    /// Ordered child links.
    pub links: Vec<PbLink>,
    /// Opaque payload bytes.
    pub data: Vec<u8>,
}

impl PbNode {
    /// Encode to canonical dag-pb bytes: links first, then data.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for link in &self.links {
            let mut body = Vec::new();
            link.encode_into(&mut body);
            push_tag(&mut out, 2, WIRE_LEN);
            push_varint(&mut out, body.len() as u64);
            out.extend_from_slice(&body);
        }
        if !self.data.is_empty() {
            push_tag(&mut out, 1, WIRE_LEN);
            push_varint(&mut out, self.data.len() as u64);
            out.extend_from_slice(&self.data);
        }
        out
    }

    /// Encode and hash into an addressed [`Block`].
    pub fn into_block(self) -> Result<Block, UnixfsError> {
        Block::new(Bytes::from(self.encode()))
    }

    /// Decode a dag-pb node from raw block bytes.
    pub fn decode(mut input: &[u8]) -> Result<Self, UnixfsError> {
        let mut node = PbNode::default();
        while !input.is_empty() {
            let tag = read_varint(&mut input)?;
            match (tag >> 3, tag & 7) {
                (1, WIRE_LEN) => node.data = read_bytes(&mut input)?.to_vec(),
                (2, WIRE_LEN) => {
                    let body = read_bytes(&mut input)?;
                    node.links.push(PbLink::decode(body)?);
                }
                (field, wire) => {
                    return Err(UnixfsError::Decode(format!(
                        "unexpected dag-pb field {field} (wire type {wire})"
                    )));
                }
            }
        }
        Ok(node)
    }
}

impl PbLink {
    fn encode_into(&self, out: &mut Vec<u8>) {
        // Hash (1). A CIDv0 is its bare multihash bytes.
        let cid_bytes = self.cid.to_bytes();
        push_tag(out, 1, WIRE_LEN);
        push_varint(out, cid_bytes.len() as u64);
        out.extend_from_slice(&cid_bytes);

        // Name (2) — written even when empty, as the reference encoders do.
        push_tag(out, 2, WIRE_LEN);
        push_varint(out, self.name.len() as u64);
        out.extend_from_slice(self.name.as_bytes());

        // Tsize (3).
        push_tag(out, 3, WIRE_VARINT);
        push_varint(out, self.tsize);
    }

    fn decode(mut input: &[u8]) -> Result<Self, UnixfsError> {
        let mut cid = None;
        let mut name = String::new();
        let mut tsize = 0u64;
        while !input.is_empty() {
            let tag = read_varint(&mut input)?;
            match (tag >> 3, tag & 7) {
                (1, WIRE_LEN) => {
                    let raw = read_bytes(&mut input)?;
                    cid = Some(Cid::try_from(raw)?);
                }
                (2, WIRE_LEN) => {
                    let raw = read_bytes(&mut input)?;
                    name = String::from_utf8(raw.to_vec())
                        .map_err(|_| UnixfsError::Decode("link name is not UTF-8".into()))?;
                }
                (3, WIRE_VARINT) => tsize = read_varint(&mut input)?,
                (field, wire) => {
                    return Err(UnixfsError::Decode(format!(
                        "unexpected dag-pb link field {field} (wire type {wire})"
                    )));
                }
            }
        }
        let cid = cid.ok_or_else(|| UnixfsError::Decode("link without hash".into()))?;
        Ok(Self { cid, name, tsize })
    }
}

// ---------------------------------------------------------------------------
// Wire helpers, shared with the UnixFS message codec.
// ---------------------------------------------------------------------------

pub(crate) fn push_tag(out: &mut Vec<u8>, field: u64, wire: u64) {
    push_varint(out, field << 3 | wire);
}

pub(crate) fn push_varint(out: &mut Vec<u8>, value: u64) {
    let mut buf = unsigned_varint::encode::u64_buffer();
    out.extend_from_slice(unsigned_varint::encode::u64(value, &mut buf));
}

pub(crate) fn read_varint(input: &mut &[u8]) -> Result<u64, UnixfsError> {
    let (value, rest) =
        unsigned_varint::decode::u64(input).map_err(|e| UnixfsError::Decode(e.to_string()))?;
    *input = rest;
    Ok(value)
}

pub(crate) fn read_bytes<'a>(input: &mut &'a [u8]) -> Result<&'a [u8], UnixfsError> {
    let len = read_varint(input)? as usize;
    if input.len() < len {
        return Err(UnixfsError::Decode("truncated length-delimited field".into()));
    }
    let (head, rest) = input.split_at(len);
    *input = rest;
    Ok(head)
}
