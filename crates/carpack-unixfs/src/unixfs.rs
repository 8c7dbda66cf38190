//! The UnixFS `Data` message carried inside dag-pb nodes.
//!
//! Field layout (proto2 `unixfs.proto`):
//! `Type = 1`, `Data = 2`, `filesize = 3`, `blocksizes = 4` (unpacked).
//! Fields are written in numeric order; `Data` is omitted when empty and
//! `filesize` is always written for file nodes (including empty files).

use crate::dagpb::{push_tag, push_varint, read_bytes, read_varint};
use crate::error::UnixfsError;

const WIRE_VARINT: u64 = 0;
const WIRE_LEN: u64 = 2;

/// UnixFS node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnixfsType {
    /// Raw bytes without file framing.
    Raw,
    /// A directory: the enclosing dag-pb node's links are its entries.
    Directory,
    /// A file: inline data, or links to further file/raw nodes.
    File,
}

impl UnixfsType {
    fn code(self) -> u64 {
        match self {
            UnixfsType::Raw => 0,
            UnixfsType::Directory => 1,
            UnixfsType::File => 2,
        }
    }

    fn from_code(code: u64) -> Result<Self, UnixfsError> {
        match code {
            0 => Ok(UnixfsType::Raw),
            1 => Ok(UnixfsType::Directory),
            2 => Ok(UnixfsType::File),
            other => Err(UnixfsError::Decode(format!(
                "unsupported unixfs node type {other}"
            ))),
        }
    }
}

/// Decoded UnixFS `Data` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnixfsData {
    /// Node kind.
    pub kind: UnixfsType,
    /// Inline payload (leaf chunks); empty for parents and directories.
    pub data: Vec<u8>,
    /// Total file size in bytes; `None` for directories.
    pub filesize: Option<u64>,
    /// Data length of each child, for file parent nodes.
    pub blocksizes: Vec<u64>,
}

impl UnixfsData {
    /// A file leaf carrying one chunk of data.
    pub fn file_leaf(data: Vec<u8>) -> Self {
        let filesize = data.len() as u64;
        Self {
            kind: UnixfsType::File,
            data,
            filesize: Some(filesize),
            blocksizes: Vec::new(),
        }
    }

    /// A file parent node covering `blocksizes` worth of children.
    pub fn file_parent(blocksizes: Vec<u64>) -> Self {
        Self {
            kind: UnixfsType::File,
            data: Vec::new(),
            filesize: Some(blocksizes.iter().sum()),
            blocksizes,
        }
    }

    /// An (initially empty) directory.
    pub fn directory() -> Self {
        Self {
            kind: UnixfsType::Directory,
            data: Vec::new(),
            filesize: None,
            blocksizes: Vec::new(),
        }
    }

    /// Whether this node is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind == UnixfsType::Directory
    }

    /// File size in bytes: the declared filesize, falling back to the
    /// inline data length.
    pub fn file_size(&self) -> u64 {
        self.filesize.unwrap_or(self.data.len() as u64)
    }

    /// Encode to protobuf bytes in canonical field order.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        push_tag(&mut out, 1, WIRE_VARINT);
        push_varint(&mut out, self.kind.code());
        if !self.data.is_empty() {
            push_tag(&mut out, 2, WIRE_LEN);
            push_varint(&mut out, self.data.len() as u64);
            out.extend_from_slice(&self.data);
        }
        if let Some(filesize) = self.filesize {
            push_tag(&mut out, 3, WIRE_VARINT);
            push_varint(&mut out, filesize);
        }
        for size in &self.blocksizes {
            push_tag(&mut out, 4, WIRE_VARINT);
            push_varint(&mut out, *size);
        }
        out
    }

    /// Decode from the data payload of a dag-pb node.
    pub fn decode(mut input: &[u8]) -> Result<Self, UnixfsError> {
        let mut kind = None;
        let mut data = Vec::new();
        let mut filesize = None;
        let mut blocksizes = Vec::new();
        while !input.is_empty() {
            let tag = read_varint(&mut input)?;
            match (tag >> 3, tag & 7) {
                (1, WIRE_VARINT) => kind = Some(UnixfsType::from_code(read_varint(&mut input)?)?),
                (2, WIRE_LEN) => data = read_bytes(&mut input)?.to_vec(),
                (3, WIRE_VARINT) => filesize = Some(read_varint(&mut input)?),
                (4, WIRE_VARINT) => blocksizes.push(read_varint(&mut input)?),
                (4, WIRE_LEN) => {
                    // Packed encoding, accepted on decode for tolerance.
                    let mut packed = read_bytes(&mut input)?;
                    while !packed.is_empty() {
                        blocksizes.push(read_varint(&mut packed)?);
                    }
                }
                // hashType / fanout and other optional fields we never
                // produce; skip by wire type.
                (_, WIRE_VARINT) => {
                    read_varint(&mut input)?;
                }
                (_, WIRE_LEN) => {
                    read_bytes(&mut input)?;
                }
                (field, wire) => {
                    return Err(UnixfsError::Decode(format!(
                        "unexpected unixfs field {field} (wire type {wire})"
                    )));
                }
            }
        }
        let kind = kind.ok_or_else(|| UnixfsError::Decode("unixfs node without type".into()))?;
        Ok(Self {
            kind,
            data,
            filesize,
            blocksizes,
        })
    }
}
