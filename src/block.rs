//! Blocks of a chunked upload and the list that commits them.
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::fmt::{self, Display, Formatter};
use std::ops::{Deref, Range};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

/// Identifier of an uploaded block.
///
/// The ID of the block with sequence number `n` is `block-` followed by `n`
/// zero-padded to six digits, base64-encoded. IDs are assigned in upload
/// order starting at 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockId(String);

impl BlockId {
    /// The ID of the block with the given sequence number.
    pub fn from_sequence(n: usize) -> Self {
        let raw = format!("block-{n:06}");
        Self(STANDARD.encode(raw))
    }

    /// Returns the base64 encoded ID.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for BlockId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Display for BlockId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A contiguous range of the file uploaded in one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// The ID assigned to this block.
    pub id: BlockId,
    /// Position of this block in the upload, starting at 0.
    pub sequence: usize,
    /// The byte range `[start, end)` of the file this block covers.
    pub range: Range<u64>,
}

impl Block {
    pub(crate) fn new(sequence: usize, range: Range<u64>) -> Self {
        Self {
            id: BlockId::from_sequence(sequence),
            sequence,
            range,
        }
    }

    /// Size of the block in bytes.
    pub fn len(&self) -> u64 {
        self.range.end - self.range.start
    }

    /// Whether the block covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The IDs of uploaded blocks, in upload order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockList(Vec<BlockId>);

impl BlockList {
    /// Append the ID of a block that was just assigned.
    pub fn push(&mut self, id: BlockId) {
        self.0.push(id);
    }

    /// Drop every ID after the first `len`.
    pub fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }

    /// Returns the number of blocks.
    pub fn count(&self) -> usize {
        self.0.len()
    }

    /// Render the body of the request that commits these blocks.
    ///
    /// Each block is listed as `<Latest>` in upload order.
    pub fn to_xml(&self) -> String {
        let mut xml = String::from(XML_DECLARATION);
        xml.push_str("<BlockList>");
        for id in &self.0 {
            xml.push_str("<Latest>");
            xml.push_str(id);
            xml.push_str("</Latest>");
        }
        xml.push_str("</BlockList>");
        xml
    }
}

impl Deref for BlockList {
    type Target = [BlockId];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
