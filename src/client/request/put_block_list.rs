use super::Request;
use crate::block::BlockList;
use crate::error::{ErrorRepr, Result};

use bytes::Bytes;

const COMMIT_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// Request committing the uploaded blocks, in order, as the final object.
#[derive(Debug, Clone)]
pub struct PutBlockListRequest {
    url: String,
    blocks: BlockList,
    content_type: String,
}

impl PutBlockListRequest {
    /// Create a new `PutBlockListRequest` from the minimum required.
    ///
    /// `content_type` is the content type the committed object will have.
    pub fn new<T: Into<String>>(url: &str, blocks: BlockList, content_type: T) -> Self {
        Self {
            url: url.to_string(),
            blocks,
            content_type: content_type.into(),
        }
    }

    /// Returns the blocks being committed.
    pub fn blocks(&self) -> &BlockList {
        &self.blocks
    }

    /// Build the request to send.
    pub fn into_request(self) -> Result<Request> {
        self.validate()?;
        let url = format!("{}&comp=blocklist", self.url);
        let body = Bytes::from(self.blocks.to_xml());
        let req = Request::new(url, body)
            .header("content-type", COMMIT_CONTENT_TYPE)
            .header("x-ms-blob-content-type", self.content_type);
        Ok(req)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(ErrorRepr::Missing("PutBlockListRequest", "url").into());
        }
        Ok(())
    }
}
