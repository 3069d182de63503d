use super::Request;
use crate::block::BlockId;
use crate::error::{ErrorRepr, Result};

use bytes::Bytes;

/// Request uploading one block of a chunked upload.
///
/// The block ID is appended to the destination URL, which is expected to
/// already carry a query string.
#[derive(Debug, Clone)]
pub struct PutBlockRequest {
    url: String,
    id: BlockId,
    content_type: String,
    body: Bytes,
}

impl PutBlockRequest {
    /// Create a new `PutBlockRequest` from the minimum required.
    pub fn new<T: Into<String>>(url: &str, id: BlockId, content_type: T, body: Bytes) -> Self {
        Self {
            url: url.to_string(),
            id,
            content_type: content_type.into(),
            body,
        }
    }

    /// Returns the ID of the block being uploaded.
    pub fn id(&self) -> &BlockId {
        &self.id
    }

    /// The URL the block is sent to.
    pub fn target(&self) -> String {
        format!("{}&comp=block&blockid={}", self.url, self.id)
    }

    /// Build the request to send.
    pub fn into_request(self) -> Result<Request> {
        self.validate()?;
        let req = Request::new(self.target(), self.body).header("Content-Type", self.content_type);
        Ok(req)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(ErrorRepr::Missing("PutBlockRequest", "url").into());
        }
        Ok(())
    }
}
