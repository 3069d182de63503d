use super::Request;
use crate::error::{ErrorRepr, Result};

use bytes::Bytes;

/// Request uploading a whole file in one `PUT`.
#[derive(Debug, Clone)]
pub struct PutBlobRequest {
    url: String,
    content_type: String,
    body: Bytes,
}

impl PutBlobRequest {
    /// Create a new `PutBlobRequest` from the minimum required.
    pub fn new<T: Into<String>>(url: &str, content_type: T, body: Bytes) -> Self {
        Self {
            url: url.to_string(),
            content_type: content_type.into(),
            body,
        }
    }

    /// Build the request to send.
    pub fn into_request(self) -> Result<Request> {
        self.validate()?;
        let req = Request::new(self.url, self.body).header("Content-Type", self.content_type);
        Ok(req)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(ErrorRepr::Missing("PutBlobRequest", "url").into());
        }
        Ok(())
    }
}
