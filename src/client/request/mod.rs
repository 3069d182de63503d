//! Requests of the block blob upload protocol.
//!
//! Each request type in this module builds one of the three `PUT` requests
//! of the protocol, which are all sent as a plain [`Request`] by a
//! [`SendRequest`] client.
//!
//! [`SendRequest`]: super::SendRequest
use bytes::Bytes;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

mod put_blob;
pub use put_blob::PutBlobRequest;

mod put_block;
pub use put_block::PutBlockRequest;

mod put_block_list;
pub use put_block_list::PutBlockListRequest;

/// Callback given the number of body bytes sent so far and the body size.
pub type OnBodyProgress = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// A `PUT` request ready to be sent.
///
/// Cloning is cheap; the body is reference counted. A retried request is a
/// clone of the first attempt.
#[derive(Clone)]
pub struct Request {
    pub(crate) url: String,
    pub(crate) headers: Vec<(&'static str, String)>,
    pub(crate) body: Bytes,
    pub(crate) on_progress: Option<OnBodyProgress>,
}

impl Request {
    /// Create a new request with no headers.
    pub fn new<T: Into<String>>(url: T, body: Bytes) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            body,
            on_progress: None,
        }
    }

    /// Add a header to the request.
    pub fn header<T: Into<String>>(mut self, name: &'static str, value: T) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Report the bytes of the body as they are sent.
    pub fn on_progress(self, f: OnBodyProgress) -> Self {
        Self {
            on_progress: Some(f),
            ..self
        }
    }

    /// A copy of this request that reports no progress.
    ///
    /// The copy holds no reference to whatever the progress callback
    /// captured.
    pub fn without_progress(&self) -> Self {
        Self {
            on_progress: None,
            ..self.clone()
        }
    }

    /// Returns the target URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the headers in the order they were added.
    pub fn headers(&self) -> &[(&'static str, String)] {
        &self.headers
    }

    /// Returns the value of the first header named `name`, ignoring case.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the request body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Report that `sent` bytes of the body have been sent.
    pub fn report_progress(&self, sent: u64) {
        if let Some(f) = &self.on_progress {
            f(sent, self.body.len() as u64);
        }
    }

    pub(crate) fn has_progress(&self) -> bool {
        self.on_progress.is_some()
    }
}

impl Debug for Request {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// The response to a [`Request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    /// The HTTP status code.
    pub status: u16,
}

impl Response {
    /// Create a new `Response`.
    pub fn new(status: u16) -> Self {
        Self { status }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
