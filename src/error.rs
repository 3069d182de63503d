//! Errors this crate can emit.
use std::fmt::{self, Display, Formatter};
use std::ops::Range;

/// A specialized `Result` type for this crate.
pub type Result<T, E = Error> = ::std::result::Result<T, E>;

/// The value emitted in an `error` event, or returned from the lower-level
/// operations in this crate, when something goes wrong.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct Error(pub(crate) ErrorRepr);

impl Error {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self.0 {
            ErrorRepr::Transport { .. } => ErrorKind::Network,
            ErrorRepr::Status { .. } => ErrorKind::Status,
            ErrorRepr::Read { .. } => ErrorKind::Read,
            ErrorRepr::Commit { .. } => ErrorKind::Commit,
            ErrorRepr::InvalidUrl { .. } | ErrorRepr::Missing(_, _) => ErrorKind::Config,
            ErrorRepr::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// The HTTP status of the response, if this error is the result of
    /// receiving a response that was not ok.
    pub fn status(&self) -> Option<u16> {
        match &self.0 {
            ErrorRepr::Status { status, .. } => Some(*status),
            ErrorRepr::Commit { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Whether the retrying executor should send the request again.
    ///
    /// Only request-level failures are retried; a response that arrived is
    /// never retried regardless of its status.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Network)
    }

    /// Create an error for a request that failed before any response arrived.
    ///
    /// This is the constructor for [`SendRequest`] implementations to use when
    /// the underlying transport fails.
    ///
    /// [`SendRequest`]: crate::client::SendRequest
    pub fn transport<E>(url: impl Into<String>, e: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ErrorRepr::Transport {
            url: url.into(),
            source: Box::new(e),
        }
        .into()
    }

    /// Create an error for failing to read a byte range of the file.
    pub fn read(range: Range<u64>, e: std::io::Error) -> Self {
        ErrorRepr::Read {
            start: range.start,
            end: range.end,
            source: e,
        }
        .into()
    }

    pub(crate) fn status_code(url: &str, status: u16) -> Self {
        ErrorRepr::Status {
            url: url.to_string(),
            status,
        }
        .into()
    }

    pub(crate) fn commit(blocks: usize, source: Error) -> Self {
        ErrorRepr::Commit {
            blocks,
            source: Box::new(source),
        }
        .into()
    }

    pub(crate) fn cancelled() -> Self {
        ErrorRepr::Cancelled.into()
    }
}

impl From<ErrorRepr> for Error {
    fn from(value: ErrorRepr) -> Self {
        Self(value)
    }
}

/// The category of the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The request failed before a response was received.
    Network,
    /// A response was received but its status was not ok.
    Status,
    /// A byte range of the file could not be read.
    Read,
    /// The final block list could not be committed.
    Commit,
    /// The request could not be built from the input.
    Config,
    /// The upload was cancelled.
    Cancelled,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Status => write!(f, "status"),
            Self::Read => write!(f, "read"),
            Self::Commit => write!(f, "commit"),
            Self::Config => write!(f, "config"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Internal error type that we are free to change at will.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ErrorRepr {
    #[error("{0} missing required field: {1}")]
    Missing(&'static str, &'static str),
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    #[error("request to {url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("reading bytes {start}..{end} failed: {source}")]
    Read {
        start: u64,
        end: u64,
        source: std::io::Error,
    },
    #[error("committing list of {blocks} blocks failed: {source}")]
    Commit { blocks: usize, source: Box<Error> },
    #[error("upload cancelled")]
    Cancelled,
}
