//! Uploads of a file, in one request or as a list of blocks.
//!
//! [`Upload`] is what the [`Uploader`] dispatches a request to. Its variants
//! can also be matched on to reach the uploads directly, e.g. to inspect the
//! [`UploadSession`] of a chunked upload.
//!
//! [`Uploader`]: crate::Uploader
use crate::event::EventSink;
use crate::source::FileSource;

use tokio_util::sync::CancellationToken;

mod chunked;
pub use self::chunked::ChunkedUpload;

mod session;
pub use self::session::UploadSession;

mod single;
pub use self::single::SingleShotUpload;

/// Smallest effective single-request threshold, in megabytes.
pub const MIN_SINGLE_SHOT_MEGABYTES: u64 = 6;

/// Resolve the single-request threshold of an upload request.
///
/// A missing threshold, or one below [`MIN_SINGLE_SHOT_MEGABYTES`], is
/// raised to that minimum.
pub fn effective_threshold(max_single_shot_megabytes: Option<u64>) -> u64 {
    max_single_shot_megabytes
        .unwrap_or(MIN_SINGLE_SHOT_MEGABYTES)
        .max(MIN_SINGLE_SHOT_MEGABYTES)
}

/// Whether a file of `size` bytes is sent in a single request.
///
/// The size is compared in whole (decimal) megabytes, rounded down.
pub fn is_single_shot(size: u64, max_single_shot_megabytes: Option<u64>) -> bool {
    size / 1_000_000 <= effective_threshold(max_single_shot_megabytes)
}

/// What an upload reached the last time it was run.
///
/// The same outcome is also delivered to the event sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    /// The object was created.
    Completed {
        /// Status of the response that completed the upload.
        status: u16,
    },
    /// The upload stopped on an error and can be retried.
    Failed,
    /// Every block was uploaded but the block list was not committed.
    CommitFailed,
}

impl UploadState {
    /// Whether the upload completed.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// An upload dispatched by size.
#[derive(Debug)]
pub enum Upload<F, S> {
    /// The file is sent in one request.
    SingleShot(SingleShotUpload<F, S>),
    /// The file is sent in blocks.
    Chunked(ChunkedUpload<F, S>),
}

impl<F: FileSource, S: EventSink + 'static> Upload<F, S> {
    /// Run the upload until it completes or fails.
    pub async fn start(&mut self) -> UploadState {
        match self {
            Self::SingleShot(upload) => upload.start().await,
            Self::Chunked(upload) => upload.start().await,
        }
    }

    /// Run the upload again after an `error` event.
    pub async fn retry(&mut self) -> UploadState {
        match self {
            Self::SingleShot(upload) => upload.retry().await,
            Self::Chunked(upload) => upload.retry().await,
        }
    }

    /// Replace the token checked for cancellation.
    ///
    /// A cancelled upload stays cancelled until it is given a new token.
    pub fn set_cancellation_token(&mut self, token: CancellationToken) {
        match self {
            Self::SingleShot(upload) => upload.set_cancellation_token(token),
            Self::Chunked(upload) => upload.set_cancellation_token(token),
        }
    }

    /// Whether this upload sends the file in blocks.
    pub fn is_chunked(&self) -> bool {
        matches!(self, Self::Chunked(_))
    }

    /// The session of a chunked upload.
    pub fn session(&self) -> Option<&UploadSession> {
        match self {
            Self::SingleShot(_) => None,
            Self::Chunked(upload) => Some(upload.session()),
        }
    }
}
