#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

//! # Description
//!
//! Upload a local file to a blob storage endpoint, either in a single `PUT`
//! or, when the file is larger than a threshold, as a sequence of 5 MiB
//! blocks followed by a request that commits the list of blocks.
//!
//! Progress, completion and failure are reported to an [`EventSink`]. Blocks
//! are uploaded one at a time; a block that fails after its retries is rolled
//! back and the upload stops until it is retried.
//!
//! # Examples
//!
//! ```rust
//! # async fn f() {
//! use block_blob_upload::{UploadBuilder, UploadRequest};
//! use block_blob_upload::client::HttpClient;
//! use block_blob_upload::event::Event;
//! use block_blob_upload::source::LocalFile;
//! use futures::StreamExt as _;
//!
//! let uploader = UploadBuilder::new(HttpClient::default()).build();
//!
//! let file = LocalFile::open("video.mp4")
//!     .await
//!     .unwrap()
//!     .with_mime_type("video/mp4");
//! // The destination already carries its signature in the query string.
//! let url = "https://account.blob.core.windows.net/container/video.mp4?sv=2024&sig=...";
//! let req = UploadRequest::new(url, file).max_single_shot_megabytes(10);
//!
//! let (tx, mut rx) = futures::channel::mpsc::unbounded::<Event>();
//! let mut upload = uploader.upload(req, tx);
//!
//! // Files over 10 MB are uploaded in blocks; resume after a failure until
//! // the upload completes.
//! while !upload.start().await.is_completed() {
//!     if !upload.is_chunked() {
//!         break;
//!     }
//! }
//! drop(upload);
//!
//! while let Some(event) = rx.next().await {
//!     println!("{}: {event:?}", event.name());
//! }
//! # }
//! ```
use self::client::{SendRequest, UploadClient};
use self::event::EventSink;
use self::retry::RetryPolicy;
use self::source::FileSource;
use self::upload::{ChunkedUpload, SingleShotUpload, Upload};

use std::sync::Arc;
use std::time::Duration;

pub use bytesize::ByteSize;
pub use tokio_util::sync::CancellationToken;

#[macro_use]
mod trace;

pub mod block;
pub mod client;
pub mod error;
pub mod event;
mod progress;
pub mod retry;
pub mod source;

pub mod upload;
#[doc(inline)]
pub use upload::{UploadState, effective_threshold};

/// Size of every block of a chunked upload except the last.
pub const BLOCK_SIZE: ByteSize = ByteSize::mib(5);

const DEFAULT_COMMIT_DELAY: Duration = Duration::from_millis(4000);

/// A file and the destination to upload it to.
#[derive(Debug, Clone)]
pub struct UploadRequest<F> {
    /// The destination URL, including any query string authorizing the
    /// upload.
    pub url: String,
    /// The file to upload.
    pub file: F,
    /// Largest file, in whole megabytes, sent in a single request.
    ///
    /// See [`effective_threshold`] for how a missing or small value is
    /// resolved.
    pub max_single_shot_megabytes: Option<u64>,
}

impl<F: FileSource> UploadRequest<F> {
    /// Create a new `UploadRequest` with the default threshold.
    pub fn new<T: Into<String>>(url: T, file: F) -> Self {
        Self {
            url: url.into(),
            file,
            max_single_shot_megabytes: None,
        }
    }

    /// Set the largest file, in whole megabytes, sent in a single request.
    pub fn max_single_shot_megabytes(self, megabytes: u64) -> Self {
        Self {
            max_single_shot_megabytes: Some(megabytes),
            ..self
        }
    }

    /// Whether this request is sent in a single request rather than in
    /// blocks.
    pub fn is_single_shot(&self) -> bool {
        upload::is_single_shot(self.file.size(), self.max_single_shot_megabytes)
    }
}

/// Settings shared by every upload an [`Uploader`] starts.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub(crate) retry: RetryPolicy,
    pub(crate) commit_delay: Duration,
    pub(crate) cancel: CancellationToken,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            commit_delay: DEFAULT_COMMIT_DELAY,
            cancel: CancellationToken::new(),
        }
    }
}

impl UploadConfig {
    /// Returns the retry policy of block and commit requests.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Returns the time waited after the last block before committing.
    pub fn commit_delay(&self) -> Duration {
        self.commit_delay
    }
}

/// Configures and builds an [`Uploader`].
#[derive(Debug)]
#[non_exhaustive]
pub struct UploadBuilder {
    client: UploadClient,
    config: UploadConfig,
}

impl UploadBuilder {
    /// Create an `UploadBuilder` from a [`SendRequest`] client.
    pub fn new<C>(client: C) -> Self
    where
        C: SendRequest + 'static,
    {
        Self {
            client: UploadClient::new(client),
            config: UploadConfig::default(),
        }
    }

    /// Set the retry policy of block and commit requests.
    ///
    /// Defaults to 10 attempts 2 seconds apart.
    pub fn retry_policy(self, retry: RetryPolicy) -> Self {
        Self {
            config: UploadConfig {
                retry,
                ..self.config
            },
            ..self
        }
    }

    /// Set the time to wait after the last block is acknowledged before the
    /// block list is committed, giving the storage time to make the blocks
    /// visible.
    ///
    /// Defaults to 4 seconds.
    pub fn commit_delay(self, commit_delay: Duration) -> Self {
        Self {
            config: UploadConfig {
                commit_delay,
                ..self.config
            },
            ..self
        }
    }

    /// Set a token that cancels uploads started by the `Uploader`.
    ///
    /// Cancellation is observed before each block and before each request.
    pub fn cancellation_token(self, cancel: CancellationToken) -> Self {
        Self {
            config: UploadConfig {
                cancel,
                ..self.config
            },
            ..self
        }
    }

    /// Build an [`Uploader`] from this configuration.
    pub fn build(self) -> Uploader {
        Uploader {
            client: self.client,
            config: self.config,
        }
    }
}

/// Starts uploads, choosing for each between a single request and a chunked
/// upload.
#[derive(Debug, Clone)]
pub struct Uploader {
    client: UploadClient,
    config: UploadConfig,
}

impl Uploader {
    /// Returns the configuration of this uploader.
    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Create the upload for `req`, reporting its events to `sink`.
    ///
    /// The choice between a single request and blocks is made here, once.
    /// Nothing is sent until the upload is started.
    pub fn upload<F, S>(&self, req: UploadRequest<F>, sink: S) -> Upload<F, S>
    where
        F: FileSource,
        S: EventSink + 'static,
    {
        let single = req.is_single_shot();
        debug!(url = %req.url, size = req.file.size(), single, "dispatching upload");

        let sink = Arc::new(sink);
        let client = self.client.clone();
        let config = self.config.clone();
        if single {
            Upload::SingleShot(SingleShotUpload::new(req.url, req.file, client, sink, config))
        } else {
            Upload::Chunked(ChunkedUpload::new(req.url, req.file, client, sink, config))
        }
    }

    /// Create the upload for `req` and run it once.
    pub async fn upload_once<F, S>(
        &self,
        req: UploadRequest<F>,
        sink: S,
    ) -> (Upload<F, S>, UploadState)
    where
        F: FileSource,
        S: EventSink + 'static,
    {
        let mut upload = self.upload(req, sink);
        let state = upload.start().await;
        (upload, state)
    }
}
