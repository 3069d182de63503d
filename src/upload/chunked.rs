use super::UploadState;
use super::session::UploadSession;
use crate::UploadConfig;
use crate::block::Block;
use crate::client::UploadClient;
use crate::client::request::{PutBlockListRequest, PutBlockRequest};
use crate::error::{Error, Result};
use crate::event::{Completed, EventSink, Progress};
use crate::progress::Meter;
use crate::retry;
use crate::source::FileSource;

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Upload of a file as a sequence of blocks followed by a commit of the
/// block list.
///
/// Blocks are read and uploaded one at a time, in order. When a block fails
/// it is rolled back, an `error` event is emitted, and the upload stops;
/// [`retry`](ChunkedUpload::retry) resumes it from the block that failed.
#[derive(Debug)]
pub struct ChunkedUpload<F, S> {
    url: String,
    file: F,
    client: UploadClient,
    sink: Arc<S>,
    config: UploadConfig,
    cancel: CancellationToken,
    session: UploadSession,
    last_progress: Progress,
    status: Option<u16>,
}

impl<F: FileSource, S: EventSink> ChunkedUpload<F, S> {
    pub(crate) fn new(
        url: String,
        file: F,
        client: UploadClient,
        sink: Arc<S>,
        config: UploadConfig,
    ) -> Self {
        let session = UploadSession::new(file.size());
        let cancel = config.cancel.clone();
        Self {
            url,
            file,
            client,
            sink,
            config,
            cancel,
            session,
            last_progress: Progress::default(),
            status: None,
        }
    }

    /// Returns the state of the upload.
    pub fn session(&self) -> &UploadSession {
        &self.session
    }

    /// Replace the token checked for cancellation, e.g. to resume an upload
    /// that was cancelled.
    pub fn set_cancellation_token(&mut self, token: CancellationToken) {
        self.cancel = token;
    }

    /// Upload the remaining blocks and commit the block list.
    pub async fn start(&mut self) -> UploadState {
        self.advance().await
    }

    /// Resume after an `error` event from where the upload stopped.
    ///
    /// If every block was uploaded and only the commit failed, the commit is
    /// attempted again. Retrying a committed upload does nothing.
    pub async fn retry(&mut self) -> UploadState {
        self.advance().await
    }

    async fn advance(&mut self) -> UploadState {
        if let Some(status) = self.status.filter(|_| self.session.is_committed()) {
            return UploadState::Completed { status };
        }

        let meter = Meter::new(self.session.start_clock(), self.session.size());
        debug!(session = %self.session.id(), url = %self.url, offset = self.session.offset(), "uploading blocks");

        while self.session.remaining() > 0 {
            if self.cancel.is_cancelled() {
                self.sink.on_error(Error::cancelled());
                return UploadState::Failed;
            }

            let Some(block) = self.session.begin_block() else {
                break;
            };

            match self.upload_block(&block).await {
                Ok(()) => {
                    self.session.acknowledge(block.len());
                    self.last_progress = meter.block_progress(self.session.uploaded());
                    trace!(session = %self.session.id(), sequence = block.sequence, progress = self.last_progress.progress, "block acknowledged");
                    self.sink.on_progress(self.last_progress);
                }
                Err(e) => {
                    warn!(session = %self.session.id(), sequence = block.sequence, error = %e, "block failed");
                    self.session.rollback();
                    self.sink.on_error(e);
                    return UploadState::Failed;
                }
            }
        }

        self.sink.on_progress(self.last_progress);
        tokio::select! {
            _ = self.cancel.cancelled() => {
                self.sink.on_error(Error::cancelled());
                return UploadState::Failed;
            }
            _ = tokio::time::sleep(self.config.commit_delay) => {}
        }
        self.commit().await
    }

    async fn upload_block(&self, block: &Block) -> Result<()> {
        let body = self.file.read_range(block.range.clone()).await?;
        let put = PutBlockRequest::new(
            &self.url,
            block.id.clone(),
            self.file.content_type(),
            body,
        );
        trace!(session = %self.session.id(), block = %put.id(), bytes = block.len(), "sending block");
        let req = put.into_request()?;

        let resp = retry::execute(&self.client, &req, self.config.retry, &self.cancel).await?;
        if !resp.is_ok() {
            return Err(Error::status_code(req.url(), resp.status));
        }
        Ok(())
    }

    async fn commit(&mut self) -> UploadState {
        let list = PutBlockListRequest::new(
            &self.url,
            self.session.block_ids().clone(),
            self.file.content_type(),
        );
        let count = list.blocks().count();
        let sent = async {
            let req = list.into_request()?;
            let resp = retry::execute(&self.client, &req, self.config.retry, &self.cancel).await?;
            if !resp.is_ok() {
                return Err(Error::status_code(req.url(), resp.status));
            }
            Ok::<_, Error>(resp)
        };

        match sent.await {
            Ok(resp) => {
                debug!(session = %self.session.id(), blocks = count, status = resp.status, "committed block list");
                self.session.set_committed();
                self.status = Some(resp.status);
                self.sink.on_progress(Progress::done());
                self.sink.on_completed(Completed {
                    status: resp.status,
                });
                UploadState::Completed {
                    status: resp.status,
                }
            }
            Err(e) => {
                warn!(session = %self.session.id(), blocks = count, error = %e, "commit failed");
                self.session.set_failed(true);
                self.sink.on_error(Error::commit(count, e));
                UploadState::CommitFailed
            }
        }
    }
}
