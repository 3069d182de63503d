use super::UploadState;
use crate::UploadConfig;
use crate::client::request::PutBlobRequest;
use crate::client::{SendRequest as _, UploadClient};
use crate::error::{Error, Result};
use crate::event::{Completed, EventSink};
use crate::progress::Meter;
use crate::source::FileSource;

use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Upload of a whole file in a single request.
///
/// The request is not retried; a failure emits an `error` event and the
/// upload can be sent again from the start with
/// [`retry`](SingleShotUpload::retry).
#[derive(Debug)]
pub struct SingleShotUpload<F, S> {
    url: String,
    file: F,
    client: UploadClient,
    sink: Arc<S>,
    cancel: CancellationToken,
    status: Option<u16>,
}

impl<F: FileSource, S: EventSink + 'static> SingleShotUpload<F, S> {
    pub(crate) fn new(
        url: String,
        file: F,
        client: UploadClient,
        sink: Arc<S>,
        config: UploadConfig,
    ) -> Self {
        Self {
            url,
            file,
            client,
            sink,
            cancel: config.cancel,
            status: None,
        }
    }

    /// Replace the token checked for cancellation, e.g. to send a file whose
    /// upload was cancelled.
    pub fn set_cancellation_token(&mut self, token: CancellationToken) {
        self.cancel = token;
    }

    /// Upload the file.
    pub async fn start(&mut self) -> UploadState {
        if let Some(status) = self.status {
            return UploadState::Completed { status };
        }

        match self.send().await {
            Ok(status) => {
                debug!(url = %self.url, status, "uploaded file in one request");
                self.status = Some(status);
                self.sink.on_completed(Completed { status });
                UploadState::Completed { status }
            }
            Err(e) => {
                warn!(url = %self.url, error = %e, "single request upload failed");
                self.sink.on_error(e);
                UploadState::Failed
            }
        }
    }

    /// Send the whole file again after an `error` event.
    pub async fn retry(&mut self) -> UploadState {
        self.start().await
    }

    async fn send(&self) -> Result<u16> {
        if self.cancel.is_cancelled() {
            return Err(Error::cancelled());
        }

        let body = self.file.read_all().await?;
        let meter = Meter::new(Instant::now(), body.len() as u64);
        let sink = Arc::clone(&self.sink);
        let req = PutBlobRequest::new(&self.url, self.file.content_type(), body)
            .into_request()?
            .on_progress(Arc::new(move |sent, _| {
                sink.on_progress(meter.request_progress(sent));
            }));

        let resp = self.client.send_request(req.clone()).await?;
        if !resp.is_ok() {
            return Err(Error::status_code(req.url(), resp.status));
        }
        Ok(resp.status)
    }
}
