use super::SendRequest;
use super::request::{Request, Response};
use crate::error::{Error, ErrorRepr, Result};

use bytes::Bytes;
use bytesize::ByteSize;
use futures::stream;
use reqwest::Url;
use reqwest::header::CONTENT_LENGTH;

const DEFAULT_BODY_CHUNK: ByteSize = ByteSize::kib(64);

/// HTTP client sending requests with [`reqwest`].
///
/// Bodies of requests that report progress are streamed in fixed-size
/// chunks, and progress is reported as each chunk is handed to the
/// connection. Streamed bodies are still sent with a `Content-Length`
/// header.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    chunk_size: usize,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl HttpClient {
    /// Create a new `HttpClient` from an existing `reqwest::Client`.
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            chunk_size: DEFAULT_BODY_CHUNK.as_u64() as usize,
        }
    }

    /// Set the size of the chunks a streamed body is split into.
    pub fn body_chunk_size(self, size: ByteSize) -> Self {
        Self {
            chunk_size: (size.as_u64() as usize).max(1),
            ..self
        }
    }

    fn body(&self, req: &Request) -> reqwest::Body {
        if !req.has_progress() {
            return reqwest::Body::from(req.body.clone());
        }

        let body = req.body.clone();
        let chunk_size = self.chunk_size;
        let req = req.clone();
        let chunks = (0..body.len())
            .step_by(chunk_size)
            .map(move |start| {
                let end = (start + chunk_size).min(body.len());
                let chunk: Bytes = body.slice(start..end);
                req.report_progress(end as u64);
                Ok::<_, std::io::Error>(chunk)
            });
        reqwest::Body::wrap_stream(stream::iter(chunks))
    }
}

impl SendRequest for HttpClient {
    async fn send_request(&self, req: Request) -> Result<Response> {
        let url = Url::parse(req.url()).map_err(|e| ErrorRepr::InvalidUrl {
            url: req.url().to_string(),
            reason: e.to_string(),
        })?;

        let mut builder = self.client.put(url).body(self.body(&req));
        if req.has_progress() {
            builder = builder.header(CONTENT_LENGTH, req.body.len());
        }
        for (name, value) in req.headers() {
            builder = builder.header(*name, value.as_str());
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| Error::transport(req.url(), e))?;
        Ok(Response::new(resp.status().as_u16()))
    }
}
