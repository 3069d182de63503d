//! This module contains `SendRequest`, the single operation every request
//! of an upload goes through.
use self::inner::{BoxedSendRequest, SendRequestInner};
use self::request::{Request, Response};
use crate::error::Result;

use futures::future::Future;
use std::fmt::{self, Debug, Formatter};
use std::ops::Deref;
use std::sync::Arc;

mod inner;

mod http;
pub use http::HttpClient;

mod memory;
pub use memory::{MemoryClient, Scripted};

pub mod request;

/// `SendRequest` sends one `PUT` request and waits for its response.
///
/// Implementations return `Ok` for any response that arrives, whatever its
/// status, and an error of kind [`Network`] when the request fails before a
/// response arrives; only the latter is retried.
///
/// [`Network`]: crate::error::ErrorKind::Network
pub trait SendRequest: Send + Sync {
    /// Send the request.
    fn send_request(&self, req: Request) -> impl Future<Output = Result<Response>> + Send;
}

impl<D, T> SendRequest for T
where
    D: SendRequest,
    T: Deref<Target = D> + Send + Sync,
{
    async fn send_request(&self, req: Request) -> Result<Response> {
        self.deref().send_request(req).await
    }
}

/// `UploadClient` holds a type that can implement the interface of
/// [`SendRequest`].
#[derive(Clone)]
pub struct UploadClient {
    pub(crate) inner: Arc<dyn BoxedSendRequest + Send + Sync>,
}

impl UploadClient {
    /// Create a new `UploadClient` from a [`SendRequest`] implementation.
    pub fn new<C>(client: C) -> Self
    where
        C: SendRequest + Send + Sync + 'static,
    {
        let inner = SendRequestInner::new(client);
        Self {
            inner: Arc::new(inner),
        }
    }
}

impl SendRequest for UploadClient {
    async fn send_request(&self, req: Request) -> Result<Response> {
        self.inner.send(req).await
    }
}

impl Debug for UploadClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadClient")
            .field("inner", &"SendRequest")
            .finish()
    }
}
