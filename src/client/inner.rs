use super::SendRequest;
use super::request::{Request, Response};
use crate::error::Result;

use futures::future::BoxFuture;

/// Object-safe `SendRequest`.
pub(crate) trait BoxedSendRequest: Send + Sync + 'static {
    fn send(&self, req: Request) -> BoxFuture<'_, Result<Response>>;
}

/// Implements `BoxedSendRequest` for the public `SendRequest`.
pub(super) struct SendRequestInner<T>(T);

impl<T: SendRequest> SendRequestInner<T> {
    pub(super) fn new(inner: T) -> Self {
        Self(inner)
    }
}

impl<T: SendRequest + 'static> BoxedSendRequest for SendRequestInner<T> {
    fn send(&self, req: Request) -> BoxFuture<'_, Result<Response>> {
        Box::pin(self.0.send_request(req))
    }
}
