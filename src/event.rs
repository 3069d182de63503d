//! Notifications an upload emits while it runs.
use crate::error::Error;

use futures::channel::mpsc::UnboundedSender;
use serde::Serialize;
use std::sync::Arc;

/// Receiver of the `progress`, `completed` and `error` notifications of an
/// upload.
///
/// Nothing returned by the sink is consulted, so implementations should not
/// block.
pub trait EventSink: Send + Sync {
    /// More of the upload has been acknowledged by the remote endpoint.
    fn on_progress(&self, progress: Progress);

    /// The upload finished and the object exists at the destination.
    fn on_completed(&self, completed: Completed);

    /// The upload stopped because of `error`.
    ///
    /// A chunked upload can be resumed from where it stopped with `retry`.
    fn on_error(&self, error: Error);
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn on_progress(&self, progress: Progress) {
        (**self).on_progress(progress)
    }

    fn on_completed(&self, completed: Completed) {
        (**self).on_completed(completed)
    }

    fn on_error(&self, error: Error) {
        (**self).on_error(error)
    }
}

/// Payload of a `progress` event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Progress {
    /// Percentage of the upload that is complete, between 0 and 100.
    pub progress: f64,
    /// Estimated number of seconds until the upload is complete, when there
    /// is enough information to compute it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated: Option<u64>,
}

impl Progress {
    /// Create a new `Progress`.
    pub fn new(progress: f64, estimated: Option<u64>) -> Self {
        Self {
            progress,
            estimated,
        }
    }

    /// The progress of an upload that has been committed.
    pub fn done() -> Self {
        Self::new(100.0, None)
    }
}

/// Payload of a `completed` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Completed {
    /// The HTTP status of the response that completed the upload.
    pub status: u16,
}

/// An event emitted by an upload, for sinks that forward events elsewhere.
#[derive(Debug)]
pub enum Event {
    /// A `progress` event.
    Progress(Progress),
    /// A `completed` event.
    Completed(Completed),
    /// An `error` event.
    Error(Error),
}

impl Event {
    /// The name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Progress(_) => "progress",
            Self::Completed(_) => "completed",
            Self::Error(_) => "error",
        }
    }
}

/// Events are sent on the channel; a closed receiver drops them.
impl EventSink for UnboundedSender<Event> {
    fn on_progress(&self, progress: Progress) {
        let _ = self.unbounded_send(Event::Progress(progress));
    }

    fn on_completed(&self, completed: Completed) {
        let _ = self.unbounded_send(Event::Completed(completed));
    }

    fn on_error(&self, error: Error) {
        let _ = self.unbounded_send(Event::Error(error));
    }
}
