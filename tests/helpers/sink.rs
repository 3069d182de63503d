use block_blob_upload::error::ErrorKind;
use block_blob_upload::event::{Completed, Event, EventSink, Progress};

use std::sync::{Arc, Mutex, MutexGuard};

/// Keeps every event it receives.
#[derive(Debug, Default)]
pub struct Recorder(Mutex<Vec<Event>>);

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> MutexGuard<'_, Vec<Event>> {
        self.0.lock().unwrap()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(Event::name).collect()
    }

    pub fn progress(&self) -> Vec<Progress> {
        self.events()
            .iter()
            .filter_map(|e| match e {
                Event::Progress(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    pub fn completed(&self) -> Vec<Completed> {
        self.events()
            .iter()
            .filter_map(|e| match e {
                Event::Completed(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<(ErrorKind, Option<u16>)> {
        self.events()
            .iter()
            .filter_map(|e| match e {
                Event::Error(e) => Some((e.kind(), e.status())),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events().clear();
    }
}

impl EventSink for Recorder {
    fn on_progress(&self, progress: Progress) {
        self.events().push(Event::Progress(progress));
    }

    fn on_completed(&self, completed: Completed) {
        self.events().push(Event::Completed(completed));
    }

    fn on_error(&self, error: block_blob_upload::error::Error) {
        self.events().push(Event::Error(error));
    }
}
