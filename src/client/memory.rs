use super::SendRequest;
use super::request::{Request, Response};
use crate::error::{Error, Result};

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// Outcome of a request sent to a [`MemoryClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scripted {
    /// Respond with this status.
    Status(u16),
    /// Fail before a response arrives.
    NetworkError,
}

#[derive(Debug)]
struct State {
    sent: Vec<Request>,
    script: VecDeque<Scripted>,
    default: Scripted,
}

/// For testing, a client that keeps every request it is sent in memory and
/// answers from a script.
///
/// Requests are kept without their progress callback. Once the script is
/// exhausted every request gets the default outcome, which is a
/// `201 Created` response. Clones share the same state.
#[derive(Debug, Clone)]
pub struct MemoryClient {
    state: Arc<Mutex<State>>,
}

impl Default for MemoryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryClient {
    /// Create a new `MemoryClient` that accepts everything.
    pub fn new() -> Self {
        let state = State {
            sent: Vec::new(),
            script: VecDeque::new(),
            default: Scripted::Status(201),
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Answer the next `n` requests with `outcome`, after anything already
    /// scripted.
    pub fn script(&self, n: usize, outcome: Scripted) -> &Self {
        self.lock().script.extend(std::iter::repeat_n(outcome, n));
        self
    }

    /// Answer requests with `outcome` once the script is exhausted.
    pub fn set_default(&self, outcome: Scripted) -> &Self {
        self.lock().default = outcome;
        self
    }

    /// Returns every request sent so far, including failed ones.
    pub fn requests(&self) -> Vec<Request> {
        self.lock().sent.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SendRequest for MemoryClient {
    async fn send_request(&self, req: Request) -> Result<Response> {
        let outcome = {
            let mut state = self.lock();
            state.sent.push(req.without_progress());
            let default = state.default;
            state.script.pop_front().unwrap_or(default)
        };

        match outcome {
            Scripted::Status(status) => {
                req.report_progress(req.body().len() as u64);
                Ok(Response::new(status))
            }
            Scripted::NetworkError => {
                let e = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "scripted");
                Err(Error::transport(req.url(), e))
            }
        }
    }
}
