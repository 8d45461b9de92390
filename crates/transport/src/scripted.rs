//! Scripted in-memory transport for tests
//!
//! Responses are queued per URL and consumed in order. Every request is
//! recorded before it is answered, so tests can assert on call counts and on
//! the exact headers that were sent. An unscripted URL (or an exhausted queue)
//! answers with `TransportError::Connect`, which looks like an unreachable
//! server to the caller.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::{HttpRequest, HttpResponse, Result, Transport, TransportError};

type Script = VecDeque<Result<HttpResponse>>;

#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, Script>>,
    requests: Mutex<Vec<HttpRequest>>,
    latency: Mutex<Duration>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next request to `url`.
    pub fn respond(&self, url: &str, response: HttpResponse) -> &Self {
        self.push(url, Ok(response))
    }

    /// Queue a transport failure for the next request to `url`.
    pub fn fail(&self, url: &str, error: TransportError) -> &Self {
        self.push(url, Err(error))
    }

    /// Delay every answer, keeping requests in flight long enough for
    /// concurrent callers to pile up behind them.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap_or_else(PoisonError::into_inner) = latency;
    }

    /// All requests seen so far, in arrival order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests sent to `url`.
    pub fn calls_to(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.url == url)
            .count()
    }

    /// Total number of requests across all URLs.
    pub fn total_calls(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn push(&self, url: &str, entry: Result<HttpResponse>) -> &Self {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(url.to_string())
            .or_default()
            .push_back(entry);
        self
    }

    fn next(&self, url: &str) -> Result<HttpResponse> {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(url)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(TransportError::Connect(format!(
                    "no scripted response for {url}"
                )))
            })
    }
}

impl Transport for ScriptedTransport {
    fn id(&self) -> &str {
        "scripted"
    }

    fn execute(
        &self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send + '_>> {
        Box::pin(async move {
            let url = request.url.clone();
            self.requests
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(request);

            let latency = *self.latency.lock().unwrap_or_else(PoisonError::into_inner);
            if latency.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(latency).await;
            }
            self.next(&url)
        })
    }
}
