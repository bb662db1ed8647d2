//! In-process transport for tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;

use super::transport::{HttpRequest, HttpResponse, Transport, TransportError};

pub(crate) struct FakeTransport {
    outcome: Result<HttpResponse, TransportError>,
    delay: Option<Duration>,
    requests: Mutex<Vec<HttpRequest>>,
    completed: AtomicBool,
}

impl FakeTransport {
    fn build(outcome: Result<HttpResponse, TransportError>, delay: Option<Duration>) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            delay,
            requests: Mutex::new(Vec::new()),
            completed: AtomicBool::new(false),
        })
    }

    pub fn responding(status: u16, body: &str) -> Arc<Self> {
        Self::build(Ok(HttpResponse::new(status, body)), None)
    }

    pub fn failing(error: TransportError) -> Arc<Self> {
        Self::build(Err(error), None)
    }

    /// Responds only after `delay` has elapsed on the tokio clock
    pub fn delayed(delay: Duration, status: u16, body: &str) -> Arc<Self> {
        Self::build(Ok(HttpResponse::new(status, body)), Some(delay))
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Whether a response was ever handed back to the caller
    pub fn completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }
}

impl Transport for FakeTransport {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, TransportError>> {
        self.requests.lock().unwrap().push(request);
        async move {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.completed.store(true, Ordering::SeqCst);
            self.outcome.clone()
        }
        .boxed()
    }
}
