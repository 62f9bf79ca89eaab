use crate::errors::TransportError;
use async_trait::async_trait;
use bytes::Bytes;
use http::StatusCode;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, SystemTime};

pub struct HttpRequest {
    pub url: String,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// Work handed to the one-shot fetch timer.
pub type FetchTask = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Handle to an armed fetch timer. Dropping it cancels a pending fire.
pub struct TimerHandle {
    abort: Option<tokio::task::AbortHandle>,
}

impl TimerHandle {
    pub fn noop() -> Self {
        Self { abort: None }
    }

    pub fn from_task(abort: tokio::task::AbortHandle) -> Self {
        Self { abort: Some(abort) }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if let Some(abort) = self.abort.take() {
            abort.abort();
        }
    }
}

/// Boundary between the manager and the outside world: HTTP execution, the
/// one-shot fetch timer, and the wall clock. Tests substitute a mock with
/// canned responses, a manually fired timer, and injected instants.
#[async_trait]
pub trait Environment: Clone + Send + Sync + 'static {
    /// Submit one HTTP request and resolve with its status and raw body.
    async fn run_http_request(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Arm a timer that runs `task` once after `delay`.
    fn schedule_fetch(&self, delay: Duration, task: FetchTask) -> TimerHandle;

    fn now(&self) -> SystemTime;
}

#[derive(Clone)]
pub struct TokioEnvironment {
    client: reqwest::Client,
}

impl TokioEnvironment {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for TokioEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Environment for TokioEnvironment {
    async fn run_http_request(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .get(&request.url)
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }

    fn schedule_fetch(&self, delay: Duration, task: FetchTask) -> TimerHandle {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
        TimerHandle::from_task(handle.abort_handle())
    }

    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}
