use crate::environment::{Environment, FetchTask, HttpRequest, HttpResponse, TimerHandle};
use crate::errors::TransportError;
use async_trait::async_trait;
use bytes::Bytes;
use http::StatusCode;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};

struct MockState {
    responses: HashMap<String, (StatusCode, String)>,
    requests: Vec<String>,
    timer: Option<FetchTask>,
    last_interval: Duration,
    now: SystemTime,
}

/// Test double for the environment port: canned HTTP responses keyed by URL,
/// a timer that fires only when the test says so, and an injectable clock.
/// URLs without a stub answer 404, mirroring a config revision the control
/// plane does not have.
#[derive(Clone)]
pub(crate) struct MockEnvironment {
    state: Arc<Mutex<MockState>>,
    timer_count: Arc<AtomicUsize>,
}

impl MockEnvironment {
    pub fn new() -> Self {
        MockEnvironment {
            state: Arc::new(Mutex::new(MockState {
                responses: HashMap::new(),
                requests: Vec::new(),
                timer: None,
                last_interval: Duration::ZERO,
                now: SystemTime::now(),
            })),
            timer_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn stub(&self, url: &str, status: StatusCode, body: &str) {
        self.state
            .lock()
            .responses
            .insert(url.to_string(), (status, body.to_string()));
    }

    pub fn clear_stubs(&self) {
        self.state.lock().responses.clear();
    }

    /// Total number of timers ever armed.
    pub fn timer_count(&self) -> usize {
        self.timer_count.load(Ordering::SeqCst)
    }

    pub fn last_interval(&self) -> Duration {
        self.state.lock().last_interval
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.lock().requests.clone()
    }

    /// Fire the armed timer and drive its fetch cycle to completion.
    pub async fn run_timer(&self) {
        let task = self
            .state
            .lock()
            .timer
            .take()
            .expect("no fetch timer armed");
        task.await;
    }
}

#[async_trait]
impl Environment for MockEnvironment {
    async fn run_http_request(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut state = self.state.lock();
        state.requests.push(request.url.clone());
        match state.responses.get(&request.url) {
            Some((status, body)) => Ok(HttpResponse {
                status: *status,
                body: Bytes::from(body.clone()),
            }),
            None => Ok(HttpResponse {
                status: StatusCode::NOT_FOUND,
                body: Bytes::new(),
            }),
        }
    }

    fn schedule_fetch(&self, delay: Duration, task: FetchTask) -> TimerHandle {
        let mut state = self.state.lock();
        state.timer = Some(task);
        state.last_interval = delay;
        self.timer_count.fetch_add(1, Ordering::SeqCst);
        TimerHandle::noop()
    }

    fn now(&self) -> SystemTime {
        self.state.lock().now
    }
}
