//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

#![allow(dead_code)]

use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use voltar_client::{
    Error, RawResponse, Result, Transport, TransportRequest, VoltarClientGeneric,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CREATE_TASK: &str = "/bypass/createTask";
pub const TASK_RESULT: &str = "/bypass/getTaskResult";
pub const SERVICES: &str = "/bypass/services";
pub const BYPASS: &str = "/bypass";

/// One scripted answer
#[derive(Debug, Clone)]
pub enum Reply {
    /// Respond with a status and JSON body
    Json(u16, Value),
    /// Fail at the connection level
    Fail(String),
}

impl Reply {
    pub fn ok(body: Value) -> Self {
        Reply::Json(200, body)
    }

    pub fn processing() -> Self {
        Reply::ok(json!({"status": "processing"}))
    }

    pub fn success(result: &str) -> Self {
        Reply::ok(json!({"status": "success", "result": result}))
    }

    pub fn created(task_id: &str) -> Self {
        Reply::ok(json!({"status": "success", "taskId": task_id, "message": "Task created"}))
    }
}

/// Scripted in-memory transport
///
/// Replies are queued per endpoint; the last queued reply for an endpoint is
/// repeated once the queue is drained. Every request is recorded.
#[derive(Debug, Default)]
pub struct FakeTransport {
    routes: Mutex<HashMap<&'static str, VecDeque<Reply>>>,
    requests: Mutex<Vec<TransportRequest>>,
    latency: Duration,
}

fn route(path: &str) -> &'static str {
    if path.starts_with(CREATE_TASK) {
        CREATE_TASK
    } else if path.starts_with(TASK_RESULT) {
        TASK_RESULT
    } else if path.starts_with(SERVICES) {
        SERVICES
    } else {
        BYPASS
    }
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every reply by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queue a reply for the endpoint `path` belongs to
    pub fn reply(self, path: &'static str, reply: Reply) -> Self {
        self.routes
            .lock()
            .unwrap()
            .entry(route(path))
            .or_default()
            .push_back(reply);
        self
    }

    /// Every request sent so far
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Total number of requests
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Number of requests to the endpoint `path` belongs to
    pub fn calls_to(&self, path: &str) -> usize {
        let target = route(path);
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| route(&r.path) == target)
            .count()
    }
}

#[async_trait::async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: TransportRequest) -> Result<RawResponse> {
        let endpoint = route(&request.path);
        self.requests.lock().unwrap().push(request);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let reply = {
            let mut routes = self.routes.lock().unwrap();
            let queue = routes.entry(endpoint).or_default();
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        };

        match reply {
            Some(Reply::Json(status, body)) => RawResponse::json(status, body).error_for_status(),
            Some(Reply::Fail(message)) => Err(Error::transport(message)),
            None => Err(Error::transport(format!("no reply scripted for {}", endpoint))),
        }
    }
}

/// Build a client over a fake transport
pub fn fake_client(transport: FakeTransport) -> VoltarClientGeneric<FakeTransport> {
    VoltarClientGeneric::with_transport("test-key", transport).unwrap()
}

/// Mock server factory
pub struct MockServerFactory;

impl MockServerFactory {
    /// Create new mock server
    pub async fn new() -> MockServer {
        MockServer::start().await
    }

    /// Serve the service catalog with `body`
    pub async fn setup_services(server: &MockServer, body: Value) {
        Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path(SERVICES))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    /// Answer `createTask` for `url` with `task_id`
    pub async fn setup_create_task(server: &MockServer, url: &str, task_id: &str) {
        Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path(CREATE_TASK))
            .and(wiremock::matchers::body_partial_json(json!({"url": url})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "taskId": task_id,
                "message": "Task created"
            })))
            .mount(server)
            .await;
    }

    /// Report `task_id` as processing for `processing_polls` polls, then resolve to `result`
    pub async fn setup_task(server: &MockServer, task_id: &str, processing_polls: u64, result: &str) {
        let task_path = format!("{}/{}", TASK_RESULT, task_id);

        if processing_polls > 0 {
            Mock::given(wiremock::matchers::method("GET"))
                .and(wiremock::matchers::path(task_path.clone()))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(json!({"status": "processing"})),
                )
                .up_to_n_times(processing_polls)
                .with_priority(1)
                .mount(server)
                .await;
        }

        Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path(task_path))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "result": result,
                "cached": false
            })))
            .with_priority(2)
            .mount(server)
            .await;
    }
}

/// Test utilities
pub struct TestUtils;

impl TestUtils {
    /// Initialize test logging
    pub fn init_logger() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter("debug")
            .try_init();
    }
}
