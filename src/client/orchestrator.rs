//! Async task orchestrator
//!
//! Turns the create/poll protocol into one call with time-bounded
//! termination:
//!
//! 1. `createTask`; anything other than `success` with a non-empty id fails
//!    with [`Error::TaskCreation`] and nothing is polled.
//! 2. The clock starts after creation. Before every poll the elapsed time is
//!    compared with the timeout, so a zero timeout fails before the first
//!    poll and a hung remote can never keep the loop alive.
//! 3. `getTaskResult`; `processing` sleeps for exactly one interval and
//!    loops, `success`/`error` return the task as-is.
//!
//! A poll already in flight when the budget runs out is allowed to finish;
//! the bound applies to loop re-entry. Polls are strictly sequential.
//!
//! Cancellation is cooperative: the token is raced against task creation,
//! every poll and every sleep.

use crate::{
    Error, Result,
    client::{operations::VoltarClientGeneric, transport::Transport},
    config::PollingSettings,
    types::{BypassRequest, Task},
};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default delay between task status checks
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_millis(1000);

/// Default budget for the whole polling loop
pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_millis(120_000);

/// Per-call polling parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Delay between consecutive status checks
    pub interval: Duration,
    /// Maximum time spent polling before giving up
    pub timeout: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLLING_INTERVAL,
            timeout: DEFAULT_TASK_TIMEOUT,
        }
    }
}

impl PollOptions {
    /// Create options with the default interval and timeout
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the polling interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the overall timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl From<&PollingSettings> for PollOptions {
    fn from(settings: &PollingSettings) -> Self {
        Self {
            interval: settings.interval(),
            timeout: settings.timeout(),
        }
    }
}

async fn cancellable<F, O>(token: &CancellationToken, operation: &str, fut: F) -> Result<O>
where
    F: Future<Output = Result<O>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => {
            warn!("Cancelled during {}", operation);
            Err(Error::cancelled(operation))
        }
        result = fut => result,
    }
}

impl<T: Transport> VoltarClientGeneric<T> {
    /// Create a task and poll it until it reaches a terminal state
    ///
    /// Returns the terminal [`Task`]; a task that ended in `error` is a
    /// successful return whose `state` says so.
    pub async fn bypass_async(&self, request: &BypassRequest, options: PollOptions) -> Result<Task> {
        self.bypass_async_with_cancel(request, options, &CancellationToken::new())
            .await
    }

    /// Like [`bypass_async`](Self::bypass_async), aborting promptly with
    /// [`Error::Cancelled`] once `cancel` fires
    pub async fn bypass_async_with_cancel(
        &self,
        request: &BypassRequest,
        options: PollOptions,
        cancel: &CancellationToken,
    ) -> Result<Task> {
        request.validate()?;

        let created = cancellable(cancel, "task creation", self.create_task(request)).await?;
        let task_id = match created.accepted_id() {
            Some(id) => id.to_string(),
            None => {
                let message = created
                    .message
                    .unwrap_or_else(|| "no task id returned".to_string());
                warn!("Task creation for {} failed: {}", request.url, message);
                return Err(Error::task_creation(message));
            }
        };

        let started = Instant::now();
        let mut polls: u32 = 0;

        loop {
            if started.elapsed() >= options.timeout {
                warn!(
                    "Task {} still processing after {} polls, giving up",
                    task_id, polls
                );
                return Err(Error::task_timeout(options.timeout.as_millis() as u64));
            }

            let task = cancellable(cancel, "task polling", self.get_task_result(&task_id)).await?;
            polls += 1;

            if task.is_terminal() {
                info!(
                    "Task {} finished as {:?} after {} polls",
                    task_id, task.state, polls
                );
                return Ok(task);
            }

            debug!("Task {} processing, sleeping {:?}", task_id, options.interval);
            cancellable(cancel, "polling interval", async {
                tokio::time::sleep(options.interval).await;
                Ok(())
            })
            .await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::transport::{RawResponse, TransportRequest};
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Answers createTask once, then replays scripted poll responses
    #[derive(Debug)]
    struct ScriptedTransport {
        created: serde_json::Value,
        polls: Mutex<VecDeque<serde_json::Value>>,
        poll_count: Mutex<u32>,
    }

    impl ScriptedTransport {
        fn new(created: serde_json::Value, polls: Vec<serde_json::Value>) -> Self {
            Self {
                created,
                polls: Mutex::new(polls.into()),
                poll_count: Mutex::new(0),
            }
        }

        fn poll_count(&self) -> u32 {
            *self.poll_count.lock().unwrap()
        }
    }

    #[async_trait::async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: TransportRequest) -> Result<RawResponse> {
            if request.path == "/bypass/createTask" {
                return Ok(RawResponse::json(200, self.created.clone()));
            }
            *self.poll_count.lock().unwrap() += 1;
            let next = self
                .polls
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| json!({"status": "processing"}));
            Ok(RawResponse::json(200, next))
        }
    }

    fn client(transport: ScriptedTransport) -> VoltarClientGeneric<ScriptedTransport> {
        VoltarClientGeneric::with_transport("key", transport).unwrap()
    }

    fn accepted() -> serde_json::Value {
        json!({"status": "success", "taskId": "t-1", "message": "created"})
    }

    #[test]
    fn test_poll_options_defaults() {
        let options = PollOptions::default();
        assert_eq!(options.interval, Duration::from_millis(1000));
        assert_eq!(options.timeout, Duration::from_millis(120_000));

        let options = PollOptions::new()
            .with_interval(Duration::from_millis(10))
            .with_timeout(Duration::ZERO);
        assert_eq!(options.interval, Duration::from_millis(10));
        assert_eq!(options.timeout, Duration::ZERO);
    }

    #[test]
    fn test_poll_options_from_settings() {
        let settings = PollingSettings {
            interval_ms: 250,
            timeout_ms: 3000,
        };
        let options = PollOptions::from(&settings);
        assert_eq!(options.interval, Duration::from_millis(250));
        assert_eq!(options.timeout, Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_success_needs_one_poll() {
        let client = client(ScriptedTransport::new(
            accepted(),
            vec![json!({"status": "success", "result": "https://dest"})],
        ));

        let started = Instant::now();
        let task = client
            .bypass_async(&BypassRequest::new("https://gate.example"), PollOptions::default())
            .await
            .unwrap();

        assert_eq!(task.id, "t-1");
        assert_eq!(task.result.as_deref(), Some("https://dest"));
        assert_eq!(client.transport().poll_count(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_task_is_returned_not_raised() {
        let client = client(ScriptedTransport::new(
            accepted(),
            vec![
                json!({"status": "processing"}),
                json!({"status": "error", "message": "unsupported link"}),
            ],
        ));

        let task = client
            .bypass_async(&BypassRequest::new("https://gate.example"), PollOptions::default())
            .await
            .unwrap();

        assert_eq!(task.state, crate::types::TaskState::Error);
        assert_eq!(task.message.as_deref(), Some("unsupported link"));
        assert_eq!(client.transport().poll_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_bounds_polling() {
        let client = client(ScriptedTransport::new(accepted(), vec![]));
        let options = PollOptions::new()
            .with_interval(Duration::from_millis(100))
            .with_timeout(Duration::from_millis(350));

        let err = client
            .bypass_async(&BypassRequest::new("https://gate.example"), options)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::TaskTimeout { timeout_ms: 350 }));
        assert!(err.to_string().contains("350"));
        // polls at 0, 100, 200, 300; the check at 400 gives up
        assert_eq!(client.transport().poll_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_task_id_is_creation_error() {
        let client = client(ScriptedTransport::new(json!({"status": "success"}), vec![]));

        let err = client
            .bypass_async(&BypassRequest::new("https://gate.example"), PollOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::TaskCreation { .. }));
        assert_eq!(client.transport().poll_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_start() {
        let client = client(ScriptedTransport::new(accepted(), vec![]));
        let token = CancellationToken::new();
        token.cancel();

        let err = client
            .bypass_async_with_cancel(
                &BypassRequest::new("https://gate.example"),
                PollOptions::default(),
                &token,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Cancelled { .. }));
        assert_eq!(client.transport().poll_count(), 0);
    }
}
