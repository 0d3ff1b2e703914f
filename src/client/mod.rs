//! Client for the bypass API
//!
//! Layers, leaf first:
//! - [`transport`]: one HTTP round trip per call
//! - [`normalize`]: decodes every historical response envelope into one shape
//! - [`operations`]: the four single-request calls plus client construction
//! - [`orchestrator`]: create-then-poll with interval, timeout and cancellation
//!
//! ## Examples
//!
//! ```rust,no_run
//! use voltar_client::{BypassRequest, PollOptions, VoltarClient};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let client = VoltarClient::new("your-api-key")?;
//! let options = PollOptions::new().with_timeout(Duration::from_secs(60));
//!
//! let task = client
//!     .bypass_async(&BypassRequest::new("https://linkvertise.com/1239053/delta-executor1"), options)
//!     .await?;
//! println!("Task {} finished: {:?}", task.id, task.result);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # });
//! ```

pub mod normalize;
pub mod operations;
pub mod orchestrator;
pub mod transport;

pub use operations::{API_KEY_HEADER, ApiKey, VoltarClient, VoltarClientGeneric};
pub use orchestrator::{DEFAULT_POLLING_INTERVAL, DEFAULT_TASK_TIMEOUT, PollOptions};
pub use transport::{HttpTransport, RawResponse, ResponseBody, Transport, TransportRequest};
