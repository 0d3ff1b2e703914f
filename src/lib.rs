//! Voltar bypass client
//!
//! An async client for the Voltar bypass API: given a URL guarded by an
//! ad-link or key-system gate, ask the remote service for the real
//! destination.
//!
//! # Features
//!
//! - **Synchronous bypass**: one request, one [`BypassResult`]
//! - **Task-based bypass**: create a task and poll it with a caller-chosen
//!   interval, timeout and [`CancellationToken`](tokio_util::sync::CancellationToken)
//! - **Tolerant decoding**: flat and status-tagged response envelopes, flat
//!   and wrapped service catalogs, all normalized into one set of types
//! - **Pluggable transport**: [`Transport`] is a trait, `reqwest` is the default
//!
//! # Examples
//!
//! ```rust,no_run
//! use voltar_client::{BypassRequest, PollOptions, VoltarClient};
//!
//! # async fn example() -> voltar_client::Result<()> {
//! let client = VoltarClient::new("your-api-key")?;
//!
//! let services = client.services().await?;
//! println!("{} providers supported", services.len());
//!
//! let task = client
//!     .bypass_async(&BypassRequest::new("https://linkvertise.com/1239053/delta-executor1"), PollOptions::default())
//!     .await?;
//! println!("{:?}", task.into_result());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod types;
pub mod utils;

pub use client::{
    DEFAULT_POLLING_INTERVAL, DEFAULT_TASK_TIMEOUT, HttpTransport, PollOptions, RawResponse,
    Transport, TransportRequest, VoltarClient, VoltarClientGeneric,
};
pub use config::{ConfigLoader, Settings};
pub use error::{Error, Result};
pub use types::{BypassRequest, BypassResult, BypassStatus, ServiceCatalog, Task, TaskCreated, TaskState};
