//! Bypass operations
//!
//! The four single-request remote calls. Each validates its input locally,
//! sends exactly one request through the [`Transport`], and normalizes the
//! response. Failures carry a prefix naming the operation.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use voltar_client::{BypassRequest, VoltarClient};
//!
//! # tokio_test::block_on(async {
//! let client = VoltarClient::new("your-api-key")?;
//!
//! let result = client
//!     .bypass(&BypassRequest::new("https://linkvertise.com/1239053/delta-executor1"))
//!     .await?;
//! println!("Resolved to {:?}", result.result);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # });
//! ```

use crate::{
    Error, Result,
    client::{
        normalize::{TaskProgress, normalize},
        transport::{HttpTransport, Transport, TransportRequest},
    },
    config::Settings,
    types::{BypassRequest, BypassResult, ServiceCatalog, Task, TaskCreated},
};
use std::sync::Arc;
use tracing::{debug, info};

/// Header carrying the credential
pub const API_KEY_HEADER: &str = "x-api-key";

const BYPASS_PATH: &str = "/bypass";
const CREATE_TASK_PATH: &str = "/bypass/createTask";
const TASK_RESULT_PATH: &str = "/bypass/getTaskResult";
const SERVICES_PATH: &str = "/bypass/services";

// Task ids are opaque; `/`, `?` and `#` must not escape the path segment.
fn path_segment(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Opaque, non-empty API credential
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a credential, rejecting empty input
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(Error::validation("api_key", "API key is required"));
        }
        Ok(Self(key))
    }

    /// The raw credential
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Convenience type alias for the client over the HTTP transport
pub type VoltarClient = VoltarClientGeneric<HttpTransport>;

/// Client for the bypass API
///
/// Cloning is cheap; clones share the transport and its connection pool.
#[derive(Debug)]
pub struct VoltarClientGeneric<T: Transport = HttpTransport> {
    /// Credential sent with every request
    api_key: ApiKey,
    /// Transport used for every request
    transport: Arc<T>,
}

impl<T: Transport> Clone for VoltarClientGeneric<T> {
    fn clone(&self) -> Self {
        Self {
            api_key: self.api_key.clone(),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl VoltarClientGeneric<HttpTransport> {
    /// Create a client against the default endpoint
    ///
    /// Fails before any network activity when `api_key` is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::from_settings_with_key(api_key, &Settings::default())
    }

    /// Create a client against a custom base URL
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let api_key = ApiKey::new(api_key)?;
        let transport = HttpTransport::new(base_url)?;
        Ok(Self::from_parts(api_key, transport))
    }

    /// Create a client from loaded settings; the key comes from `settings.api.api_key`
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let key = settings.api.api_key.clone().unwrap_or_default();
        Self::from_settings_with_key(key, settings)
    }

    fn from_settings_with_key(api_key: impl Into<String>, settings: &Settings) -> Result<Self> {
        let api_key = ApiKey::new(api_key)?;
        let transport = HttpTransport::from_settings(settings)?;
        Ok(Self::from_parts(api_key, transport))
    }
}

impl<T: Transport> VoltarClientGeneric<T> {
    /// Create a client over a custom transport
    pub fn with_transport(api_key: impl Into<String>, transport: T) -> Result<Self> {
        Ok(Self::from_parts(ApiKey::new(api_key)?, transport))
    }

    fn from_parts(api_key: ApiKey, transport: T) -> Self {
        Self {
            api_key,
            transport: Arc::new(transport),
        }
    }

    /// The underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn request(&self, request: TransportRequest) -> TransportRequest {
        request
            .with_header(API_KEY_HEADER, self.api_key.expose())
            .with_header("content-type", "application/json")
    }

    fn bypass_body(request: &BypassRequest) -> serde_json::Value {
        serde_json::json!({ "url": request.url, "cache": request.cache })
    }

    /// Resolve a URL synchronously with `POST /bypass`
    ///
    /// The remote may block while resolving; prefer
    /// [`bypass_async`](Self::bypass_async) when a time bound matters.
    pub async fn bypass(&self, request: &BypassRequest) -> Result<BypassResult> {
        request.validate()?;
        debug!("Requesting synchronous bypass for {}", request.url);

        let raw = self
            .transport
            .send(self.request(TransportRequest::post(BYPASS_PATH).with_body(Self::bypass_body(request))))
            .await
            .map_err(|e| e.with_context("Bypass failed"))?;

        let result: BypassResult = normalize(&raw).map_err(|e| e.with_context("Bypass failed"))?;
        debug!("Bypass finished with status {:?}", result.status);
        Ok(result)
    }

    /// Submit an asynchronous task with `POST /bypass/createTask`
    pub async fn create_task(&self, request: &BypassRequest) -> Result<TaskCreated> {
        request.validate()?;
        debug!("Creating bypass task for {}", request.url);

        let raw = self
            .transport
            .send(
                self.request(
                    TransportRequest::post(CREATE_TASK_PATH).with_body(Self::bypass_body(request)),
                ),
            )
            .await
            .map_err(|e| e.with_context("Task creation failed"))?;

        let created: TaskCreated =
            normalize(&raw).map_err(|e| e.with_context("Task creation failed"))?;

        if let Some(id) = created.accepted_id() {
            info!("Created bypass task {}", id);
        }
        Ok(created)
    }

    /// Fetch the current snapshot of a task with `GET /bypass/getTaskResult/{task_id}`
    pub async fn get_task_result(&self, task_id: &str) -> Result<Task> {
        if task_id.trim().is_empty() {
            return Err(Error::validation("task_id", "Task ID is required"));
        }

        let raw = self
            .transport
            .send(self.request(TransportRequest::get(format!(
                "{}/{}",
                TASK_RESULT_PATH,
                path_segment(task_id)
            ))))
            .await
            .map_err(|e| e.with_context("Failed to get task result"))?;

        let progress: TaskProgress =
            normalize(&raw).map_err(|e| e.with_context("Failed to get task result"))?;
        debug!("Task {} is {:?}", task_id, progress.state);

        Ok(Task {
            id: task_id.to_string(),
            state: progress.state,
            result: progress.result,
            message: progress.message,
            cached: progress.cached,
        })
    }

    /// List supported providers with `GET /bypass/services`
    ///
    /// Always fetched fresh; the catalog is never cached client-side.
    pub async fn services(&self) -> Result<ServiceCatalog> {
        let raw = self
            .transport
            .send(self.request(TransportRequest::get(SERVICES_PATH)))
            .await
            .map_err(|e| e.with_context("Failed to get services"))?;

        let catalog: ServiceCatalog =
            normalize(&raw).map_err(|e| e.with_context("Failed to get services"))?;
        debug!(
            "Service catalog lists {} adlinks and {} keysystems",
            catalog.adlinks.len(),
            catalog.keysystems.len()
        );
        Ok(catalog)
    }
}
