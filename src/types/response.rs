//! Response type definitions
//!
//! Client-side result shapes. These always carry an explicit status, whichever
//! envelope the remote answered with; decoding lives in
//! [`crate::client::normalize`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Terminal status of a bypass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BypassStatus {
    /// The remote resolved the URL
    Success,
    /// The remote could not resolve the URL
    Error,
}

/// Terminal outcome of a synchronous bypass or a completed task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BypassResult {
    /// Outcome status
    pub status: BypassStatus,

    /// Resolved destination; present iff `status` is `Success`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,

    /// Remote message, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Whether the remote answered from its cache
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
}

impl BypassResult {
    /// Create a successful result
    pub fn success(result: impl Into<String>) -> Self {
        Self {
            status: BypassStatus::Success,
            result: Some(result.into()),
            message: None,
            cached: None,
        }
    }

    /// Create an error result
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: BypassStatus::Error,
            result: None,
            message: Some(message.into()),
            cached: None,
        }
    }

    /// Set the cached flag
    pub fn with_cached(mut self, cached: bool) -> Self {
        self.cached = Some(cached);
        self
    }

    /// Check whether the bypass succeeded
    pub fn is_success(&self) -> bool {
        self.status == BypassStatus::Success
    }
}

/// Observed state of a remote task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    /// Still being resolved by the remote
    Processing,
    /// Resolved
    Success,
    /// Failed
    Error,
}

impl TaskState {
    /// Check if no further transitions can happen
    pub fn is_terminal(self) -> bool {
        !matches!(self, TaskState::Processing)
    }
}

/// Snapshot of a remote task as returned by `getTaskResult`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Remote-assigned task id
    #[serde(rename = "taskId")]
    pub id: String,

    /// Current state
    #[serde(rename = "status")]
    pub state: TaskState,

    /// Resolved destination; present iff `state` is `Success`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,

    /// Remote message, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Whether the remote answered from its cache
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
}

impl Task {
    /// Check if the task reached `Success` or `Error`
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Convert a terminal task into a [`BypassResult`]
    ///
    /// Returns `None` while the task is still processing.
    pub fn into_result(self) -> Option<BypassResult> {
        let status = match self.state {
            TaskState::Processing => return None,
            TaskState::Success => BypassStatus::Success,
            TaskState::Error => BypassStatus::Error,
        };
        Some(BypassResult {
            status,
            result: self.result,
            message: self.message,
            cached: self.cached,
        })
    }
}

/// Outcome of `createTask`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCreated {
    /// Whether the remote accepted the task
    pub status: BypassStatus,

    /// Remote-assigned id, expected when `status` is `Success`
    #[serde(rename = "taskId", skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,

    /// Remote message, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TaskCreated {
    /// The task id when creation succeeded with a usable id
    pub fn accepted_id(&self) -> Option<&str> {
        match (self.status, self.task_id.as_deref()) {
            (BypassStatus::Success, Some(id)) if !id.trim().is_empty() => Some(id),
            _ => None,
        }
    }
}

/// Providers the remote currently knows how to bypass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCatalog {
    /// Ad-link providers
    pub adlinks: BTreeSet<String>,
    /// Key-system providers
    pub keysystems: BTreeSet<String>,
}

impl ServiceCatalog {
    /// Check whether a provider appears in either category (case-insensitive)
    pub fn supports(&self, name: &str) -> bool {
        let name = name.trim().to_lowercase();
        self.adlinks
            .iter()
            .chain(self.keysystems.iter())
            .any(|s| s.to_lowercase() == name)
    }

    /// Total number of providers
    pub fn len(&self) -> usize {
        self.adlinks.len() + self.keysystems.len()
    }

    /// Check whether the catalog lists nothing
    pub fn is_empty(&self) -> bool {
        self.adlinks.is_empty() && self.keysystems.is_empty()
    }
}
