//! Response normalizer
//!
//! The remote API has shipped two envelopes over time: flat records carrying
//! only `result`/`message`, and status-tagged records with an explicit
//! `status` field. Service listings likewise come either flat or wrapped in a
//! `services` object. Every shape is decoded into the same client-side type.
//!
//! Decoding is a two-step chain per type: [`Normalize::detect`] picks the
//! envelope by field presence, then the matching decoder runs. Missing
//! optional fields stay `None`.

use crate::{
    Error, Result,
    client::transport::RawResponse,
    types::{BypassResult, BypassStatus, ServiceCatalog, TaskCreated, TaskState},
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;

/// Envelope detected on a response body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// Record carrying an explicit discriminating field (`status`, or `services`)
    Tagged,
    /// Legacy record without it
    Flat,
}

/// A client-side shape that can be decoded from either envelope
pub trait Normalize: Sized {
    /// Human-readable name used in error messages
    const SHAPE: &'static str;

    /// Select the envelope; a `status` field selects [`Envelope::Tagged`]
    fn detect(body: &Value) -> Envelope {
        if body.get("status").is_some() {
            Envelope::Tagged
        } else {
            Envelope::Flat
        }
    }

    /// Decode a tagged record
    fn from_tagged(body: &Value) -> Result<Self>;

    /// Decode a flat record
    fn from_flat(body: &Value) -> Result<Self>;
}

/// Decode a successful raw response into `T`
pub fn normalize<T: Normalize>(raw: &RawResponse) -> Result<T> {
    let body = raw.body.as_json().ok_or_else(|| {
        Error::normalization(format!(
            "Expected a JSON {} but the response (status {}) had no JSON body",
            T::SHAPE,
            raw.status
        ))
    })?;

    if !body.is_object() {
        return Err(Error::normalization(format!(
            "Expected a JSON object for {}, got: {}",
            T::SHAPE,
            body
        )));
    }

    match T::detect(body) {
        Envelope::Tagged => T::from_tagged(body),
        Envelope::Flat => T::from_flat(body),
    }
}

fn parse_state(status: &str) -> Result<TaskState> {
    match status.trim().to_ascii_lowercase().as_str() {
        "success" => Ok(TaskState::Success),
        "error" => Ok(TaskState::Error),
        "processing" => Ok(TaskState::Processing),
        other => Err(Error::normalization(format!("Unknown status '{}'", other))),
    }
}

fn parse_terminal_status(status: &str, shape: &str) -> Result<BypassStatus> {
    match parse_state(status)? {
        TaskState::Success => Ok(BypassStatus::Success),
        TaskState::Error => Ok(BypassStatus::Error),
        TaskState::Processing => Err(Error::normalization(format!(
            "Unexpected status 'processing' in {}",
            shape
        ))),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn require_result(result: Option<String>, shape: &str) -> Result<String> {
    non_empty(result).ok_or_else(|| {
        Error::normalization(format!("{} reported success without a result", shape))
    })
}

#[derive(Debug, Deserialize)]
struct TaggedRecord {
    status: String,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    cached: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct FlatRecord {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    cached: Option<bool>,
}

impl FlatRecord {
    // A flat record has no status; a result implies success, a bare message an error.
    fn state(&self, shape: &str) -> Result<TaskState> {
        if non_empty(self.result.clone()).is_some() {
            Ok(TaskState::Success)
        } else if self.message.is_some() {
            Ok(TaskState::Error)
        } else {
            Err(Error::normalization(format!(
                "{} carried neither a status, a result nor a message",
                shape
            )))
        }
    }
}

impl Normalize for BypassResult {
    const SHAPE: &'static str = "bypass result";

    fn from_tagged(body: &Value) -> Result<Self> {
        let record: TaggedRecord = serde_json::from_value(body.clone())?;
        let status = parse_terminal_status(&record.status, Self::SHAPE)?;
        let result = match status {
            BypassStatus::Success => Some(require_result(record.result, Self::SHAPE)?),
            BypassStatus::Error => None,
        };
        Ok(BypassResult {
            status,
            result,
            message: record.message,
            cached: record.cached,
        })
    }

    fn from_flat(body: &Value) -> Result<Self> {
        let record: FlatRecord = serde_json::from_value(body.clone())?;
        let status = match record.state(Self::SHAPE)? {
            TaskState::Success => BypassStatus::Success,
            _ => BypassStatus::Error,
        };
        Ok(BypassResult {
            status,
            result: non_empty(record.result),
            message: record.message,
            cached: record.cached,
        })
    }
}

/// Task snapshot before the caller's task id is attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TaskProgress {
    pub state: TaskState,
    pub result: Option<String>,
    pub message: Option<String>,
    pub cached: Option<bool>,
}

impl Normalize for TaskProgress {
    const SHAPE: &'static str = "task result";

    fn from_tagged(body: &Value) -> Result<Self> {
        let record: TaggedRecord = serde_json::from_value(body.clone())?;
        let state = parse_state(&record.status)?;
        let result = match state {
            TaskState::Success => Some(require_result(record.result, Self::SHAPE)?),
            _ => None,
        };
        Ok(TaskProgress {
            state,
            result,
            message: record.message,
            cached: record.cached,
        })
    }

    fn from_flat(body: &Value) -> Result<Self> {
        let record: FlatRecord = serde_json::from_value(body.clone())?;
        let state = record.state(Self::SHAPE)?;
        Ok(TaskProgress {
            state,
            result: non_empty(record.result),
            message: record.message,
            cached: record.cached,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TaskCreatedRecord {
    #[serde(default)]
    status: Option<String>,
    #[serde(default, rename = "taskId", alias = "task_id")]
    task_id: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl Normalize for TaskCreated {
    const SHAPE: &'static str = "task creation response";

    fn from_tagged(body: &Value) -> Result<Self> {
        let record: TaskCreatedRecord = serde_json::from_value(body.clone())?;
        let status = parse_terminal_status(record.status.as_deref().unwrap_or_default(), Self::SHAPE)?;
        let task_id = match status {
            BypassStatus::Success => non_empty(record.task_id),
            BypassStatus::Error => None,
        };
        Ok(TaskCreated {
            status,
            task_id,
            message: record.message,
        })
    }

    fn from_flat(body: &Value) -> Result<Self> {
        let record: TaskCreatedRecord = serde_json::from_value(body.clone())?;
        let task_id = non_empty(record.task_id);
        let status = match (&task_id, &record.message) {
            (Some(_), _) => BypassStatus::Success,
            (None, Some(_)) => BypassStatus::Error,
            (None, None) => {
                return Err(Error::normalization(format!(
                    "{} carried neither a task id nor a message",
                    Self::SHAPE
                )));
            }
        };
        Ok(TaskCreated {
            status,
            task_id,
            message: record.message,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CatalogRecord {
    #[serde(default)]
    adlinks: Option<BTreeSet<String>>,
    #[serde(default)]
    keysystems: Option<BTreeSet<String>>,
}

impl Normalize for ServiceCatalog {
    const SHAPE: &'static str = "service catalog";

    /// A `services` wrapper selects [`Envelope::Tagged`]
    fn detect(body: &Value) -> Envelope {
        if body.get("services").is_some() {
            Envelope::Tagged
        } else {
            Envelope::Flat
        }
    }

    fn from_tagged(body: &Value) -> Result<Self> {
        match body.get("services") {
            Some(inner) if inner.is_object() => Self::from_flat(inner),
            _ => Err(Error::normalization(format!(
                "{} wrapper 'services' is not an object",
                Self::SHAPE
            ))),
        }
    }

    fn from_flat(body: &Value) -> Result<Self> {
        let record: CatalogRecord = serde_json::from_value(body.clone())?;
        if record.adlinks.is_none() && record.keysystems.is_none() {
            return Err(Error::normalization(format!(
                "{} lists neither adlinks nor keysystems",
                Self::SHAPE
            )));
        }
        Ok(ServiceCatalog {
            adlinks: record.adlinks.unwrap_or_default(),
            keysystems: record.keysystems.unwrap_or_default(),
        })
    }
}
