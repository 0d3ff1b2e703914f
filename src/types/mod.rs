//! Type definitions for the bypass client
//!
//! This module contains the request and result shapes exposed to callers.

pub mod request;
pub mod response;

pub use request::BypassRequest;
pub use response::{BypassResult, BypassStatus, ServiceCatalog, Task, TaskCreated, TaskState};
