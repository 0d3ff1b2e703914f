//! Request type definitions
//!
//! Defines the body sent to `/bypass` and `/bypass/createTask`.

use serde::{Deserialize, Serialize};

/// Request for a bypass, synchronous or task-based
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BypassRequest {
    /// The gated URL to resolve
    pub url: String,

    /// Whether the remote may answer from its own result cache
    #[serde(default = "default_cache")]
    pub cache: bool,
}

fn default_cache() -> bool {
    true
}

impl BypassRequest {
    /// Create a new request with caching allowed
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            cache: default_cache(),
        }
    }

    /// Set whether the remote may return a cached result
    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Validate the request before it reaches the network
    pub fn validate(&self) -> crate::Result<()> {
        if self.url.trim().is_empty() {
            return Err(crate::Error::validation("url", "URL is required"));
        }
        Ok(())
    }
}

impl From<&str> for BypassRequest {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for BypassRequest {
    fn from(url: String) -> Self {
        Self::new(url)
    }
}
