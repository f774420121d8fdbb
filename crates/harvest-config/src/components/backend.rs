//! Database backend settings

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default poll interval for REST subscriptions
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;

/// Default request timeout for the REST backend
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Which database adapter to build
///
/// ```toml
/// [backend]
/// type = "rest"
/// base_url = "https://api.example.com/v1"
/// poll_interval_ms = 5000
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendSettings {
    /// In-process backend, nothing survives the process
    #[default]
    Memory,
    Rest(RestSettings),
}

impl BackendSettings {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Rest(_) => "rest",
        }
    }

    pub fn as_rest(&self) -> Option<&RestSettings> {
        match self {
            Self::Rest(rest) => Some(rest),
            Self::Memory => None,
        }
    }
}

/// REST database backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestSettings {
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    /// Extra headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl RestSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: None,
            headers: BTreeMap::new(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
