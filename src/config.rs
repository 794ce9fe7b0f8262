//! Configuration for the resolver and the query runtime.
//!
//! Every field has a default, so an empty JSON object is a valid config.
//! Call [`OrgPolicyConfig::validate`] (done by the loaders) before use.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::attribute::MANAGER_POSITION;
use crate::error::ConfigError;

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.into(),
    }
}

/// Resolver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PolicyConfig {
    /// Property on a position-kind record naming the manager position.
    pub manager_attribute: String,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            manager_attribute: MANAGER_POSITION.to_string(),
        }
    }
}

impl PolicyConfig {
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.manager_attribute.trim().is_empty() {
            return Err(invalid("policy.managerAttribute", "must not be empty"));
        }
        Ok(self)
    }
}

/// Query runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuntimeConfig {
    /// Number of worker threads.
    pub workers: usize,
    /// Maximum queued queries before submissions are rejected.
    pub queue_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 1024,
        }
    }
}

impl RuntimeConfig {
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.workers == 0 {
            return Err(invalid("runtime.workers", "must be at least 1"));
        }
        if self.queue_capacity == 0 {
            return Err(invalid("runtime.queueCapacity", "must be at least 1"));
        }
        Ok(self)
    }
}

/// Top-level configuration file.
///
/// ```
/// use orgpolicy::OrgPolicyConfig;
///
/// let cfg = OrgPolicyConfig::from_json_str(r#"{"runtime": {"workers": 2}}"#).unwrap();
/// assert_eq!(cfg.runtime.workers, 2);
/// assert_eq!(cfg.runtime.queue_capacity, 1024);
/// assert_eq!(cfg.policy.manager_attribute, "managerPosition");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrgPolicyConfig {
    /// Resolver settings.
    pub policy: PolicyConfig,
    /// Worker pool settings.
    pub runtime: RuntimeConfig,
}

impl OrgPolicyConfig {
    /// Validates every section.
    pub fn validate(self) -> Result<Self, ConfigError> {
        Ok(Self {
            policy: self.policy.validate()?,
            runtime: self.runtime.validate()?,
        })
    }

    /// Parses and validates a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()
    }

    /// Reads, parses and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }
}
