//! Typed service configuration handed to `initialize`.

use crate::error::{ConfigError, ConfigResult};
use conduit_types::{ParameterMap, ValidationResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::info;

/// Configuration of one service instance.
///
/// `settings` is the open-ended part: binding-specific entries such as
/// `FilePath` that also serve as defaults for per-call verb parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub service_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub settings: ParameterMap,
}

impl ServiceConfig {
    pub fn new(service_id: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
            name: None,
            description: None,
            settings: ParameterMap::new(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.settings.insert(key, value);
        self
    }

    /// Typed setting lookup with a fallback.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.settings.get_or(key, default)
    }

    /// Display name, falling back to the service id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.service_id)
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::success();
        if self.service_id.trim().is_empty() {
            result.add("service_id", "service id must not be empty");
        }
        result
    }

    /// `call` with every setting it lacks filled in. Call values win.
    ///
    /// Each `exclusive` group lists keys that replace each other: once the
    /// call supplies one member, the configured values of the other members
    /// are left out.
    pub fn layered(&self, call: &ParameterMap, exclusive: &[&[&str]]) -> ParameterMap {
        let displaced = |key: &str| {
            exclusive.iter().any(|group| {
                group.contains(&key)
                    && group.iter().any(|other| *other != key && call.is_present(other))
            })
        };
        let mut merged = call.clone();
        merged.fill_defaults(
            self.settings
                .iter()
                .filter(|(key, _)| !displaced(key.as_str()))
                .map(|(key, value)| (key.as_str(), value)),
        );
        merged
    }

    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(contents)?;
        if !config.validate().is_valid() {
            return Err(ConfigError::Invalid(config.validate().summary()));
        }
        Ok(config)
    }

    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        info!(service_id = %config.service_id, "Loaded service configuration from {:?}", path);
        Ok(config)
    }
}
