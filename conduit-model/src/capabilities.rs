use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What a binding's transport supports.
///
/// Pure data. Callers consult it before invoking an operation; verb
/// operations do not enforce it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProtocolCapabilities {
    pub supports_reading: bool,
    pub supports_writing: bool,
    pub supports_appending: bool,
    pub supports_listing: bool,
    pub supports_searching: bool,
    pub supports_merging: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supported_formats: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub additional: HashMap<String, serde_json::Value>,
}

impl ProtocolCapabilities {
    /// Read (and list) only.
    pub fn read_only() -> Self {
        Self {
            supports_reading: true,
            supports_listing: true,
            ..Self::default()
        }
    }

    /// Write only.
    pub fn write_only() -> Self {
        Self {
            supports_writing: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_appending(mut self, supported: bool) -> Self {
        self.supports_appending = supported;
        self
    }

    #[must_use]
    pub fn with_searching(mut self, supported: bool) -> Self {
        self.supports_searching = supported;
        self
    }

    #[must_use]
    pub fn with_merging(mut self, supported: bool) -> Self {
        self.supports_merging = supported;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.supported_formats.push(format.into());
        self
    }

    #[must_use]
    pub fn with_additional(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.additional.insert(key.into(), value.into());
        self
    }
}
