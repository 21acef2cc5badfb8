//! Runner configuration, parsed from TOML.
//!
//! ```toml
//! [[services]]
//! service_id = "orders-in"
//! kind = "importer"
//! binding = "file"
//!
//! [services.settings]
//! FilePath = "/var/data/orders.json"
//! ```

use crate::error::{Result, RunnerError};
use conduit_service::ServiceConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Importer,
    Processor,
    Exporter,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Importer => "importer",
            Self::Processor => "processor",
            Self::Exporter => "exporter",
        };
        f.write_str(name)
    }
}

/// One hosted service: its kind, the binding implementing it, and the
/// configuration handed to `initialize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub kind: ServiceKind,
    pub binding: String,
    #[serde(flatten)]
    pub config: ServiceConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunnerConfig {
    #[serde(default)]
    pub services: Vec<ServiceEntry>,
}

impl RunnerConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| RunnerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }
}
