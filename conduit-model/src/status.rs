use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Lifecycle state shared by every service kind.
///
/// ```text
/// NotInitialized -> Initialized -> Starting -> Running -> Stopping -> Stopped
///                                     ^                                  |
///                                     +---------------- start -----------+
/// ```
/// Any failing hook moves the service to `Error`, which only a new
/// initialize leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    #[default]
    NotInitialized,
    Initialized,
    Starting,
    Running,
    Stopping,
    Stopped,
    Error,
}

impl ServiceStatus {
    /// Whether `start` is legal from this state.
    pub const fn can_start(&self) -> bool {
        matches!(self, Self::Initialized | Self::Stopped)
    }

    /// Whether `stop` is legal from this state.
    pub const fn can_stop(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Whether `initialize` is legal from this state.
    pub const fn can_initialize(&self) -> bool {
        matches!(
            self,
            Self::NotInitialized | Self::Initialized | Self::Stopped | Self::Error
        )
    }

    /// Whether a transition is currently in flight.
    pub const fn is_transitioning(&self) -> bool {
        matches!(self, Self::Starting | Self::Stopping)
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotInitialized => "NotInitialized",
            Self::Initialized => "Initialized",
            Self::Starting => "Starting",
            Self::Running => "Running",
            Self::Stopping => "Stopping",
            Self::Stopped => "Stopped",
            Self::Error => "Error",
        };
        f.write_str(name)
    }
}

/// Immutable status snapshot, built fresh on every query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatusInfo {
    status: ServiceStatus,
    last_updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    #[serde(default)]
    properties: HashMap<String, serde_json::Value>,
}

impl ServiceStatusInfo {
    /// Builds a snapshot. `error_message` is only kept when `status` is
    /// [`ServiceStatus::Error`].
    pub fn new(
        status: ServiceStatus,
        last_updated: DateTime<Utc>,
        error_message: Option<String>,
        properties: HashMap<String, serde_json::Value>,
    ) -> Self {
        let error_message = if status == ServiceStatus::Error {
            error_message
        } else {
            None
        };
        Self {
            status,
            last_updated,
            error_message,
            properties,
        }
    }

    pub fn status(&self) -> ServiceStatus {
        self.status
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn properties(&self) -> &HashMap<String, serde_json::Value> {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&serde_json::Value> {
        self.properties.get(key)
    }
}
