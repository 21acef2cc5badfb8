//! Structured error records.

use crate::ErrorCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error as ThisError;

/// Reasons an [`Error`] record cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum RecordError {
    #[error("error code must not be empty")]
    EmptyCode,

    #[error("error message must not be empty")]
    EmptyMessage,
}

/// A single structured error: a machine-readable code, a human message and
/// free-form details.
///
/// Both `code` and `message` are guaranteed non-empty, including for
/// records read back from the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawError")]
pub struct Error {
    code: String,
    message: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    details: HashMap<String, serde_json::Value>,
}

impl Error {
    /// Builds an error from a free-form code and message.
    ///
    /// Fails if either is empty (whitespace-only counts as empty).
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<Self, RecordError> {
        let code = code.into();
        let message = message.into();
        if code.trim().is_empty() {
            return Err(RecordError::EmptyCode);
        }
        if message.trim().is_empty() {
            return Err(RecordError::EmptyMessage);
        }
        Ok(Self {
            code,
            message,
            details: HashMap::new(),
        })
    }

    /// Builds an error from a framework [`ErrorCode`]. Never fails: an empty
    /// message is replaced by the code's description.
    pub fn from_code(code: ErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            code.description().to_string()
        } else {
            message
        };
        Self {
            code: code.as_str().to_string(),
            message,
            details: HashMap::new(),
        }
    }

    /// Returns a copy of this error with one more detail entry.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> &HashMap<String, serde_json::Value> {
        &self.details
    }

    /// Looks up a single detail entry.
    pub fn detail(&self, key: &str) -> Option<&serde_json::Value> {
        self.details.get(key)
    }

    /// Whether this error carries the given framework code.
    pub fn has_code(&self, code: ErrorCode) -> bool {
        self.code == code.as_str()
    }
}

/// Wire shape of an [`Error`] before its invariants are checked.
#[derive(Deserialize)]
struct RawError {
    code: String,
    message: String,
    #[serde(default)]
    details: HashMap<String, serde_json::Value>,
}

impl TryFrom<RawError> for Error {
    type Error = RecordError;

    fn try_from(raw: RawError) -> Result<Self, RecordError> {
        let mut error = Self::new(raw.code, raw.message)?;
        error.details = raw.details;
        Ok(error)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for Error {}
