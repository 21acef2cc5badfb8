//! Outcomes of the import / process / export verbs.
//!
//! Each result is built through `success` or `failure` and is never
//! partially filled: a success has no error message, a failure has a
//! non-empty message and no payload. Deserialization enforces the same.

use chrono::{DateTime, Utc};
use conduit_types::{ErrorCode, Failure};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

type Details = HashMap<String, Value>;

fn failure_details(failure: &Failure) -> Details {
    let codes: Vec<Value> = failure
        .errors()
        .iter()
        .map(|e| Value::String(e.code().to_string()))
        .collect();
    HashMap::from([("error_codes".to_string(), Value::Array(codes))])
}

fn failure_message(message: String, code: ErrorCode) -> String {
    if message.trim().is_empty() {
        code.description().to_string()
    } else {
        message
    }
}

/// Wire shape shared by the three results before the success/failure
/// invariants are checked.
#[derive(Deserialize)]
struct RawResult {
    is_success: bool,
    completed_at: DateTime<Utc>,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    details: Details,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    payload: Option<Value>,
}

impl RawResult {
    /// Rejects shapes the `success`/`failure` constructors cannot produce.
    fn checked(&self, value: &Option<Value>) -> Result<(), &'static str> {
        match (self.is_success, self.error_message.as_deref()) {
            (true, Some(_)) => Err("a successful result carries no error message"),
            (false, None) => Err("a failed result needs an error message"),
            (false, Some(message)) if message.trim().is_empty() => {
                Err("a failed result needs an error message")
            }
            (false, Some(_)) if value.is_some() => Err("a failed result carries no payload"),
            _ => Ok(()),
        }
    }
}

/// Outcome of an import, carrying the imported payload on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawResult")]
pub struct ImportResult {
    is_success: bool,
    completed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    details: Details,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl ImportResult {
    pub fn success(data: Value) -> Self {
        Self {
            is_success: true,
            completed_at: Utc::now(),
            error_message: None,
            details: HashMap::new(),
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            is_success: false,
            completed_at: Utc::now(),
            error_message: Some(failure_message(message.into(), ErrorCode::ImportError)),
            details: HashMap::new(),
            data: None,
        }
    }

    /// A failure whose message and `error_codes` detail come from `failure`.
    pub fn from_failure(failure: &Failure) -> Self {
        Self {
            details: failure_details(failure),
            ..Self::failure(failure.message())
        }
    }

    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.is_success
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<Value> {
        self.data
    }
}

/// Outcome of an export. Carries a payload only when the export produced
/// one (e.g. a branch merge).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawResult")]
pub struct ExportResult {
    is_success: bool,
    completed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    details: Details,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
}

impl ExportResult {
    pub fn success() -> Self {
        Self {
            is_success: true,
            completed_at: Utc::now(),
            error_message: None,
            details: HashMap::new(),
            payload: None,
        }
    }

    pub fn success_with_payload(payload: Value) -> Self {
        Self {
            payload: Some(payload),
            ..Self::success()
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            is_success: false,
            completed_at: Utc::now(),
            error_message: Some(failure_message(message.into(), ErrorCode::ExportError)),
            details: HashMap::new(),
            payload: None,
        }
    }

    pub fn from_failure(failure: &Failure) -> Self {
        Self {
            details: failure_details(failure),
            ..Self::failure(failure.message())
        }
    }

    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.is_success
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }
}

/// Outcome of a processing step, carrying the transformed payload on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawResult")]
pub struct ProcessingResult {
    is_success: bool,
    completed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    details: Details,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl ProcessingResult {
    pub fn success(data: Value) -> Self {
        Self {
            is_success: true,
            completed_at: Utc::now(),
            error_message: None,
            details: HashMap::new(),
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            is_success: false,
            completed_at: Utc::now(),
            error_message: Some(failure_message(message.into(), ErrorCode::ProcessingError)),
            details: HashMap::new(),
            data: None,
        }
    }

    pub fn from_failure(failure: &Failure) -> Self {
        Self {
            details: failure_details(failure),
            ..Self::failure(failure.message())
        }
    }

    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.is_success
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<Value> {
        self.data
    }
}

impl TryFrom<RawResult> for ImportResult {
    type Error = &'static str;

    fn try_from(raw: RawResult) -> Result<Self, Self::Error> {
        raw.checked(&raw.data)?;
        Ok(Self {
            is_success: raw.is_success,
            completed_at: raw.completed_at,
            error_message: raw.error_message,
            details: raw.details,
            data: raw.data,
        })
    }
}

impl TryFrom<RawResult> for ExportResult {
    type Error = &'static str;

    fn try_from(raw: RawResult) -> Result<Self, Self::Error> {
        raw.checked(&raw.payload)?;
        Ok(Self {
            is_success: raw.is_success,
            completed_at: raw.completed_at,
            error_message: raw.error_message,
            details: raw.details,
            payload: raw.payload,
        })
    }
}

impl TryFrom<RawResult> for ProcessingResult {
    type Error = &'static str;

    fn try_from(raw: RawResult) -> Result<Self, Self::Error> {
        raw.checked(&raw.data)?;
        Ok(Self {
            is_success: raw.is_success,
            completed_at: raw.completed_at,
            error_message: raw.error_message,
            details: raw.details,
            data: raw.data,
        })
    }
}
