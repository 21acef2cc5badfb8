use chrono::{DateTime, Utc};
use conduit_types::{ContextId, ParameterMap};
use serde_json::Value;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

/// Per-operation correlation object.
///
/// One context is built for each verb call, handed by mutable reference
/// through that call, then dropped. The end time is stamped at most once.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    id: ContextId,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    correlation_id: String,
    cancellation: CancellationToken,
    state: HashMap<String, Value>,
    parameters: ParameterMap,
}

impl ExecutionContext {
    /// A fresh context whose correlation id defaults to its own id.
    pub fn new(parameters: ParameterMap) -> Self {
        let id = ContextId::new();
        Self {
            id,
            start_time: Utc::now(),
            end_time: None,
            correlation_id: id.to_string(),
            cancellation: CancellationToken::new(),
            state: HashMap::new(),
            parameters,
        }
    }

    /// Overrides the correlation id. `None` or a blank id keeps the default.
    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: Option<String>) -> Self {
        if let Some(cid) = correlation_id.filter(|c| !c.trim().is_empty()) {
            self.correlation_id = cid;
        }
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Parameters the call was made with. Read-only for the call's lifetime.
    pub fn parameters(&self) -> &ParameterMap {
        &self.parameters
    }

    pub fn is_completed(&self) -> bool {
        self.end_time.is_some()
    }

    /// Stamps the end time. Returns `false` if it was already stamped.
    pub fn complete(&mut self) -> bool {
        if self.end_time.is_some() {
            return false;
        }
        self.end_time = Some(Utc::now());
        true
    }

    /// Wall time of the call so far, or in total once completed.
    pub fn elapsed(&self) -> chrono::Duration {
        self.end_time.unwrap_or_else(Utc::now) - self.start_time
    }

    pub fn state(&self) -> &HashMap<String, Value> {
        &self.state
    }

    pub fn get_state(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    pub fn set_state(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.state.insert(key.into(), value.into());
    }
}
