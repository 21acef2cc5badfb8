use chrono::{DateTime, Utc};
use conduit_types::{ContextId, ParameterMap};
use serde_json::Value;
use std::collections::HashMap;

/// Per-call context for one protocol execution.
///
/// Created by the caller, passed by mutable reference through one
/// execution, then discarded. The end time is stamped at most once.
#[derive(Debug, Clone)]
pub struct ProtocolExecutionContext {
    id: ContextId,
    input_data: Option<Value>,
    parameters: ParameterMap,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    state: HashMap<String, Value>,
}

impl ProtocolExecutionContext {
    pub fn new(input_data: Option<Value>) -> Self {
        Self {
            id: ContextId::new(),
            input_data,
            parameters: ParameterMap::new(),
            start_time: Utc::now(),
            end_time: None,
            state: HashMap::new(),
        }
    }

    /// Per-call parameters, distinct from the protocol's initialization
    /// parameters.
    #[must_use]
    pub fn with_parameters(mut self, parameters: ParameterMap) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn input_data(&self) -> Option<&Value> {
        self.input_data.as_ref()
    }

    pub fn parameters(&self) -> &ParameterMap {
        &self.parameters
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
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
