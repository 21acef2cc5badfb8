//! Declared protocol parameters and validation against them.

use conduit_types::{ParameterMap, ValidationResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON shape a parameter value must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    String,
    Integer,
    Decimal,
    Boolean,
    Array,
    Object,
    /// No type constraint.
    Any,
}

impl ParameterType {
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Decimal => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
            Self::Any => true,
        }
    }
}

/// One named, typed parameter a protocol expects at initialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolParameter {
    pub name: String,
    pub parameter_type: ParameterType,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ProtocolParameter {
    pub fn required(name: impl Into<String>, parameter_type: ParameterType) -> Self {
        Self {
            name: name.into(),
            parameter_type,
            required: true,
            default_value: None,
            description: None,
        }
    }

    pub fn optional(name: impl Into<String>, parameter_type: ParameterType) -> Self {
        Self {
            required: false,
            ..Self::required(name, parameter_type)
        }
    }

    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Checks `parameters` against `declared`, reporting every violation:
/// each required parameter that is absent or null, and each present
/// parameter whose value does not match its declared type.
pub fn validate_parameters(declared: &[ProtocolParameter], parameters: &ParameterMap) -> ValidationResult {
    let mut result = ValidationResult::success();
    for param in declared {
        match parameters.get(&param.name) {
            None | Some(Value::Null) => {
                if param.required {
                    result.add(&param.name, format!("required parameter '{}' is missing", param.name));
                }
            }
            Some(value) if !param.parameter_type.accepts(value) => {
                result.add(
                    &param.name,
                    format!(
                        "parameter '{}' must be of type {:?}",
                        param.name, param.parameter_type
                    ),
                );
            }
            Some(_) => {}
        }
    }
    result
}
