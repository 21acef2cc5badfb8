//! The opaque parameter map handed to services and protocols.

use crate::{ErrorCode, Failure};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// String-keyed map of loosely-typed (JSON) values.
///
/// Components resolve the entries they need into typed options; this map
/// only offers typed access with a default and `Result`-returning lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterMap(Map<String, Value>);

impl ParameterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map from a JSON object. Returns `None` for any other value.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Whether `key` is present with a non-null value.
    pub fn is_present(&self, key: &str) -> bool {
        matches!(self.0.get(key), Some(v) if !v.is_null())
    }

    /// Reads `key` as `T`, falling back to `default` when it is absent, null,
    /// or not convertible.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.0.get(key) {
            Some(Value::Null) | None => default,
            Some(value) => serde_json::from_value(value.clone()).unwrap_or(default),
        }
    }

    /// Reads a string entry. Non-string values are not coerced.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Reads a boolean entry, accepting `true`/`false` JSON booleans as well
    /// as their string spellings (case-insensitive).
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.0.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Resolves a required entry as `T`.
    ///
    /// Fails with `PARAMETER_ERROR` when the key is absent, null, or of the
    /// wrong shape.
    pub fn require<T: DeserializeOwned>(&self, key: &str) -> crate::Result<T> {
        match self.0.get(key) {
            None | Some(Value::Null) => Err(Failure::of(
                ErrorCode::ParameterError,
                format!("required parameter '{key}' is missing"),
            )),
            Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
                Failure::of(
                    ErrorCode::ParameterError,
                    format!("parameter '{key}' has an invalid value: {e}"),
                )
            }),
        }
    }

    /// Fills in entries from `defaults` that are absent or null here.
    pub fn fill_defaults<'a>(&mut self, defaults: impl IntoIterator<Item = (&'a str, &'a Value)>) {
        for (key, value) in defaults {
            if !self.is_present(key) {
                self.0.insert(key.to_string(), value.clone());
            }
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_json(self) -> Value {
        Value::Object(self.0)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for ParameterMap {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
