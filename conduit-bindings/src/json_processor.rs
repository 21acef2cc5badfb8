//! JSON transformations: minify, prettify, pointer extraction, flattening.

use crate::options::{JsonProcessOptions, TransformationType, resolved, verdict};
use async_trait::async_trait;
use conduit_service::{ExecutionContext, LifecycleHooks, ProcessHandler, ServiceConfig};
use conduit_types::{ErrorCode, Failure, ParameterMap, ValidationResult};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

/// Parameters: `TransformationType` (`Minify`, `Prettify`, `Extract`,
/// `Flatten`) and `Path`, a JSON pointer required by `Extract`.
///
/// Input may be JSON text or an already-parsed value. Minify and Prettify
/// produce text; Extract and Flatten produce values.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonProcessor;

impl JsonProcessor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LifecycleHooks for JsonProcessor {
    /// Rejects a configured `TransformationType` that no call could use.
    async fn on_initialize(
        &self,
        config: &ServiceConfig,
        _cancel: &CancellationToken,
    ) -> conduit_types::Result<()> {
        match config.settings.get_str("TransformationType") {
            Some(name) if TransformationType::parse(name).is_none() => Err(Failure::of(
                ErrorCode::InitializationError,
                format!("unsupported transformation '{name}'"),
            )),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl ProcessHandler for JsonProcessor {
    fn validate_parameters(&self, parameters: &ParameterMap) -> ValidationResult {
        verdict(JsonProcessOptions::resolve(parameters))
    }

    async fn on_process(
        &self,
        data: &Value,
        parameters: &ParameterMap,
        _context: &mut ExecutionContext,
    ) -> conduit_types::Result<Value> {
        let options = resolved(JsonProcessOptions::resolve(parameters))?;
        let document = parse_input(data)?;
        transform(&document, &options)
    }
}

fn parse_input(data: &Value) -> conduit_types::Result<Value> {
    match data {
        Value::String(text) => serde_json::from_str(text).map_err(|e| {
            Failure::of(ErrorCode::ProcessingError, format!("invalid JSON input: {e}"))
        }),
        other => Ok(other.clone()),
    }
}

pub(crate) fn transform(document: &Value, options: &JsonProcessOptions) -> conduit_types::Result<Value> {
    let serialization_failure =
        |e: serde_json::Error| Failure::of(ErrorCode::ProcessingError, e.to_string());
    match options.transformation {
        TransformationType::Minify => serde_json::to_string(document)
            .map(Value::String)
            .map_err(serialization_failure),
        TransformationType::Prettify => serde_json::to_string_pretty(document)
            .map(Value::String)
            .map_err(serialization_failure),
        TransformationType::Extract => {
            let pointer = options.path.as_deref().unwrap_or_default();
            document.pointer(pointer).cloned().ok_or_else(|| {
                Failure::of(
                    ErrorCode::ProcessingError,
                    format!("path '{pointer}' not found in input"),
                )
            })
        }
        TransformationType::Flatten => {
            let mut flat = Map::new();
            flatten_into(document, "", &mut flat);
            Ok(Value::Object(flat))
        }
    }
}

/// Flattens nested objects and arrays into dotted keys (`a.b.0`). Empty
/// containers are kept as leaves; a scalar root is stored under `$`.
fn flatten_into(value: &Value, prefix: &str, out: &mut Map<String, Value>) {
    let key = |segment: &str| {
        if prefix.is_empty() {
            segment.to_string()
        } else {
            format!("{prefix}.{segment}")
        }
    };
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (name, child) in map {
                flatten_into(child, &key(name), out);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (i, child) in items.iter().enumerate() {
                flatten_into(child, &key(&i.to_string()), out);
            }
        }
        leaf => {
            let name = if prefix.is_empty() { "$" } else { prefix };
            out.insert(name.to_string(), leaf.clone());
        }
    }
}
