//! The `file` protocol and its handler.

use crate::file_importer::FILE_PROTOCOL_ID;
use crate::options::Encoding;
use async_trait::async_trait;
use conduit_protocol::{
    ParameterType, Protocol, ProtocolExecutionContext, ProtocolHandler, ProtocolParameter,
    ProtocolRuntime, validate_parameters,
};
use conduit_types::{ErrorCode, Failure, ParameterMap, ValidationResult};
use serde::Deserialize;
use serde_json::{Value, json};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum FileOperation {
    Read,
    Write,
    Append,
    List,
}

/// Execution input: `{operation, path, content}`.
#[derive(Debug, Deserialize)]
struct FileRequest {
    operation: FileOperation,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

/// File access rooted at `BasePath`.
///
/// Request paths are relative to the base path and may not leave it.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileProtocol;

impl FileProtocol {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Protocol for FileProtocol {
    fn id(&self) -> &str {
        FILE_PROTOCOL_ID
    }

    fn name(&self) -> &str {
        "File Protocol"
    }

    fn version(&self) -> &str {
        "1.0"
    }

    fn parameters(&self) -> Vec<ProtocolParameter> {
        vec![
            ProtocolParameter::required("BasePath", ParameterType::String)
                .with_description("Directory every request path is resolved against"),
            ProtocolParameter::optional("Encoding", ParameterType::String)
                .with_default("utf-8")
                .with_description("utf-8 or ascii"),
        ]
    }

    fn validate_parameters(&self, parameters: &ParameterMap) -> ValidationResult {
        let mut result = validate_parameters(&self.parameters(), parameters);
        if let Some(name) = parameters.get_str("Encoding") {
            if Encoding::parse(name).is_none() {
                result.add("Encoding", format!("unsupported encoding '{name}'"));
            }
        }
        result
    }

    async fn on_initialize(
        &self,
        parameters: &ParameterMap,
        _cancel: &CancellationToken,
    ) -> conduit_types::Result<()> {
        let base = parameters.require::<String>("BasePath")?;
        let metadata = tokio::fs::metadata(&base).await.map_err(|e| {
            Failure::of(
                ErrorCode::InitializationError,
                format!("base path {base} is not accessible: {e}"),
            )
        })?;
        if !metadata.is_dir() {
            return Err(Failure::of(
                ErrorCode::InitializationError,
                format!("base path {base} is not a directory"),
            ));
        }
        Ok(())
    }

    async fn on_execute(
        &self,
        context: &mut ProtocolExecutionContext,
        parameters: &ParameterMap,
        cancel: &CancellationToken,
    ) -> conduit_types::Result<Value> {
        let request: FileRequest = match context.input_data() {
            Some(input) => serde_json::from_value(input.clone()).map_err(|e| {
                Failure::of(ErrorCode::ExecutionError, format!("invalid file request: {e}"))
            })?,
            None => {
                return Err(Failure::of(
                    ErrorCode::ExecutionError,
                    "file request is missing",
                ));
            }
        };
        if cancel.is_cancelled() {
            return Err(Failure::of(ErrorCode::Cancelled, "file operation cancelled"));
        }

        let base = PathBuf::from(parameters.require::<String>("BasePath")?);
        let encoding = parameters
            .get_str("Encoding")
            .and_then(Encoding::parse)
            .unwrap_or_default();
        let relative = request.path.as_deref().unwrap_or(".");
        let target = resolve_within(&base, relative)?;
        let shown = target.display().to_string();
        debug!(operation = ?request.operation, path = %shown, "File operation");
        context.set_state("operation", format!("{:?}", request.operation).to_lowercase());

        match request.operation {
            FileOperation::Read => {
                let bytes = tokio::fs::read(&target).await.map_err(|e| io_failure(&shown, e))?;
                encoding
                    .decode(bytes, ErrorCode::ExecutionError, &shown)
                    .map(Value::String)
            }
            FileOperation::Write | FileOperation::Append => {
                let content = request.content.unwrap_or_default();
                let bytes = encoding.encode(&content, ErrorCode::ExecutionError, &shown)?;
                let mut open = tokio::fs::OpenOptions::new();
                if request.operation == FileOperation::Append {
                    open.create(true).append(true);
                } else {
                    open.create(true).write(true).truncate(true);
                }
                let mut file = open.open(&target).await.map_err(|e| io_failure(&shown, e))?;
                file.write_all(bytes).await.map_err(|e| io_failure(&shown, e))?;
                file.flush().await.map_err(|e| io_failure(&shown, e))?;
                Ok(json!({"bytes_written": bytes.len()}))
            }
            FileOperation::List => {
                let mut entries = tokio::fs::read_dir(&target)
                    .await
                    .map_err(|e| io_failure(&shown, e))?;
                let mut names = Vec::new();
                while let Some(entry) = entries.next_entry().await.map_err(|e| io_failure(&shown, e))? {
                    names.push(entry.file_name().to_string_lossy().into_owned());
                }
                names.sort();
                Ok(json!(names))
            }
        }
    }
}

fn io_failure(shown: &str, error: std::io::Error) -> Failure {
    let message = match error.kind() {
        ErrorKind::NotFound => format!("not found: {shown}"),
        _ => format!("{shown}: {error}"),
    };
    Failure::of(ErrorCode::ExecutionError, message)
}

/// Joins `relative` onto `base`, refusing absolute paths and `..`.
fn resolve_within(base: &Path, relative: &str) -> conduit_types::Result<PathBuf> {
    let candidate = Path::new(relative);
    let escapes = candidate
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
    if escapes {
        return Err(Failure::of(
            ErrorCode::ExecutionError,
            format!("path '{relative}' escapes the base path"),
        ));
    }
    Ok(base.join(candidate))
}

/// Handles operations for the `file` protocol by executing the protocol.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileProtocolHandler;

impl FileProtocolHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProtocolHandler for FileProtocolHandler {
    fn handler_id(&self) -> &str {
        "file-handler"
    }

    fn supported_protocols(&self) -> Vec<String> {
        vec![FILE_PROTOCOL_ID.to_string()]
    }

    async fn on_handle(
        &self,
        protocol: &ProtocolRuntime,
        context: &mut ProtocolExecutionContext,
        cancel: &CancellationToken,
    ) -> conduit_types::Result<Value> {
        protocol.execute(Some(context), cancel).await
    }
}
