//! Imports text from a file or from every matching file in a directory.

use crate::options::{FileImportOptions, ImportSource, resolved, verdict};
use async_trait::async_trait;
use conduit_model::ProtocolCapabilities;
use conduit_service::{ExecutionContext, ImportHandler, LifecycleHooks};
use conduit_types::{ErrorCode, Failure, ParameterMap, ValidationResult};
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub const FILE_PROTOCOL_ID: &str = "file";

const SOURCE_KEYS: &[&str] = &["FilePath", "Directory"];

/// Parameters: `FilePath`, or `Directory` with an optional `FilePattern`
/// (default `*`), and `Encoding`.
///
/// A single file imports as a string; a directory imports as an object
/// mapping each matching file name to its content.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileImporter;

impl FileImporter {
    pub fn new() -> Self {
        Self
    }
}

impl LifecycleHooks for FileImporter {
    /// A per-call `Directory` hides a configured `FilePath`, and the other
    /// way round.
    fn exclusive_parameters(&self) -> &[&[&str]] {
        &[SOURCE_KEYS]
    }
}

#[async_trait]
impl ImportHandler for FileImporter {
    fn protocol_id(&self) -> &str {
        FILE_PROTOCOL_ID
    }

    fn protocol_capabilities(&self) -> ProtocolCapabilities {
        ProtocolCapabilities::read_only().with_format("text")
    }

    fn validate_parameters(&self, parameters: &ParameterMap) -> ValidationResult {
        verdict(FileImportOptions::resolve(parameters))
    }

    async fn on_import(
        &self,
        parameters: &ParameterMap,
        context: &mut ExecutionContext,
    ) -> conduit_types::Result<Value> {
        let options = resolved(FileImportOptions::resolve(parameters))?;
        let cancel = context.cancellation().clone();
        match &options.source {
            ImportSource::File(path) => {
                let text = read_text(path, &options, &cancel).await?;
                context.set_state("files_read", 1);
                Ok(Value::String(text))
            }
            ImportSource::Directory { path, pattern } => {
                let mut names = list_files(path).await?;
                names.retain(|name| pattern.matches(name));
                names.sort();
                debug!(directory = ?path, pattern = pattern.as_str(), matched = names.len(), "Importing directory");

                let mut files = Map::new();
                for name in &names {
                    let text = read_text(&path.join(name), &options, &cancel).await?;
                    files.insert(name.clone(), Value::String(text));
                }
                context.set_state("files_read", names.len());
                Ok(Value::Object(files))
            }
        }
    }
}

fn check_cancelled(cancel: &CancellationToken) -> conduit_types::Result<()> {
    if cancel.is_cancelled() {
        return Err(Failure::of(ErrorCode::Cancelled, "import cancelled"));
    }
    Ok(())
}

async fn read_text(
    path: &Path,
    options: &FileImportOptions,
    cancel: &CancellationToken,
) -> conduit_types::Result<String> {
    check_cancelled(cancel)?;
    let shown = path.display().to_string();
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => Failure::of(ErrorCode::ImportError, format!("file not found: {shown}")),
        _ => Failure::of(ErrorCode::ImportError, format!("failed to read {shown}: {e}")),
    })?;
    options.encoding.decode(bytes, ErrorCode::ImportError, &shown)
}

async fn list_files(directory: &Path) -> conduit_types::Result<Vec<String>> {
    let shown = directory.display().to_string();
    let read_failure =
        |e: std::io::Error| Failure::of(ErrorCode::ImportError, format!("failed to list {shown}: {e}"));

    let mut entries = tokio::fs::read_dir(directory).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => Failure::of(
            ErrorCode::ImportError,
            format!("directory not found: {shown}"),
        ),
        _ => read_failure(e),
    })?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_failure)? {
        let is_file = entry.file_type().await.map_err(read_failure)?.is_file();
        if is_file {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(names)
}
