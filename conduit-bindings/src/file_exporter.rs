//! Writes payloads to a file.

use crate::file_importer::FILE_PROTOCOL_ID;
use crate::options::{FileExportOptions, resolved, verdict};
use async_trait::async_trait;
use conduit_model::{MergeCapabilities, MergeStrategy, ProtocolCapabilities};
use conduit_service::{ExecutionContext, ExportHandler, LifecycleHooks};
use conduit_types::{ErrorCode, Failure, ParameterMap, ValidationResult};
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Parameters: `FilePath` (required), `Append` (default `false`),
/// `Encoding`, `CreateDirectories` (default `true`).
///
/// String payloads are written verbatim; any other JSON value is written
/// in its compact serialized form.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileExporter;

impl FileExporter {
    pub fn new() -> Self {
        Self
    }
}

impl LifecycleHooks for FileExporter {}

#[async_trait]
impl ExportHandler for FileExporter {
    fn protocol_id(&self) -> &str {
        FILE_PROTOCOL_ID
    }

    fn protocol_capabilities(&self) -> ProtocolCapabilities {
        ProtocolCapabilities::write_only()
            .with_appending(true)
            .with_merging(true)
            .with_format("text")
    }

    fn merge_capabilities(&self) -> MergeCapabilities {
        MergeCapabilities::new(
            [MergeStrategy::Concatenate, MergeStrategy::UseFirst, MergeStrategy::UseLast],
            MergeStrategy::Concatenate,
        )
    }

    fn validate_parameters(&self, parameters: &ParameterMap) -> ValidationResult {
        verdict(FileExportOptions::resolve(parameters))
    }

    async fn on_export(
        &self,
        data: &Value,
        parameters: &ParameterMap,
        context: &mut ExecutionContext,
    ) -> conduit_types::Result<()> {
        let options = resolved(FileExportOptions::resolve(parameters))?;
        let path = &options.file_path;
        let shown = path.display().to_string();
        let io_failure = |e: std::io::Error| {
            Failure::of(ErrorCode::ExportError, format!("failed to write {shown}: {e}"))
        };

        let text = match data {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let bytes = options.encoding.encode(&text, ErrorCode::ExportError, &shown)?;

        if context.is_cancelled() {
            return Err(Failure::of(ErrorCode::Cancelled, "export cancelled"));
        }
        if options.create_directories {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await.map_err(io_failure)?;
            }
        }

        let mut open = tokio::fs::OpenOptions::new();
        if options.append {
            open.create(true).append(true);
        } else {
            open.create(true).write(true).truncate(true);
        }
        let mut file = open.open(path).await.map_err(io_failure)?;
        file.write_all(bytes).await.map_err(io_failure)?;
        file.flush().await.map_err(io_failure)?;

        debug!(path = %shown, bytes = bytes.len(), append = options.append, "Payload written");
        context.set_state("bytes_written", bytes.len());
        Ok(())
    }
}
