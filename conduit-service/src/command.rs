//! Command consumption boundary.
//!
//! A message-delivery collaborator hands commands to a service's `consume`
//! entry point. The service runs the verb and publishes the outcome to a
//! [`ResultSink`].

use async_trait::async_trait;
use conduit_model::{ExportResult, ImportResult, MergeStrategy, ProcessingResult};
use conduit_types::ParameterMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportCommand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(default)]
    pub parameters: ParameterMap,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessCommand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(default)]
    pub parameters: ParameterMap,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportCommand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(default)]
    pub parameters: ParameterMap,
    #[serde(default)]
    pub data: Value,
}

/// Asks an exporter to merge branch outputs. Without a strategy the
/// exporter's declared default applies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeCommand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(default)]
    pub branches: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<MergeStrategy>,
}

/// The result of one consumed command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verb", content = "result", rename_all = "snake_case")]
pub enum ServiceOutcome {
    Import(ImportResult),
    Process(ProcessingResult),
    Export(ExportResult),
    Merge(ExportResult),
}

impl ServiceOutcome {
    pub fn is_success(&self) -> bool {
        match self {
            Self::Import(r) => r.is_success(),
            Self::Process(r) => r.is_success(),
            Self::Export(r) | Self::Merge(r) => r.is_success(),
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Import(r) => r.error_message(),
            Self::Process(r) => r.error_message(),
            Self::Export(r) | Self::Merge(r) => r.error_message(),
        }
    }
}

/// An outcome addressed to its service and correlation id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedResult {
    pub service_id: String,
    pub correlation_id: String,
    pub outcome: ServiceOutcome,
}

/// Destination for consumed-command outcomes.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn publish(&self, result: PublishedResult);
}

/// Writes outcomes to the log. The default sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl ResultSink for LogSink {
    async fn publish(&self, result: PublishedResult) {
        if result.outcome.is_success() {
            info!(
                service_id = %result.service_id,
                correlation_id = %result.correlation_id,
                "Command completed"
            );
        } else {
            warn!(
                service_id = %result.service_id,
                correlation_id = %result.correlation_id,
                "Command failed: {}",
                result.outcome.error_message().unwrap_or_default()
            );
        }
    }
}

/// Forwards outcomes into an mpsc channel for external publication.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::Sender<PublishedResult>,
}

impl ChannelSink {
    pub fn new(sender: mpsc::Sender<PublishedResult>) -> Self {
        Self { sender }
    }

    /// A sink plus the receiving end of a channel holding `capacity` results.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<PublishedResult>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self::new(sender), receiver)
    }
}

#[async_trait]
impl ResultSink for ChannelSink {
    async fn publish(&self, result: PublishedResult) {
        let correlation_id = result.correlation_id.clone();
        if self.sender.send(result).await.is_err() {
            warn!(correlation_id = %correlation_id, "Result channel closed, dropping result");
        }
    }
}
