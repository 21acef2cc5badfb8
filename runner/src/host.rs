//! Builds services from configuration and routes commands to them.

use crate::config::{RunnerConfig, ServiceEntry, ServiceKind};
use crate::error::{Result, RunnerError};
use conduit_bindings::{FileExporter, FileImporter, JsonProcessor};
use conduit_service::{
    ChannelSink, ExportCommand, ExporterService, ImportCommand, ImporterService, MergeCommand,
    ProcessCommand, ProcessorService, PublishedResult, ServiceConfig, ServiceLifecycle,
};
use conduit_types::{ErrorCode, Failure};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// A verb command addressed to one service.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "verb", rename_all = "lowercase")]
pub enum VerbCommand {
    Import(ImportCommand),
    Process(ProcessCommand),
    Export(ExportCommand),
    Merge(MergeCommand),
}

impl VerbCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Import(_) => "import",
            Self::Process(_) => "process",
            Self::Export(_) => "export",
            Self::Merge(_) => "merge",
        }
    }

    fn correlation_id_mut(&mut self) -> &mut Option<String> {
        match self {
            Self::Import(c) => &mut c.correlation_id,
            Self::Process(c) => &mut c.correlation_id,
            Self::Export(c) => &mut c.correlation_id,
            Self::Merge(c) => &mut c.correlation_id,
        }
    }
}

/// One JSON command line: `{"service": "...", "verb": "...", ...}`.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandEnvelope {
    pub service: String,
    #[serde(flatten)]
    pub command: VerbCommand,
}

pub enum HostedService {
    Importer(ImporterService),
    Processor(ProcessorService),
    Exporter(ExporterService),
}

impl HostedService {
    /// Builds the service named by `entry`, publishing outcomes to `sink`.
    pub fn build(entry: &ServiceEntry, sink: Arc<ChannelSink>) -> Result<Self> {
        let service = match (entry.kind, entry.binding.as_str()) {
            (ServiceKind::Importer, "file") => {
                Self::Importer(ImporterService::new(Arc::new(FileImporter::new())).with_sink(sink))
            }
            (ServiceKind::Processor, "json") => {
                Self::Processor(ProcessorService::new(Arc::new(JsonProcessor::new())).with_sink(sink))
            }
            (ServiceKind::Exporter, "file") => {
                Self::Exporter(ExporterService::new(Arc::new(FileExporter::new())).with_sink(sink))
            }
            (kind, binding) => {
                return Err(RunnerError::UnknownBinding {
                    service_id: entry.config.service_id.clone(),
                    kind: kind.to_string(),
                    binding: binding.to_string(),
                });
            }
        };
        Ok(service)
    }

    pub fn kind(&self) -> ServiceKind {
        match self {
            Self::Importer(_) => ServiceKind::Importer,
            Self::Processor(_) => ServiceKind::Processor,
            Self::Exporter(_) => ServiceKind::Exporter,
        }
    }

    pub fn lifecycle(&self) -> &ServiceLifecycle {
        match self {
            Self::Importer(s) => s.lifecycle(),
            Self::Processor(s) => s.lifecycle(),
            Self::Exporter(s) => s.lifecycle(),
        }
    }

    /// Feeds `command` to the matching consume entry point. A verb the
    /// service kind does not offer fails with `INVALID_OPERATION`.
    async fn consume(&self, command: VerbCommand) -> conduit_types::Result<()> {
        match (self, command) {
            (Self::Importer(s), VerbCommand::Import(c)) => {
                s.consume(c).await;
            }
            (Self::Processor(s), VerbCommand::Process(c)) => {
                s.consume(c).await;
            }
            (Self::Exporter(s), VerbCommand::Export(c)) => {
                s.consume(c).await;
            }
            (Self::Exporter(s), VerbCommand::Merge(c)) => {
                s.consume_merge(c).await;
            }
            (service, command) => {
                return Err(Failure::of(
                    ErrorCode::InvalidOperation,
                    format!("{} services do not accept '{}'", service.kind(), command.name()),
                ));
            }
        }
        Ok(())
    }
}

/// The set of hosted services, keyed by service id.
pub struct Host {
    services: BTreeMap<String, (HostedService, ServiceConfig)>,
    results: Mutex<mpsc::Receiver<PublishedResult>>,
    dispatched: AtomicU64,
}

impl Host {
    pub fn from_config(config: &RunnerConfig) -> Result<Self> {
        let (sink, receiver) = ChannelSink::channel(16);
        let sink = Arc::new(sink);
        let mut services = BTreeMap::new();
        for entry in &config.services {
            let service_id = entry.config.service_id.clone();
            if services.contains_key(&service_id) {
                return Err(RunnerError::DuplicateService(service_id));
            }
            let service = HostedService::build(entry, sink.clone())?;
            info!(service_id = %service_id, kind = %entry.kind, binding = %entry.binding, "Service configured");
            services.insert(service_id, (service, entry.config.clone()));
        }
        Ok(Self {
            services,
            results: Mutex::new(receiver),
            dispatched: AtomicU64::new(0),
        })
    }

    pub fn service_ids(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    pub fn service(&self, service_id: &str) -> Option<&HostedService> {
        self.services.get(service_id).map(|(service, _)| service)
    }

    /// Initializes and starts every service, in id order. If one fails, the
    /// services already running are stopped before the error is returned.
    pub async fn start_all(&self, cancel: &CancellationToken) -> Result<()> {
        for (service_id, (service, config)) in &self.services {
            if let Err(e) = Self::start_one(service_id, service, config, cancel).await {
                warn!(service_id = %service_id, "Start-up aborted, stopping started services");
                self.stop_all(cancel).await;
                return Err(e);
            }
        }
        Ok(())
    }

    async fn start_one(
        service_id: &str,
        service: &HostedService,
        config: &ServiceConfig,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let lifecycle = service.lifecycle();
        lifecycle
            .initialize(config.clone(), cancel)
            .await
            .map_err(|failure| lifecycle_error(service_id, "initialize", failure))?;
        lifecycle
            .start(cancel)
            .await
            .map_err(|failure| lifecycle_error(service_id, "start", failure))
    }

    /// Stops every running service. Failures are logged, not returned, so
    /// one failing service does not keep the others running.
    pub async fn stop_all(&self, cancel: &CancellationToken) {
        for (service_id, (service, _)) in &self.services {
            let lifecycle = service.lifecycle();
            if !lifecycle.status().can_stop() {
                continue;
            }
            if let Err(failure) = lifecycle.stop(cancel).await {
                warn!(service_id = %service_id, "Service failed to stop: {}", failure);
            }
        }
    }

    /// Routes one envelope and returns the published outcome.
    ///
    /// Results are matched by correlation id; a command without one gets
    /// `{service}-{n}`. Results published outside `dispatch` are discarded.
    pub async fn dispatch(&self, envelope: CommandEnvelope) -> conduit_types::Result<PublishedResult> {
        let Some((service, _)) = self.services.get(&envelope.service) else {
            return Err(Failure::of(
                ErrorCode::InvalidOperation,
                format!("unknown service '{}'", envelope.service),
            ));
        };
        let mut command = envelope.command;
        let slot = command.correlation_id_mut();
        if slot.as_deref().is_none_or(|id| id.trim().is_empty()) {
            let n = self.dispatched.fetch_add(1, Ordering::Relaxed) + 1;
            *slot = Some(format!("{}-{n}", envelope.service));
        }
        let correlation_id = slot.clone().unwrap_or_default();

        let mut results = self.results.lock().await;
        while let Ok(stale) = results.try_recv() {
            discard(&stale);
        }
        service.consume(command).await?;

        let mut matched = None;
        while let Ok(published) = results.try_recv() {
            if matched.is_none() && published.correlation_id == correlation_id {
                matched = Some(published);
            } else {
                discard(&published);
            }
        }
        matched.ok_or_else(|| {
            Failure::of(
                ErrorCode::ExecutionError,
                format!("no result published for correlation id '{correlation_id}'"),
            )
        })
    }
}

fn discard(result: &PublishedResult) {
    warn!(
        service_id = %result.service_id,
        correlation_id = %result.correlation_id,
        "Discarding result not requested by dispatch"
    );
}

fn lifecycle_error(service_id: &str, operation: &'static str, failure: Failure) -> RunnerError {
    RunnerError::Lifecycle {
        service_id: service_id.to_string(),
        operation,
        failure,
    }
}
