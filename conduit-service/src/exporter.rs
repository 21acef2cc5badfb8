//! Exporter service kind, including branch merge.

use crate::command::{ExportCommand, LogSink, MergeCommand, PublishedResult, ResultSink, ServiceOutcome};
use crate::context::ExecutionContext;
use crate::lifecycle::{LifecycleHooks, ServiceLifecycle};
use crate::merge;
use crate::verb::VerbCall;
use async_trait::async_trait;
use conduit_model::{ExportResult, MergeCapabilities, MergeStrategy, ProtocolCapabilities};
use conduit_types::boundary::guarded;
use conduit_types::{ErrorCode, ParameterMap, ValidationResult};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// Kind-specific behavior of an exporter.
#[async_trait]
pub trait ExportHandler: LifecycleHooks {
    /// The protocol this exporter is bound to.
    fn protocol_id(&self) -> &str;

    fn protocol_capabilities(&self) -> ProtocolCapabilities;

    fn merge_capabilities(&self) -> MergeCapabilities {
        MergeCapabilities::none()
    }

    fn validate_parameters(&self, parameters: &ParameterMap) -> ValidationResult {
        let _ = parameters;
        ValidationResult::success()
    }

    /// Writes `data`. Only called with validated parameters.
    async fn on_export(
        &self,
        data: &Value,
        parameters: &ParameterMap,
        context: &mut ExecutionContext,
    ) -> conduit_types::Result<()>;

    /// Combines branch outputs. Defaults to [`merge::merge_branches`].
    async fn on_merge(
        &self,
        branches: &BTreeMap<String, Value>,
        strategy: MergeStrategy,
        context: &mut ExecutionContext,
    ) -> conduit_types::Result<Value> {
        let _ = context;
        Ok(Value::String(merge::merge_branches(branches, strategy)))
    }
}

/// An exporter: the lifecycle state machine composed with an
/// [`ExportHandler`].
pub struct ExporterService {
    lifecycle: ServiceLifecycle,
    handler: Arc<dyn ExportHandler>,
    sink: Arc<dyn ResultSink>,
}

impl ExporterService {
    pub fn new<H: ExportHandler + 'static>(handler: Arc<H>) -> Self {
        Self {
            lifecycle: ServiceLifecycle::new(handler.clone()),
            handler,
            sink: Arc::new(LogSink),
        }
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn lifecycle(&self) -> &ServiceLifecycle {
        &self.lifecycle
    }

    pub fn protocol_id(&self) -> &str {
        self.handler.protocol_id()
    }

    pub fn protocol_capabilities(&self) -> ProtocolCapabilities {
        self.handler.protocol_capabilities()
    }

    pub fn merge_capabilities(&self) -> MergeCapabilities {
        self.handler.merge_capabilities()
    }

    pub fn validate_parameters(&self, parameters: &ParameterMap) -> ValidationResult {
        self.handler
            .validate_parameters(&self.lifecycle.layered_parameters(parameters))
    }

    /// Runs one export. Every failure becomes a failed [`ExportResult`].
    pub async fn export(
        &self,
        data: &Value,
        parameters: &ParameterMap,
        context: &mut ExecutionContext,
    ) -> ExportResult {
        let parameters = self.lifecycle.layered_parameters(parameters);
        let call = VerbCall::begin("export", self.lifecycle.service_id(), context);

        let outcome = match call.precheck(self.handler.validate_parameters(&parameters), context) {
            Ok(()) => {
                guarded(
                    ErrorCode::ExportError,
                    self.handler.on_export(data, &parameters, context),
                )
                .await
            }
            Err(failure) => Err(failure),
        };
        call.finish(context, &outcome);

        match outcome {
            Ok(()) => ExportResult::success().with_detail("protocol_id", self.handler.protocol_id()),
            Err(failure) => ExportResult::from_failure(&failure),
        }
    }

    /// Merges branch outputs into one payload carried by the result.
    ///
    /// A strategy outside the declared [`MergeCapabilities`] is logged but
    /// still attempted. An empty branch set yields an empty payload.
    pub async fn merge_branches(
        &self,
        branches: &BTreeMap<String, Value>,
        strategy: MergeStrategy,
        context: &mut ExecutionContext,
    ) -> ExportResult {
        let call = VerbCall::begin("merge", self.lifecycle.service_id(), context);
        if !self.handler.merge_capabilities().supports(strategy) {
            warn!(
                service_id = %self.lifecycle.service_id().unwrap_or_default(),
                strategy = ?strategy,
                "Merge strategy not declared by exporter"
            );
        }

        let outcome = match call.precheck(ValidationResult::success(), context) {
            Ok(()) => {
                guarded(
                    ErrorCode::MergeError,
                    self.handler.on_merge(branches, strategy, context),
                )
                .await
            }
            Err(failure) => Err(failure),
        };
        call.finish(context, &outcome);

        match outcome {
            Ok(payload) => ExportResult::success_with_payload(payload)
                .with_detail("strategy", format!("{strategy:?}"))
                .with_detail("branch_count", branches.len()),
            Err(failure) => ExportResult::from_failure(&failure),
        }
    }

    pub async fn consume(&self, command: ExportCommand) -> ExportResult {
        let mut context =
            ExecutionContext::new(command.parameters.clone()).with_correlation_id(command.correlation_id);
        let result = self.export(&command.data, &command.parameters, &mut context).await;
        self.publish(&context, ServiceOutcome::Export(result.clone())).await;
        result
    }

    /// Runs an inbound merge command, falling back to the declared default
    /// strategy.
    pub async fn consume_merge(&self, command: MergeCommand) -> ExportResult {
        let strategy = command
            .strategy
            .unwrap_or_else(|| self.handler.merge_capabilities().default_strategy);
        let mut context = ExecutionContext::new(ParameterMap::new()).with_correlation_id(command.correlation_id);
        let result = self.merge_branches(&command.branches, strategy, &mut context).await;
        self.publish(&context, ServiceOutcome::Merge(result.clone())).await;
        result
    }

    async fn publish(&self, context: &ExecutionContext, outcome: ServiceOutcome) {
        self.sink
            .publish(PublishedResult {
                service_id: self.lifecycle.service_id().unwrap_or_default(),
                correlation_id: context.correlation_id().to_string(),
                outcome,
            })
            .await;
    }
}

impl std::fmt::Debug for ExporterService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExporterService")
            .field("protocol_id", &self.handler.protocol_id())
            .field("lifecycle", &self.lifecycle)
            .finish()
    }
}
