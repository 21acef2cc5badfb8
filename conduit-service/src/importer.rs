//! Importer service kind.

use crate::command::{ImportCommand, LogSink, PublishedResult, ResultSink, ServiceOutcome};
use crate::context::ExecutionContext;
use crate::lifecycle::{LifecycleHooks, ServiceLifecycle};
use crate::verb::VerbCall;
use async_trait::async_trait;
use conduit_model::{ImportResult, ProtocolCapabilities};
use conduit_types::boundary::guarded;
use conduit_types::{ErrorCode, ParameterMap, ValidationResult};
use serde_json::Value;
use std::sync::Arc;

/// Kind-specific behavior of an importer.
#[async_trait]
pub trait ImportHandler: LifecycleHooks {
    /// The protocol this importer is bound to.
    fn protocol_id(&self) -> &str;

    fn protocol_capabilities(&self) -> ProtocolCapabilities;

    fn validate_parameters(&self, parameters: &ParameterMap) -> ValidationResult {
        let _ = parameters;
        ValidationResult::success()
    }

    /// Reads the payload. Only called with validated parameters.
    async fn on_import(
        &self,
        parameters: &ParameterMap,
        context: &mut ExecutionContext,
    ) -> conduit_types::Result<Value>;
}

/// An importer: the lifecycle state machine composed with an
/// [`ImportHandler`].
pub struct ImporterService {
    lifecycle: ServiceLifecycle,
    handler: Arc<dyn ImportHandler>,
    sink: Arc<dyn ResultSink>,
}

impl ImporterService {
    pub fn new<H: ImportHandler + 'static>(handler: Arc<H>) -> Self {
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

    /// Validates `parameters` layered over the configured settings.
    pub fn validate_parameters(&self, parameters: &ParameterMap) -> ValidationResult {
        self.handler
            .validate_parameters(&self.lifecycle.layered_parameters(parameters))
    }

    /// Runs one import. Never panics and never returns `Err`: every failure,
    /// including a panicking hook, becomes a failed [`ImportResult`].
    pub async fn import(&self, parameters: &ParameterMap, context: &mut ExecutionContext) -> ImportResult {
        let parameters = self.lifecycle.layered_parameters(parameters);
        let call = VerbCall::begin("import", self.lifecycle.service_id(), context);

        let outcome = match call.precheck(self.handler.validate_parameters(&parameters), context) {
            Ok(()) => guarded(ErrorCode::ImportError, self.handler.on_import(&parameters, context)).await,
            Err(failure) => Err(failure),
        };
        call.finish(context, &outcome);

        match outcome {
            Ok(data) => ImportResult::success(data)
                .with_detail("protocol_id", self.handler.protocol_id()),
            Err(failure) => ImportResult::from_failure(&failure),
        }
    }

    /// Runs an inbound command and publishes its outcome.
    pub async fn consume(&self, command: ImportCommand) -> ImportResult {
        let mut context =
            ExecutionContext::new(command.parameters.clone()).with_correlation_id(command.correlation_id);
        let result = self.import(&command.parameters, &mut context).await;
        self.sink
            .publish(PublishedResult {
                service_id: self.lifecycle.service_id().unwrap_or_default(),
                correlation_id: context.correlation_id().to_string(),
                outcome: ServiceOutcome::Import(result.clone()),
            })
            .await;
        result
    }
}

impl std::fmt::Debug for ImporterService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImporterService")
            .field("protocol_id", &self.handler.protocol_id())
            .field("lifecycle", &self.lifecycle)
            .finish()
    }
}
