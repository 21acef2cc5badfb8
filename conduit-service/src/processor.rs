//! Processor service kind.

use crate::command::{LogSink, ProcessCommand, PublishedResult, ResultSink, ServiceOutcome};
use crate::context::ExecutionContext;
use crate::lifecycle::{LifecycleHooks, ServiceLifecycle};
use crate::verb::VerbCall;
use async_trait::async_trait;
use conduit_model::{ProcessingResult, SchemaDefinition};
use conduit_types::boundary::guarded;
use conduit_types::{ErrorCode, ParameterMap, ValidationResult};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// Kind-specific behavior of a processor.
#[async_trait]
pub trait ProcessHandler: LifecycleHooks {
    /// Shape the input must conform to, if constrained.
    fn input_schema(&self) -> Option<SchemaDefinition> {
        None
    }

    /// Shape the output must conform to, if constrained.
    fn output_schema(&self) -> Option<SchemaDefinition> {
        None
    }

    fn validate_parameters(&self, parameters: &ParameterMap) -> ValidationResult {
        let _ = parameters;
        ValidationResult::success()
    }

    async fn on_process(
        &self,
        data: &Value,
        parameters: &ParameterMap,
        context: &mut ExecutionContext,
    ) -> conduit_types::Result<Value>;
}

/// A processor: the lifecycle state machine composed with a
/// [`ProcessHandler`].
pub struct ProcessorService {
    lifecycle: ServiceLifecycle,
    handler: Arc<dyn ProcessHandler>,
    sink: Arc<dyn ResultSink>,
}

impl ProcessorService {
    pub fn new<H: ProcessHandler + 'static>(handler: Arc<H>) -> Self {
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

    pub fn input_schema(&self) -> Option<SchemaDefinition> {
        self.handler.input_schema()
    }

    pub fn output_schema(&self) -> Option<SchemaDefinition> {
        self.handler.output_schema()
    }

    pub fn validate_parameters(&self, parameters: &ParameterMap) -> ValidationResult {
        self.handler
            .validate_parameters(&self.lifecycle.layered_parameters(parameters))
    }

    /// Checks `data` against `schema`, reporting every violation.
    pub fn validate_data_against_schema(&self, data: &Value, schema: &SchemaDefinition) -> ValidationResult {
        schema.validate(data)
    }

    /// Runs one processing step.
    ///
    /// Input that violates the input schema fails with `VALIDATION_ERROR`
    /// before the hook runs; output that violates the output schema fails
    /// the step after it.
    pub async fn process(
        &self,
        data: &Value,
        parameters: &ParameterMap,
        context: &mut ExecutionContext,
    ) -> ProcessingResult {
        let parameters = self.lifecycle.layered_parameters(parameters);
        let call = VerbCall::begin("process", self.lifecycle.service_id(), context);

        let outcome = match call.precheck(self.handler.validate_parameters(&parameters), context) {
            Ok(()) => self.run(data, &parameters, context).await,
            Err(failure) => Err(failure),
        };
        call.finish(context, &outcome);

        match outcome {
            Ok(output) => ProcessingResult::success(output),
            Err(failure) => ProcessingResult::from_failure(&failure),
        }
    }

    async fn run(
        &self,
        data: &Value,
        parameters: &ParameterMap,
        context: &mut ExecutionContext,
    ) -> conduit_types::Result<Value> {
        if let Some(schema) = self.handler.input_schema() {
            self.conform(data, &schema, "input")?;
        }
        let output = guarded(
            ErrorCode::ProcessingError,
            self.handler.on_process(data, parameters, context),
        )
        .await?;
        if let Some(schema) = self.handler.output_schema() {
            self.conform(&output, &schema, "output")?;
        }
        Ok(output)
    }

    fn conform(&self, data: &Value, schema: &SchemaDefinition, side: &str) -> conduit_types::Result<()> {
        let validation = self.validate_data_against_schema(data, schema);
        if !validation.is_valid() {
            warn!(
                service_id = %self.lifecycle.service_id().unwrap_or_default(),
                schema = %schema.name,
                side,
                "Data does not conform to schema: {}",
                validation.summary()
            );
        }
        validation.into_result(ErrorCode::ValidationError)
    }

    pub async fn consume(&self, command: ProcessCommand) -> ProcessingResult {
        let mut context =
            ExecutionContext::new(command.parameters.clone()).with_correlation_id(command.correlation_id);
        let result = self.process(&command.data, &command.parameters, &mut context).await;
        self.sink
            .publish(PublishedResult {
                service_id: self.lifecycle.service_id().unwrap_or_default(),
                correlation_id: context.correlation_id().to_string(),
                outcome: ServiceOutcome::Process(result.clone()),
            })
            .await;
        result
    }
}

impl std::fmt::Debug for ProcessorService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorService")
            .field("lifecycle", &self.lifecycle)
            .finish()
    }
}
