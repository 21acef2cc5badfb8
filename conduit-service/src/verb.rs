//! Shared bookkeeping around a verb call: intent/outcome logging, parameter
//! validation and the cancellation check that precede the hook.

use crate::context::ExecutionContext;
use conduit_types::{ContextId, ErrorCode, Failure, ValidationResult};
use tracing::{error, info, warn};

pub(crate) struct VerbCall {
    verb: &'static str,
    service_id: String,
    context_id: ContextId,
    correlation_id: String,
}

impl VerbCall {
    pub(crate) fn begin(verb: &'static str, service_id: Option<String>, context: &ExecutionContext) -> Self {
        let call = Self {
            verb,
            service_id: service_id.unwrap_or_default(),
            context_id: context.id(),
            correlation_id: context.correlation_id().to_string(),
        };
        info!(
            service_id = %call.service_id,
            context_id = %call.context_id,
            correlation_id = %call.correlation_id,
            verb,
            "Verb started"
        );
        call
    }

    /// Fails with every parameter violation, or with `CANCELLED` when the
    /// call was cancelled before the hook ran.
    pub(crate) fn precheck(
        &self,
        validation: ValidationResult,
        context: &ExecutionContext,
    ) -> conduit_types::Result<()> {
        if let Err(failure) = validation.into_result(ErrorCode::ParameterError) {
            warn!(
                service_id = %self.service_id,
                context_id = %self.context_id,
                verb = self.verb,
                violations = failure.len(),
                "Verb parameters failed validation: {}",
                failure
            );
            return Err(failure);
        }
        if context.is_cancelled() {
            return Err(Failure::of(
                ErrorCode::Cancelled,
                format!("{} cancelled before it started", self.verb),
            ));
        }
        Ok(())
    }

    /// Stamps the context and logs the outcome.
    pub(crate) fn finish<T>(&self, context: &mut ExecutionContext, outcome: &conduit_types::Result<T>) {
        context.complete();
        let elapsed_ms = context.elapsed().num_milliseconds();
        match outcome {
            Ok(_) => info!(
                service_id = %self.service_id,
                context_id = %self.context_id,
                correlation_id = %self.correlation_id,
                verb = self.verb,
                elapsed_ms,
                "Verb succeeded"
            ),
            Err(failure) => error!(
                service_id = %self.service_id,
                context_id = %self.context_id,
                correlation_id = %self.correlation_id,
                verb = self.verb,
                elapsed_ms,
                "Verb failed: {}",
                failure
            ),
        }
    }
}
