//! The protocol contract and the initialize/execute runtime around it.

use crate::context::ProtocolExecutionContext;
use crate::parameter::{ProtocolParameter, validate_parameters};
use async_trait::async_trait;
use conduit_types::boundary::guarded;
use conduit_types::{ErrorCode, Failure, ParameterMap, ValidationResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// A named, versioned transport.
///
/// Implementors supply the identity, the declared parameters and the
/// execution hook. [`ProtocolRuntime`] owns the surrounding contract.
#[async_trait]
pub trait Protocol: Send + Sync {
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn version(&self) -> &str;

    /// Parameters accepted at initialization.
    fn parameters(&self) -> Vec<ProtocolParameter> {
        Vec::new()
    }

    /// Validates incoming parameters. The default checks them against
    /// [`parameters`](Protocol::parameters).
    fn validate_parameters(&self, parameters: &ParameterMap) -> ValidationResult {
        validate_parameters(&self.parameters(), parameters)
    }

    /// Transport-specific setup, run after validation succeeded.
    async fn on_initialize(
        &self,
        parameters: &ParameterMap,
        cancel: &CancellationToken,
    ) -> conduit_types::Result<()> {
        let _ = (parameters, cancel);
        Ok(())
    }

    /// Performs the protocol's work for one execution.
    async fn on_execute(
        &self,
        context: &mut ProtocolExecutionContext,
        parameters: &ParameterMap,
        cancel: &CancellationToken,
    ) -> conduit_types::Result<Value>;
}

/// Identity of a protocol, for listings and logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolDescriptor {
    pub id: String,
    pub name: String,
    pub version: String,
}

/// Initialize/execute state around one [`Protocol`].
///
/// `execute` is refused until `initialize` has validated the parameters and
/// run the protocol's setup hook.
pub struct ProtocolRuntime {
    protocol: Arc<dyn Protocol>,
    parameters: RwLock<Option<ParameterMap>>,
    ready: AtomicBool,
}

impl ProtocolRuntime {
    pub fn new(protocol: Arc<dyn Protocol>) -> Self {
        Self {
            protocol,
            parameters: RwLock::new(None),
            ready: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &str {
        self.protocol.id()
    }

    pub fn descriptor(&self) -> ProtocolDescriptor {
        ProtocolDescriptor {
            id: self.protocol.id().to_string(),
            name: self.protocol.name().to_string(),
            version: self.protocol.version().to_string(),
        }
    }

    pub fn declared_parameters(&self) -> Vec<ProtocolParameter> {
        self.protocol.parameters()
    }

    pub fn is_initialized(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// The parameter snapshot taken by the last successful initialize.
    pub fn parameters(&self) -> Option<ParameterMap> {
        self.parameters
            .read()
            .map(|guard| (*guard).clone())
            .unwrap_or_default()
    }

    pub fn validate_parameters(&self, parameters: &ParameterMap) -> ValidationResult {
        self.protocol.validate_parameters(parameters)
    }

    /// Validates `parameters`, snapshots them (with declared defaults filled
    /// in), runs the setup hook and marks the protocol ready.
    ///
    /// Every violation is reported as its own `PARAMETER_ERROR` in one
    /// failure.
    pub async fn initialize(
        &self,
        parameters: Option<ParameterMap>,
        cancel: &CancellationToken,
    ) -> conduit_types::Result<bool> {
        let protocol_id = self.protocol.id().to_string();
        info!(protocol_id = %protocol_id, "Initializing protocol");
        self.ready.store(false, Ordering::Release);

        let Some(mut parameters) = parameters else {
            warn!(protocol_id = %protocol_id, "Protocol initialization rejected: no parameters");
            return Err(Failure::of(
                ErrorCode::ParameterError,
                "parameters must not be null",
            ));
        };

        let validation = self.protocol.validate_parameters(&parameters);
        if let Err(failure) = validation.into_result(ErrorCode::ParameterError) {
            warn!(
                protocol_id = %protocol_id,
                violations = failure.len(),
                "Protocol parameters failed validation: {}",
                failure
            );
            return Err(failure);
        }

        let declared = self.protocol.parameters();
        parameters.fill_defaults(
            declared
                .iter()
                .filter_map(|p| p.default_value.as_ref().map(|v| (p.name.as_str(), v))),
        );
        self.store_parameters(Some(parameters.clone()));

        let hook = self.protocol.on_initialize(&parameters, cancel);
        if let Err(failure) = guarded(ErrorCode::InitializationError, hook).await {
            error!(protocol_id = %protocol_id, "Protocol initialization failed: {}", failure);
            self.store_parameters(None);
            return Err(failure);
        }

        self.ready.store(true, Ordering::Release);
        info!(protocol_id = %protocol_id, "Protocol initialized");
        Ok(true)
    }

    /// Runs the protocol's execution hook for one context.
    ///
    /// Fails with `NOT_INITIALIZED` before a successful initialize and with
    /// `EXECUTION_ERROR` for a missing context; the hook is not invoked in
    /// either case. The context's end time is stamped whether the hook
    /// succeeds or fails, and the hook's result is returned unchanged.
    pub async fn execute(
        &self,
        context: Option<&mut ProtocolExecutionContext>,
        cancel: &CancellationToken,
    ) -> conduit_types::Result<Value> {
        let protocol_id = self.protocol.id();
        if !self.is_initialized() {
            warn!(protocol_id = %protocol_id, "Execute called before initialize");
            return Err(Failure::of(
                ErrorCode::NotInitialized,
                format!("protocol '{protocol_id}' is not initialized"),
            ));
        }
        let Some(context) = context else {
            warn!(protocol_id = %protocol_id, "Execute called without a context");
            return Err(Failure::of(
                ErrorCode::ExecutionError,
                "execution context must not be null",
            ));
        };

        let context_id = context.id();
        let parameters = self.parameters().unwrap_or_default();
        info!(protocol_id = %protocol_id, context_id = %context_id, "Executing protocol");

        let result = guarded(
            ErrorCode::ExecutionError,
            self.protocol.on_execute(context, &parameters, cancel),
        )
        .await;
        context.complete();

        match &result {
            Ok(_) => info!(protocol_id = %protocol_id, context_id = %context_id, "Protocol execution succeeded"),
            Err(failure) => error!(
                protocol_id = %protocol_id,
                context_id = %context_id,
                "Protocol execution failed: {}",
                failure
            ),
        }
        result
    }

    fn store_parameters(&self, parameters: Option<ParameterMap>) {
        if let Ok(mut guard) = self.parameters.write() {
            *guard = parameters;
        }
    }
}

impl std::fmt::Debug for ProtocolRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolRuntime")
            .field("id", &self.protocol.id())
            .field("ready", &self.is_initialized())
            .finish()
    }
}
