//! Protocol handlers: dispatch units bound to one or more protocol ids.

use crate::context::ProtocolExecutionContext;
use crate::protocol::ProtocolRuntime;
use async_trait::async_trait;
use conduit_types::boundary::guarded;
use conduit_types::{ErrorCode, Failure};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Executes protocol-bound operations for the protocols it declares.
#[async_trait]
pub trait ProtocolHandler: Send + Sync {
    fn handler_id(&self) -> &str;

    /// Protocol ids this handler accepts.
    fn supported_protocols(&self) -> Vec<String>;

    /// True iff `protocol_id` is non-empty and declared as supported.
    fn can_handle(&self, protocol_id: &str) -> bool {
        !protocol_id.is_empty() && self.supported_protocols().iter().any(|p| p == protocol_id)
    }

    async fn on_handle(
        &self,
        protocol: &ProtocolRuntime,
        context: &mut ProtocolExecutionContext,
        cancel: &CancellationToken,
    ) -> conduit_types::Result<Value>;
}

/// The validate → delegate → log contract around a [`ProtocolHandler`].
#[derive(Clone)]
pub struct HandlerRuntime {
    handler: Arc<dyn ProtocolHandler>,
}

impl HandlerRuntime {
    pub fn new(handler: Arc<dyn ProtocolHandler>) -> Self {
        Self { handler }
    }

    pub fn id(&self) -> &str {
        self.handler.handler_id()
    }

    pub fn supported_protocols(&self) -> Vec<String> {
        self.handler.supported_protocols()
    }

    pub fn can_handle(&self, protocol_id: &str) -> bool {
        self.handler.can_handle(protocol_id)
    }

    /// Handles one operation. A missing protocol or context fails with
    /// `HANDLER_ERROR`, an undeclared protocol id with
    /// `HANDLER_UNSUPPORTED`; a panicking hook becomes a `HANDLER_ERROR`.
    pub async fn handle(
        &self,
        protocol: Option<&ProtocolRuntime>,
        context: Option<&mut ProtocolExecutionContext>,
        cancel: &CancellationToken,
    ) -> conduit_types::Result<Value> {
        let handler_id = self.handler.handler_id();
        let Some(protocol) = protocol else {
            warn!(handler_id = %handler_id, "Handle called without a protocol");
            return Err(Failure::of(ErrorCode::HandlerError, "protocol must not be null"));
        };
        let Some(context) = context else {
            warn!(handler_id = %handler_id, "Handle called without a context");
            return Err(Failure::of(
                ErrorCode::HandlerError,
                "execution context must not be null",
            ));
        };

        let protocol_id = protocol.id();
        if !self.handler.can_handle(protocol_id) {
            warn!(handler_id = %handler_id, protocol_id = %protocol_id, "Protocol not supported by handler");
            return Err(Failure::of(
                ErrorCode::HandlerUnsupported,
                format!("handler '{handler_id}' does not support protocol '{protocol_id}'"),
            ));
        }

        let context_id = context.id();
        info!(
            handler_id = %handler_id,
            protocol_id = %protocol_id,
            context_id = %context_id,
            "Handling protocol operation"
        );
        let result = guarded(
            ErrorCode::HandlerError,
            self.handler.on_handle(protocol, context, cancel),
        )
        .await;

        match &result {
            Ok(_) => info!(
                handler_id = %handler_id,
                protocol_id = %protocol_id,
                context_id = %context_id,
                "Protocol operation handled"
            ),
            Err(failure) => error!(
                handler_id = %handler_id,
                protocol_id = %protocol_id,
                context_id = %context_id,
                "Protocol operation failed: {}",
                failure
            ),
        }
        result
    }
}

impl std::fmt::Debug for HandlerRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRuntime")
            .field("id", &self.handler.handler_id())
            .field("supported_protocols", &self.handler.supported_protocols())
            .finish()
    }
}
