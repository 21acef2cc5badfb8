use crate::context::ProtocolExecutionContext;
use crate::handler::{HandlerRuntime, ProtocolHandler};
use crate::protocol::ProtocolRuntime;
use conduit_types::{ErrorCode, Failure};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Routes a protocol operation to the first registered handler that
/// declares support for the protocol's id.
#[derive(Debug, Default, Clone)]
pub struct HandlerRegistry {
    handlers: Vec<HandlerRuntime>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler. Registration order decides precedence.
    pub fn register(&mut self, handler: Arc<dyn ProtocolHandler>) {
        debug!(handler_id = %handler.handler_id(), "Registering protocol handler");
        self.handlers.push(HandlerRuntime::new(handler));
    }

    /// The handler that would receive operations for `protocol_id`.
    pub fn find(&self, protocol_id: &str) -> Option<&HandlerRuntime> {
        self.handlers.iter().find(|h| h.can_handle(protocol_id))
    }

    /// Every protocol id some handler supports, deduplicated.
    pub fn supported_protocols(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for id in self.handlers.iter().flat_map(HandlerRuntime::supported_protocols) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Dispatches to the matching handler, or fails with
    /// `HANDLER_UNSUPPORTED` when none matches.
    pub async fn dispatch(
        &self,
        protocol: &ProtocolRuntime,
        context: &mut ProtocolExecutionContext,
        cancel: &CancellationToken,
    ) -> conduit_types::Result<Value> {
        match self.find(protocol.id()) {
            Some(handler) => handler.handle(Some(protocol), Some(context), cancel).await,
            None => {
                warn!(protocol_id = %protocol.id(), "No handler registered for protocol");
                Err(Failure::of(
                    ErrorCode::HandlerUnsupported,
                    format!("no handler supports protocol '{}'", protocol.id()),
                ))
            }
        }
    }
}
