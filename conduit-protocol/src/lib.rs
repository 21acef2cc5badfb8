//! Protocol layer for Conduit.
//!
//! A protocol is a named, versioned transport with declared initialization
//! parameters. This crate provides:
//! - [`Protocol`]: the hook trait a transport binding implements
//! - [`ProtocolRuntime`]: the initialize/execute state around a protocol:
//!   parameter validation, the ready flag, end-time stamping and panic
//!   containment
//! - [`ProtocolHandler`] / [`HandlerRuntime`]: dispatch units that execute a
//!   protocol-bound operation on behalf of a caller
//! - [`HandlerRegistry`]: selects the handler that declares support for a
//!   protocol id
//!
//! # Example
//!
//! ```
//! use async_trait::async_trait;
//! use conduit_protocol::{
//!     ParameterType, Protocol, ProtocolExecutionContext, ProtocolParameter, ProtocolRuntime,
//! };
//! use conduit_types::ParameterMap;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl Protocol for Echo {
//!     fn id(&self) -> &str { "echo" }
//!     fn name(&self) -> &str { "Echo" }
//!     fn version(&self) -> &str { "1.0" }
//!     fn parameters(&self) -> Vec<ProtocolParameter> {
//!         vec![ProtocolParameter::required("Prefix", ParameterType::String)]
//!     }
//!     async fn on_execute(
//!         &self,
//!         context: &mut ProtocolExecutionContext,
//!         parameters: &ParameterMap,
//!         _cancel: &CancellationToken,
//!     ) -> conduit_types::Result<serde_json::Value> {
//!         let prefix = parameters.get_str("Prefix").unwrap_or_default();
//!         let input = context.input_data().and_then(|v| v.as_str()).unwrap_or_default();
//!         Ok(format!("{prefix}{input}").into())
//!     }
//! }
//!
//! let runtime = ProtocolRuntime::new(Arc::new(Echo));
//! assert!(!runtime.is_initialized());
//! ```

mod context;
mod handler;
mod parameter;
mod protocol;
mod registry;

pub use context::ProtocolExecutionContext;
pub use handler::{HandlerRuntime, ProtocolHandler};
pub use parameter::{ParameterType, ProtocolParameter, validate_parameters};
pub use protocol::{Protocol, ProtocolDescriptor, ProtocolRuntime};
pub use registry::HandlerRegistry;
