//! Machine-readable error codes shared by every layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Short, stable code attached to every [`Error`](crate::Error) produced by
/// the framework itself. Bindings may use free-form codes via
/// [`Error::new`](crate::Error::new).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// A declared parameter is missing, null, or of the wrong type.
    ParameterError,
    /// A protocol was executed before a successful initialize.
    NotInitialized,
    /// Protocol execution failed or was handed an invalid context.
    ExecutionError,
    /// No handler declares support for the requested protocol id.
    HandlerUnsupported,
    /// A handler failed while handling a protocol operation.
    HandlerError,
    /// A lifecycle operation was requested from a state that forbids it.
    InvalidOperation,
    /// A protocol or service failed to initialize.
    InitializationError,
    /// Input data did not pass validation.
    ValidationError,
    ImportError,
    ExportError,
    ProcessingError,
    MergeError,
    /// A start/stop hook failed.
    LifecycleError,
    /// The operation observed its cancellation signal.
    Cancelled,
}

impl ErrorCode {
    /// Returns the canonical wire form of the code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ParameterError => "PARAMETER_ERROR",
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::ExecutionError => "EXECUTION_ERROR",
            Self::HandlerUnsupported => "HANDLER_UNSUPPORTED",
            Self::HandlerError => "HANDLER_ERROR",
            Self::InvalidOperation => "INVALID_OPERATION",
            Self::InitializationError => "INITIALIZATION_ERROR",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::ImportError => "IMPORT_ERROR",
            Self::ExportError => "EXPORT_ERROR",
            Self::ProcessingError => "PROCESSING_ERROR",
            Self::MergeError => "MERGE_ERROR",
            Self::LifecycleError => "LIFECYCLE_ERROR",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Human-readable fallback used when an error is built with an empty message.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::ParameterError => "invalid parameter",
            Self::NotInitialized => "component is not initialized",
            Self::ExecutionError => "execution failed",
            Self::HandlerUnsupported => "protocol is not supported by this handler",
            Self::HandlerError => "handler failed",
            Self::InvalidOperation => "operation is not valid in the current state",
            Self::InitializationError => "initialization failed",
            Self::ValidationError => "validation failed",
            Self::ImportError => "import failed",
            Self::ExportError => "export failed",
            Self::ProcessingError => "processing failed",
            Self::MergeError => "merge failed",
            Self::LifecycleError => "lifecycle transition failed",
            Self::Cancelled => "operation was cancelled",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq<ErrorCode> for str {
    fn eq(&self, other: &ErrorCode) -> bool {
        self == other.as_str()
    }
}

impl PartialEq<ErrorCode> for &str {
    fn eq(&self, other: &ErrorCode) -> bool {
        *self == other.as_str()
    }
}
