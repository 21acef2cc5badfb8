use conduit_types::Failure;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse runner configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("no {kind} binding named '{binding}' (service '{service_id}')")]
    UnknownBinding {
        service_id: String,
        kind: String,
        binding: String,
    },

    #[error("service '{0}' is configured more than once")]
    DuplicateService(String),

    #[error("service '{service_id}' failed to {operation}: {failure}")]
    Lifecycle {
        service_id: String,
        operation: &'static str,
        failure: Failure,
    },

    #[error("failed to read commands: {0}")]
    Input(#[source] std::io::Error),

    #[error("failed to write output: {0}")]
    Output(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RunnerError>;
