//! Conduit runner: hosts configured services and feeds them commands.
//!
//! The runner reads a TOML [`RunnerConfig`], builds one service per entry,
//! initializes and starts them, then reads JSON command lines and writes one
//! JSON report line per command. A malformed line or an unknown service
//! yields a failure report; the run continues.

mod config;
mod error;
mod host;

pub use config::{RunnerConfig, ServiceEntry, ServiceKind};
pub use error::{Result, RunnerError};
pub use host::{CommandEnvelope, Host, HostedService, VerbCommand};

use conduit_service::PublishedResult;
use conduit_types::{ErrorCode, Failure};
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

/// Output for one command line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandReport {
    /// 1-based input line number.
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<PublishedResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<conduit_types::Error>,
}

impl CommandReport {
    fn published(line: usize, result: PublishedResult) -> Self {
        Self {
            line,
            result: Some(result),
            errors: Vec::new(),
        }
    }

    fn failed(line: usize, failure: Failure) -> Self {
        Self {
            line,
            result: None,
            errors: failure.into_errors(),
        }
    }

    /// True when the command reached a service and the verb succeeded.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
            && self
                .result
                .as_ref()
                .is_some_and(|r| r.outcome.is_success())
    }
}

/// Runs one command line against `host`.
pub async fn run_line(host: &Host, line_number: usize, line: &str) -> CommandReport {
    let envelope: CommandEnvelope = match serde_json::from_str(line) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(line = line_number, "Malformed command line: {}", e);
            return CommandReport::failed(
                line_number,
                Failure::of(ErrorCode::ParameterError, format!("malformed command: {e}")),
            );
        }
    };
    debug!(line = line_number, service = %envelope.service, verb = envelope.command.name(), "Dispatching command");
    match host.dispatch(envelope).await {
        Ok(result) => CommandReport::published(line_number, result),
        Err(failure) => {
            warn!(line = line_number, "Command rejected: {}", failure);
            CommandReport::failed(line_number, failure)
        }
    }
}

/// Reads command lines until EOF, writing one JSON report per non-blank
/// line. Returns the number of commands processed.
pub async fn run_commands<R, W>(host: &Host, reader: R, mut writer: W) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut line_number = 0;
    let mut processed = 0;
    while let Some(line) = lines.next_line().await.map_err(RunnerError::Input)? {
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }
        let report = run_line(host, line_number, &line).await;
        let mut encoded = serde_json::to_string(&report)
            .map_err(|e| RunnerError::Output(std::io::Error::other(e)))?;
        encoded.push('\n');
        writer.write_all(encoded.as_bytes()).await.map_err(RunnerError::Output)?;
        processed += 1;
    }
    writer.flush().await.map_err(RunnerError::Output)?;
    Ok(processed)
}
