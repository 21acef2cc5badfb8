//! Service layer for Conduit.
//!
//! Every service kind is the same [`ServiceLifecycle`] state machine
//! composed with a kind-specific handler:
//! - [`ImporterService`] + [`ImportHandler`]
//! - [`ProcessorService`] + [`ProcessHandler`]
//! - [`ExporterService`] + [`ExportHandler`], including branch merge
//!
//! Verbs validate their parameters, run the handler's hook behind a panic
//! boundary and always answer with a typed result. Each kind also exposes a
//! `consume` entry point that turns an inbound command into a verb call and
//! publishes the outcome to a [`ResultSink`].

mod command;
mod config;
mod context;
mod error;
mod exporter;
mod importer;
mod lifecycle;
pub mod merge;
mod processor;
mod verb;

pub use command::{
    ChannelSink, ExportCommand, ImportCommand, LogSink, MergeCommand, ProcessCommand,
    PublishedResult, ResultSink, ServiceOutcome,
};
pub use config::ServiceConfig;
pub use context::ExecutionContext;
pub use error::{ConfigError, ConfigResult};
pub use exporter::{ExportHandler, ExporterService};
pub use importer::{ImportHandler, ImporterService};
pub use lifecycle::{LifecycleHooks, NoHooks, ServiceLifecycle};
pub use processor::{ProcessHandler, ProcessorService};
