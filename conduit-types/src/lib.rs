//! Core type definitions for Conduit.
//!
//! Every fallible operation in the pipeline returns through this crate:
//! - [`Error`]: a structured error record (code, message, details)
//! - [`Failure`]: an ordered, non-empty list of error records
//! - [`Result`]: success value or [`Failure`]
//! - [`ValidationResult`] / [`ValidationError`]: aggregated per-field
//!   precondition violations
//! - [`ParameterMap`]: the opaque, loosely-typed parameter map handed to
//!   services and protocols
//! - [`ContextId`]: time-ordered identifier for execution contexts
//! - [`boundary::guarded`]: turns a panicking hook into a [`Failure`]

pub mod boundary;
mod code;
mod error;
mod failure;
mod ids;
mod params;
mod validation;

pub use code::ErrorCode;
pub use error::{Error, RecordError};
pub use failure::Failure;
pub use ids::ContextId;
pub use params::ParameterMap;
pub use validation::{ValidationError, ValidationResult};

/// Result type alias: a success value or an aggregated [`Failure`].
pub type Result<T> = std::result::Result<T, Failure>;
