//! Data model shared by every Conduit service kind.
//!
//! - [`SchemaDefinition`] / [`SchemaField`]: declarative data shapes with a
//!   conformance check
//! - [`MergeStrategy`] / [`MergeCapabilities`]: how an exporter combines
//!   branch outputs
//! - [`ProtocolCapabilities`]: what a binding's transport supports
//! - [`ServiceStatus`] / [`ServiceStatusInfo`]: lifecycle state and snapshots
//! - [`ImportResult`], [`ExportResult`], [`ProcessingResult`]: verb outcomes
//!
//! Everything here is plain data. Values are built once through their
//! constructors and never mutated afterwards.

mod capabilities;
mod merge;
mod results;
mod schema;
mod status;

pub use capabilities::ProtocolCapabilities;
pub use merge::{MergeCapabilities, MergeStrategy};
pub use results::{ExportResult, ImportResult, ProcessingResult};
pub use schema::{FieldType, SchemaDefinition, SchemaField};
pub use status::{ServiceStatus, ServiceStatusInfo};
