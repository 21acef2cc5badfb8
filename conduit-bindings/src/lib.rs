//! Reference bindings for Conduit.
//!
//! - [`FileImporter`] reads a file, or every matching file in a directory
//! - [`FileExporter`] writes or appends a payload to a file
//! - [`JsonProcessor`] minifies, prettifies, extracts from or flattens JSON
//! - [`FileProtocol`] / [`FileProtocolHandler`] expose file access rooted at a
//!   base directory through the protocol contract
//!
//! Every binding resolves its loosely-typed parameters into a typed options
//! struct (see [`options`]) before touching the filesystem.

mod file_exporter;
mod file_importer;
mod file_protocol;
mod json_processor;
pub mod options;

pub use file_exporter::FileExporter;
pub use file_importer::{FILE_PROTOCOL_ID, FileImporter};
pub use file_protocol::{FileProtocol, FileProtocolHandler};
pub use json_processor::JsonProcessor;
