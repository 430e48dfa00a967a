//! Streaming OSM XML parser feeding osmbuf arena buffers.
//!
//! The tokenizer is an external collaborator: this crate consumes
//! ordered [`XmlEvent`]s (element-start, element-end, character data)
//! and drives the arena builders to materialize entity records. Full
//! buffers are handed off whole through a crossbeam channel; the
//! document header goes out once on a separate channel.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod event;
pub mod parser;
pub mod reader;

// Public re-exports for the primary API surface.
pub use event::{Attributes, XmlEvent};
pub use parser::XmlParser;
pub use reader::{run, spawn, ReaderConfig};
