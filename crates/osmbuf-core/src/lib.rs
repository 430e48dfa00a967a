//! Core types and errors for the osmbuf OSM reader.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental vocabulary used throughout the osmbuf workspace:
//! entity ids, item kinds, locations, timestamps, the entity-kind read
//! filter, the document header, and the error taxonomy.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod filter;
pub mod header;
pub mod kind;
pub mod location;
pub mod timestamp;
pub mod types;

// Public re-exports for the primary API surface.
pub use error::{ReadError, ValidationError};
pub use filter::EntityFilter;
pub use header::{BoundingBox, Header};
pub use kind::ItemKind;
pub use location::Location;
pub use timestamp::Timestamp;
pub use types::{ChangesetId, ObjectId, UserId};
