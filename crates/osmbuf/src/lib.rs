//! Osmbuf: a streaming OpenStreetMap XML reader producing arena-buffered
//! binary records.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the osmbuf sub-crates. For most users, adding `osmbuf` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use crossbeam_channel::unbounded;
//! use osmbuf::prelude::*;
//!
//! // The token source (an XML tokenizer of your choice) sends events;
//! // here they are written by hand.
//! let (event_tx, event_rx) = unbounded();
//! let (handle, buffers, header) = osmbuf::xml::spawn(
//!     event_rx,
//!     EntityFilter::ALL,
//!     ReaderConfig::default(),
//! );
//!
//! for event in [
//!     XmlEvent::start("osm", &[("version", "0.6"), ("generator", "demo")]),
//!     XmlEvent::start("node", &[("id", "1"), ("lat", "51.5"), ("lon", "-0.1")]),
//!     XmlEvent::start("tag", &[("k", "amenity"), ("v", "cafe")]),
//!     XmlEvent::end("tag"),
//!     XmlEvent::end("node"),
//!     XmlEvent::end("osm"),
//! ] {
//!     event_tx.send(event).unwrap();
//! }
//! drop(event_tx);
//!
//! assert_eq!(header.recv().unwrap().get("generator"), "demo");
//! for buffer in buffers {
//!     for record in buffer.records() {
//!         let node = record.as_node().unwrap();
//!         assert_eq!(node.id(), 1);
//!         assert_eq!(node.tags().next(), Some(("amenity", "cafe")));
//!     }
//! }
//! handle.join().unwrap().unwrap();
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the
//! prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `osmbuf-core` | IDs, locations, timestamps, filter, header, errors |
//! | [`arena`] | `osmbuf-arena` | Arena buffers, record builder, typed read views |
//! | [`xml`] | `osmbuf-xml` | Markup events, the streaming parser, the reader loop |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, errors, and the document header (`osmbuf-core`).
///
/// Contains [`types::Location`], [`types::Timestamp`],
/// [`types::EntityFilter`], [`types::Header`], and the error taxonomy.
pub use osmbuf_core as types;

/// Arena buffers and record builders (`osmbuf-arena`).
///
/// Most users only need [`arena::ArenaBuffer`] and the typed views
/// reached through [`arena::ArenaBuffer::records`].
pub use osmbuf_arena as arena;

/// The streaming XML reader (`osmbuf-xml`).
///
/// Feed [`xml::XmlEvent`]s to an [`xml::XmlParser`] directly, or let
/// [`xml::spawn`] run the loop on a worker thread.
pub use osmbuf_xml as xml;

/// Common imports for typical osmbuf usage.
///
/// ```rust
/// use osmbuf::prelude::*;
/// ```
///
/// This imports the most frequently used types: the entity filter, the
/// header, locations and timestamps, arena buffers with their record
/// views, and the reader entry points.
pub mod prelude {
    // Core types
    pub use osmbuf_core::{
        EntityFilter, Header, ItemKind, Location, ReadError, Timestamp, ValidationError,
    };

    // Arena buffers and views
    pub use osmbuf_arena::{
        ArenaBuffer, ChangesetView, NodeView, Record, RelationView, WayView,
    };

    // Reader
    pub use osmbuf_xml::{ReaderConfig, XmlEvent, XmlParser};
}
