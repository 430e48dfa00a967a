//! Arena buffers and record builders for the osmbuf OSM reader.
//!
//! Entities are written sequentially into fixed-capacity byte arenas so
//! that millions of them can be ingested without per-entity heap
//! allocation. Each record is framed by a small item header carrying a
//! kind tag and its total byte size, and every record start is aligned
//! to [`ALIGNMENT`] bytes.
//!
//! # Architecture
//!
//! ```text
//! Builder (owns ArenaBuffer + open-frame stack)
//! ├── ArenaBuffer      append-only bytes, committed watermark
//! ├── Frame stack      size-field offsets of open records
//! └── typed ops        start_node/.../add_tag/add_member/...
//! ```
//!
//! Growth of a nested record propagates to every ancestor through an
//! explicit stack of size-field offsets rather than parent pointers, so
//! it is an indexed write into the buffer and needs no `unsafe`.
//!
//! Finished buffers are self-describing: [`ArenaBuffer::records`]
//! iterates the committed region as typed [`Record`] views.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod buffer;
pub mod builder;
pub mod error;
pub mod layout;
pub mod object;
pub mod reader;

// Public re-exports for the primary API surface.
pub use buffer::{ArenaBuffer, ALIGNMENT};
pub use builder::Builder;
pub use error::ArenaError;
pub use object::{CommentHandle, EntityHandle};
pub use reader::{
    ChangesetView, CommentView, MemberView, NodeView, Record, RecordIter, RelationView, WayView,
};
