//! Entity id types and the pure text-parsing helpers for them.
//!
//! OSM ids are plain signed integers on the wire; they stay as aliases
//! rather than newtypes, since records store them as raw little-endian
//! fields anyway.

use crate::error::ReadError;

/// Id of a node, way, relation or changeset. Negative ids are used by
/// editors for objects that have not been uploaded yet.
pub type ObjectId = i64;

/// Id of the changeset an object was last modified in.
pub type ChangesetId = i64;

/// Id of the user who last touched an object. 0 means anonymous.
pub type UserId = i32;

/// Parse an object id from attribute text.
///
/// Accepts an optional leading sign. Fails with [`ReadError::Markup`] on
/// empty or non-numeric input.
pub fn parse_object_id(text: &str) -> Result<ObjectId, ReadError> {
    text.trim().parse::<i64>().map_err(|_| ReadError::Markup {
        reason: format!("invalid object id '{text}'"),
    })
}

/// Parse a changeset id from attribute text.
pub fn parse_changeset_id(text: &str) -> Result<ChangesetId, ReadError> {
    text.trim().parse::<i64>().map_err(|_| ReadError::Markup {
        reason: format!("invalid changeset id '{text}'"),
    })
}

/// Parse a user id from attribute text.
pub fn parse_user_id(text: &str) -> Result<UserId, ReadError> {
    text.trim().parse::<i32>().map_err(|_| ReadError::Markup {
        reason: format!("invalid user id '{text}'"),
    })
}

/// Parse an object version from attribute text.
pub fn parse_version(text: &str) -> Result<u32, ReadError> {
    text.trim().parse::<u32>().map_err(|_| ReadError::Markup {
        reason: format!("invalid object version '{text}'"),
    })
}
