//! Binary layout of records.
//!
//! All multi-byte fields are little-endian. Offsets below are relative
//! to the start of a record's payload, which begins right after the
//! item header. Variable-length string fields carry their length
//! *including* the NUL terminator.

use osmbuf_core::ItemKind;

/// Size of the item header framing every record: byte size (u32),
/// kind tag (u16), reserved (u16).
pub const ITEM_HEADER_SIZE: usize = 8;

/// Offset of the byte-size field within the item header.
pub const ITEM_SIZE_OFFSET: usize = 0;

/// Offset of the kind tag within the item header.
pub const ITEM_KIND_OFFSET: usize = 4;

/// Fixed object header shared by nodes, ways, relations and changesets.
pub mod object {
    /// Object id (i64).
    pub const ID: usize = 0;
    /// Changeset id (i64).
    pub const CHANGESET: usize = 8;
    /// Timestamp in epoch seconds (i64).
    pub const TIMESTAMP: usize = 16;
    /// User id (i32).
    pub const UID: usize = 24;
    /// Object version (u32).
    pub const VERSION: usize = 28;
    /// Flag byte; bit 0 is the visibility flag.
    pub const FLAGS: usize = 32;
    /// Length of the user name including NUL (u16).
    pub const USER_LEN: usize = 34;
    /// Size of the common part.
    pub const COMMON_SIZE: usize = 36;

    /// Visibility bit within [`FLAGS`].
    pub const FLAG_VISIBLE: u8 = 0b0000_0001;
}

/// Node-only extension of the object header.
pub mod node {
    /// Fixed-point longitude (i32).
    pub const LON: usize = super::object::COMMON_SIZE;
    /// Fixed-point latitude (i32).
    pub const LAT: usize = super::object::COMMON_SIZE + 4;
    /// Size of the node fixed header.
    pub const HEADER_SIZE: usize = super::object::COMMON_SIZE + 8;
}

/// Changeset-only extension of the object header: the bounding box.
pub mod changeset {
    /// Fixed-point minimum longitude (i32).
    pub const MIN_LON: usize = super::object::COMMON_SIZE;
    /// Fixed-point minimum latitude (i32).
    pub const MIN_LAT: usize = super::object::COMMON_SIZE + 4;
    /// Fixed-point maximum longitude (i32).
    pub const MAX_LON: usize = super::object::COMMON_SIZE + 8;
    /// Fixed-point maximum latitude (i32).
    pub const MAX_LAT: usize = super::object::COMMON_SIZE + 12;
    /// Size of the changeset fixed header.
    pub const HEADER_SIZE: usize = super::object::COMMON_SIZE + 16;
}

/// A way node reference item: ref (i64), lon (i32), lat (i32).
pub mod node_ref {
    /// Referenced node id (i64).
    pub const REF: usize = 0;
    /// Fixed-point longitude (i32).
    pub const LON: usize = 8;
    /// Fixed-point latitude (i32).
    pub const LAT: usize = 12;
    /// Size of one item.
    pub const SIZE: usize = 16;
}

/// A relation member item header, followed by the NUL-terminated role
/// (padded to alignment, counted in the list's size) and optionally a
/// complete inline member record.
pub mod member {
    /// Referenced object id (i64).
    pub const REF: usize = 0;
    /// Length of the role including NUL (u16).
    pub const ROLE_LEN: usize = 8;
    /// Member kind tag, as a u8 copy of the entity [`super::ItemKind`].
    pub const KIND: usize = 10;
    /// Flag byte; bit 0 set when a full member record follows the role.
    pub const FLAGS: usize = 11;
    /// Size of the fixed part.
    pub const SIZE: usize = 16;

    /// Full-member bit within [`FLAGS`].
    pub const FLAG_FULL_MEMBER: u8 = 0b0000_0001;
}

/// A discussion comment item header, followed by the NUL-terminated
/// user name, the NUL-terminated comment text, and alignment padding.
pub mod comment {
    /// Comment date in epoch seconds (i64).
    pub const DATE: usize = 0;
    /// Commenting user id (i32).
    pub const UID: usize = 8;
    /// Length of the user name including NUL (u16).
    pub const USER_LEN: usize = 12;
    /// Length of the comment text including NUL (u32).
    pub const TEXT_LEN: usize = 16;
    /// Size of the fixed part.
    pub const SIZE: usize = 24;
}

/// Size of the fixed header for an entity kind.
///
/// # Panics
///
/// Panics if `kind` is not an entity kind.
pub fn entity_header_size(kind: ItemKind) -> usize {
    match kind {
        ItemKind::Node => node::HEADER_SIZE,
        ItemKind::Way | ItemKind::Relation => object::COMMON_SIZE,
        ItemKind::Changeset => changeset::HEADER_SIZE,
        _ => panic!("{kind} is not an entity kind"),
    }
}

/// Round `n` up to the next multiple of the record alignment.
pub fn padded_length(n: usize) -> usize {
    (n + crate::ALIGNMENT - 1) / crate::ALIGNMENT * crate::ALIGNMENT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_sizes() {
        assert_eq!(node::HEADER_SIZE, 44);
        assert_eq!(changeset::HEADER_SIZE, 52);
        assert_eq!(entity_header_size(ItemKind::Way), 36);
    }

    #[test]
    fn padded_length_rounds_up() {
        assert_eq!(padded_length(0), 0);
        assert_eq!(padded_length(1), 8);
        assert_eq!(padded_length(8), 8);
        assert_eq!(padded_length(44), 48);
    }
}
