//! Typed entity and nested-list building operations.
//!
//! These are the field-set operations the streaming parser drives. An
//! entity is started with one of the `start_*` methods, which reserves
//! its fixed header and returns an [`EntityHandle`] for subsequent
//! field writes. The caller then appends the user name, optional
//! extension attributes, and any nested lists, and finally calls
//! [`Builder::finish_entity`].
//!
//! At most one nested list is open per entity at a time; the caller is
//! responsible for closing a differently-kinded open list before
//! opening a new one (the parser does this with an explicit state
//! check, since the resulting padding boundaries are observable).

use osmbuf_core::error::{ReadError, ValidationError};
use osmbuf_core::{ItemKind, Location, Timestamp};

use crate::builder::Builder;
use crate::layout::{self, changeset, comment, member, node, node_ref, object};

/// Handle to an open entity record: its kind and the absolute offset
/// of its fixed header within the buffer.
#[derive(Clone, Copy, Debug)]
pub struct EntityHandle {
    kind: ItemKind,
    payload: usize,
}

impl EntityHandle {
    /// The entity's kind.
    pub fn kind(&self) -> ItemKind {
        self.kind
    }
}

/// Handle to a discussion comment whose text has not been written yet.
#[derive(Clone, Copy, Debug)]
pub struct CommentHandle {
    header: usize,
}

/// Guard a length-prefixed string against overflowing its prefix.
///
/// `written` includes the NUL terminator. Oversized strings would wrap
/// the stored length and corrupt everything decoded after the field,
/// so they fail the run instead.
fn check_len(field: &'static str, written: usize, max: usize) -> Result<(), ReadError> {
    if written > max {
        return Err(ValidationError::StringTooLong {
            field,
            length: written,
        }
        .into());
    }
    Ok(())
}

impl Builder {
    fn start_entity(&mut self, kind: ItemKind) -> Result<EntityHandle, ReadError> {
        let payload = self.open_record(kind)?;
        self.reserve(layout::entity_header_size(kind))?;
        // Objects are visible unless the input says otherwise.
        self.write_at(payload + object::FLAGS, &[object::FLAG_VISIBLE]);
        if kind == ItemKind::Node {
            let undefined = Location::UNDEFINED_COORDINATE.to_le_bytes();
            self.write_at(payload + node::LON, &undefined);
            self.write_at(payload + node::LAT, &undefined);
        }
        if kind == ItemKind::Changeset {
            let undefined = Location::UNDEFINED_COORDINATE.to_le_bytes();
            for offset in [
                changeset::MIN_LON,
                changeset::MIN_LAT,
                changeset::MAX_LON,
                changeset::MAX_LAT,
            ] {
                self.write_at(payload + offset, &undefined);
            }
        }
        Ok(EntityHandle { kind, payload })
    }

    /// Start a node record.
    pub fn start_node(&mut self) -> Result<EntityHandle, ReadError> {
        self.start_entity(ItemKind::Node)
    }

    /// Start a way record.
    pub fn start_way(&mut self) -> Result<EntityHandle, ReadError> {
        self.start_entity(ItemKind::Way)
    }

    /// Start a relation record.
    pub fn start_relation(&mut self) -> Result<EntityHandle, ReadError> {
        self.start_entity(ItemKind::Relation)
    }

    /// Start a changeset record.
    pub fn start_changeset(&mut self) -> Result<EntityHandle, ReadError> {
        self.start_entity(ItemKind::Changeset)
    }

    /// Set the entity's id.
    pub fn set_id(&mut self, entity: EntityHandle, id: i64) {
        self.write_at(entity.payload + object::ID, &id.to_le_bytes());
    }

    /// Set the id of the changeset the entity was last modified in.
    pub fn set_changeset(&mut self, entity: EntityHandle, changeset: i64) {
        self.write_at(entity.payload + object::CHANGESET, &changeset.to_le_bytes());
    }

    /// Set the entity's timestamp.
    pub fn set_timestamp(&mut self, entity: EntityHandle, timestamp: Timestamp) {
        self.write_at(
            entity.payload + object::TIMESTAMP,
            &timestamp.seconds().to_le_bytes(),
        );
    }

    /// Set the id of the user who last touched the entity.
    pub fn set_uid(&mut self, entity: EntityHandle, uid: i32) {
        self.write_at(entity.payload + object::UID, &uid.to_le_bytes());
    }

    /// Set the entity's version.
    pub fn set_version(&mut self, entity: EntityHandle, version: u32) {
        self.write_at(entity.payload + object::VERSION, &version.to_le_bytes());
    }

    /// Set the entity's visibility flag.
    pub fn set_visible(&mut self, entity: EntityHandle, visible: bool) {
        let flags = if visible { object::FLAG_VISIBLE } else { 0 };
        self.write_at(entity.payload + object::FLAGS, &[flags]);
    }

    /// Set a node's location.
    pub fn set_location(&mut self, entity: EntityHandle, location: Location) {
        debug_assert_eq!(entity.kind, ItemKind::Node);
        self.write_at(entity.payload + node::LON, &location.raw_lon().to_le_bytes());
        self.write_at(entity.payload + node::LAT, &location.raw_lat().to_le_bytes());
    }

    /// Set a changeset's bounding coordinates.
    pub fn set_bounds(&mut self, entity: EntityHandle, min: Location, max: Location) {
        debug_assert_eq!(entity.kind, ItemKind::Changeset);
        self.write_at(
            entity.payload + changeset::MIN_LON,
            &min.raw_lon().to_le_bytes(),
        );
        self.write_at(
            entity.payload + changeset::MIN_LAT,
            &min.raw_lat().to_le_bytes(),
        );
        self.write_at(
            entity.payload + changeset::MAX_LON,
            &max.raw_lon().to_le_bytes(),
        );
        self.write_at(
            entity.payload + changeset::MAX_LAT,
            &max.raw_lat().to_le_bytes(),
        );
    }

    /// Append the variable-length user name right after the fixed
    /// header, recording its length (including NUL) in the header, and
    /// pad so nested lists start aligned.
    ///
    /// Must be called exactly once per entity, before any nested list.
    pub fn append_user(&mut self, entity: EntityHandle, name: &str) -> Result<(), ReadError> {
        let written = self.append_zero_terminated(name)?;
        check_len("user name", written, u16::MAX as usize)?;
        self.write_at(
            entity.payload + object::USER_LEN,
            &(written as u16).to_le_bytes(),
        );
        self.pad_inside()?;
        Ok(())
    }

    /// Append one key/value tag to the open tag list.
    pub fn add_tag(&mut self, key: &str, value: &str) -> Result<(), ReadError> {
        debug_assert_eq!(self.innermost_kind(), Some(ItemKind::TagList));
        self.append_zero_terminated(key)?;
        self.append_zero_terminated(value)?;
        Ok(())
    }

    /// Append one verbatim attribute to the open extension list.
    pub fn add_extension_attr(&mut self, name: &str, value: &str) -> Result<(), ReadError> {
        debug_assert_eq!(self.innermost_kind(), Some(ItemKind::ExtensionAttrList));
        self.append_zero_terminated(name)?;
        self.append_zero_terminated(value)?;
        Ok(())
    }

    /// Append one node reference to the open node-ref list.
    ///
    /// A missing location is stored as the undefined sentinel.
    pub fn add_node_ref(&mut self, id: i64, location: Option<Location>) -> Result<(), ReadError> {
        debug_assert_eq!(self.innermost_kind(), Some(ItemKind::NodeRefList));
        let location = location.unwrap_or(Location::UNDEFINED);
        let offset = self.reserve(node_ref::SIZE)?;
        self.write_at(offset + node_ref::REF, &id.to_le_bytes());
        self.write_at(offset + node_ref::LON, &location.raw_lon().to_le_bytes());
        self.write_at(offset + node_ref::LAT, &location.raw_lat().to_le_bytes());
        Ok(())
    }

    /// Append one typed member to the open member list.
    ///
    /// `kind` must be node, way or relation and `ref_id` must be
    /// non-zero. If a full-member snapshot (a complete serialized
    /// record, alignment-padded) is given, it is appended after the
    /// role and the member is flagged as resolved.
    pub fn add_member(
        &mut self,
        kind: ItemKind,
        ref_id: i64,
        role: &str,
        full_member: Option<&[u8]>,
    ) -> Result<(), ReadError> {
        debug_assert_eq!(self.innermost_kind(), Some(ItemKind::RelationMemberList));
        if !kind.is_entity() || kind == ItemKind::Changeset {
            return Err(ValidationError::UnknownMemberType {
                found: kind.to_string(),
            }
            .into());
        }
        if ref_id == 0 {
            return Err(ValidationError::MissingMemberRef.into());
        }
        let offset = self.reserve(member::SIZE)?;
        self.write_at(offset + member::REF, &ref_id.to_le_bytes());
        self.write_at(offset + member::KIND, &[kind as u8]);
        if full_member.is_some() {
            self.write_at(offset + member::FLAGS, &[member::FLAG_FULL_MEMBER]);
        }
        let role_len = self.append_zero_terminated(role)?;
        check_len("member role", role_len, u16::MAX as usize)?;
        self.write_at(offset + member::ROLE_LEN, &(role_len as u16).to_le_bytes());
        self.pad_inside()?;
        if let Some(bytes) = full_member {
            debug_assert_eq!(bytes.len() % crate::ALIGNMENT, 0);
            self.append(bytes)?;
        }
        Ok(())
    }

    /// Append a comment entry to the open discussion list.
    ///
    /// The comment's text length is backfilled later through the
    /// returned handle by [`Builder::add_comment_text`].
    pub fn add_comment(
        &mut self,
        date: Timestamp,
        uid: i32,
        user: &str,
    ) -> Result<CommentHandle, ReadError> {
        debug_assert_eq!(self.innermost_kind(), Some(ItemKind::ChangesetDiscussion));
        let header = self.reserve(comment::SIZE)?;
        self.write_at(header + comment::DATE, &date.seconds().to_le_bytes());
        self.write_at(header + comment::UID, &uid.to_le_bytes());
        let user_len = self.append_zero_terminated(user)?;
        check_len("comment user name", user_len, u16::MAX as usize)?;
        self.write_at(
            header + comment::USER_LEN,
            &(user_len as u16).to_le_bytes(),
        );
        Ok(CommentHandle { header })
    }

    /// Append the accumulated free text of a comment and close the
    /// comment item (pad to alignment).
    pub fn add_comment_text(
        &mut self,
        handle: CommentHandle,
        text: &str,
    ) -> Result<(), ReadError> {
        let text_len = self.append_zero_terminated(text)?;
        check_len("comment text", text_len, u32::MAX as usize)?;
        self.write_at(
            handle.header + comment::TEXT_LEN,
            &(text_len as u32).to_le_bytes(),
        );
        self.pad_inside()?;
        Ok(())
    }

    /// Finalize the entity: close its record and commit the region.
    ///
    /// Any open nested list must have been closed already.
    pub fn finish_entity(&mut self) -> Result<(), ReadError> {
        self.close_top_level()?;
        Ok(())
    }
}
