//! Read-side views over committed buffers.
//!
//! A finished buffer is self-describing: [`ArenaBuffer::records`] walks
//! the committed region record by record, and the typed views decode
//! the fixed layouts from [`layout`](crate::layout). Decoding is pure
//! slice arithmetic; nothing is copied.

use osmbuf_core::{ItemKind, Location, Timestamp};

use crate::buffer::{ArenaBuffer, ALIGNMENT};
use crate::layout::{
    self, changeset, comment, member, node, node_ref, object, ITEM_HEADER_SIZE, ITEM_KIND_OFFSET,
    ITEM_SIZE_OFFSET,
};

fn u16_at(data: &[u8], offset: usize) -> u16 {
    let mut raw = [0u8; 2];
    raw.copy_from_slice(&data[offset..offset + 2]);
    u16::from_le_bytes(raw)
}

fn u32_at(data: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&data[offset..offset + 4]);
    u32::from_le_bytes(raw)
}

fn i32_at(data: &[u8], offset: usize) -> i32 {
    u32_at(data, offset) as i32
}

fn i64_at(data: &[u8], offset: usize) -> i64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&data[offset..offset + 8]);
    i64::from_le_bytes(raw)
}

/// Decode a length-prefixed NUL-terminated string field.
///
/// `len` includes the terminator; a zero length means the field was
/// never written and reads as "".
fn str_at(data: &[u8], offset: usize, len: usize) -> &str {
    if len == 0 {
        return "";
    }
    std::str::from_utf8(&data[offset..offset + len - 1]).unwrap_or("")
}

/// One serialized record: its kind plus the full framed bytes.
#[derive(Clone, Copy, Debug)]
pub struct Record<'a> {
    kind: ItemKind,
    data: &'a [u8],
}

impl<'a> Record<'a> {
    /// The record's kind tag.
    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    /// The record's declared size in bytes, including the item header
    /// but not the trailing alignment padding.
    pub fn byte_size(&self) -> usize {
        u32_at(self.data, ITEM_SIZE_OFFSET) as usize
    }

    /// The complete framed bytes, e.g. for embedding as a full member.
    /// Padded to alignment so the result can be appended verbatim.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// The payload after the item header, up to the declared size.
    fn payload(&self) -> &'a [u8] {
        &self.data[ITEM_HEADER_SIZE..self.byte_size()]
    }

    /// View this record as a node.
    pub fn as_node(&self) -> Option<NodeView<'a>> {
        (self.kind == ItemKind::Node).then(|| NodeView {
            object: ObjectBytes {
                payload: self.payload(),
                header_size: node::HEADER_SIZE,
            },
        })
    }

    /// View this record as a way.
    pub fn as_way(&self) -> Option<WayView<'a>> {
        (self.kind == ItemKind::Way).then(|| WayView {
            object: ObjectBytes {
                payload: self.payload(),
                header_size: object::COMMON_SIZE,
            },
        })
    }

    /// View this record as a relation.
    pub fn as_relation(&self) -> Option<RelationView<'a>> {
        (self.kind == ItemKind::Relation).then(|| RelationView {
            object: ObjectBytes {
                payload: self.payload(),
                header_size: object::COMMON_SIZE,
            },
        })
    }

    /// View this record as a changeset.
    pub fn as_changeset(&self) -> Option<ChangesetView<'a>> {
        (self.kind == ItemKind::Changeset).then(|| ChangesetView {
            object: ObjectBytes {
                payload: self.payload(),
                header_size: changeset::HEADER_SIZE,
            },
        })
    }
}

/// Iterator over the records in a well-formed region.
#[derive(Clone, Debug)]
pub struct RecordIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> RecordIter<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl<'a> Iterator for RecordIter<'a> {
    type Item = Record<'a>;

    fn next(&mut self) -> Option<Record<'a>> {
        if self.pos + ITEM_HEADER_SIZE > self.data.len() {
            return None;
        }
        let size = u32_at(self.data, self.pos + ITEM_SIZE_OFFSET) as usize;
        let kind = ItemKind::from_u16(u16_at(self.data, self.pos + ITEM_KIND_OFFSET))?;
        let end = self.pos + layout::padded_length(size);
        // Hand out padded frames so entity records can be re-embedded
        // verbatim as full members.
        let record = Record {
            kind,
            data: &self.data[self.pos..end.min(self.data.len())],
        };
        self.pos = end;
        Some(record)
    }
}

impl ArenaBuffer {
    /// Iterate the committed region as typed records.
    pub fn records(&self) -> RecordIter<'_> {
        debug_assert_eq!(self.committed() % ALIGNMENT, 0);
        RecordIter::new(self.committed_slice())
    }
}

/// Shared decoding for the common object header.
#[derive(Clone, Copy, Debug)]
struct ObjectBytes<'a> {
    payload: &'a [u8],
    header_size: usize,
}

impl<'a> ObjectBytes<'a> {
    fn id(&self) -> i64 {
        i64_at(self.payload, object::ID)
    }

    fn changeset(&self) -> i64 {
        i64_at(self.payload, object::CHANGESET)
    }

    fn timestamp(&self) -> Timestamp {
        Timestamp(i64_at(self.payload, object::TIMESTAMP))
    }

    fn uid(&self) -> i32 {
        i32_at(self.payload, object::UID)
    }

    fn version(&self) -> u32 {
        u32_at(self.payload, object::VERSION)
    }

    fn visible(&self) -> bool {
        self.payload[object::FLAGS] & object::FLAG_VISIBLE != 0
    }

    fn user(&self) -> &'a str {
        let len = u16_at(self.payload, object::USER_LEN) as usize;
        str_at(self.payload, self.header_size, len)
    }

    /// The nested list region: everything after the user name, padded.
    fn sublists(&self) -> RecordIter<'a> {
        let user_len = u16_at(self.payload, object::USER_LEN) as usize;
        let start = layout::padded_length(self.header_size + user_len);
        RecordIter::new(&self.payload[start.min(self.payload.len())..])
    }

    /// Payload of the first nested list of the given kind, or empty.
    fn list_payload(&self, kind: ItemKind) -> &'a [u8] {
        for record in self.sublists() {
            if record.kind() == kind {
                let size = u32_at(record.data, ITEM_SIZE_OFFSET) as usize;
                return &record.data[ITEM_HEADER_SIZE..size];
            }
        }
        &[]
    }

    fn tags(&self) -> TagIter<'a> {
        TagIter {
            data: self.list_payload(ItemKind::TagList),
            pos: 0,
        }
    }

    fn extension_attrs(&self) -> TagIter<'a> {
        TagIter {
            data: self.list_payload(ItemKind::ExtensionAttrList),
            pos: 0,
        }
    }
}

macro_rules! object_accessors {
    () => {
        /// The entity's id.
        pub fn id(&self) -> i64 {
            self.object.id()
        }

        /// Id of the changeset the entity was last modified in.
        pub fn changeset(&self) -> i64 {
            self.object.changeset()
        }

        /// The entity's timestamp.
        pub fn timestamp(&self) -> Timestamp {
            self.object.timestamp()
        }

        /// Id of the user who last touched the entity.
        pub fn uid(&self) -> i32 {
            self.object.uid()
        }

        /// The entity's version.
        pub fn version(&self) -> u32 {
            self.object.version()
        }

        /// Whether the entity is visible (not deleted).
        pub fn visible(&self) -> bool {
            self.object.visible()
        }

        /// Name of the user who last touched the entity.
        pub fn user(&self) -> &'a str {
            self.object.user()
        }

        /// The entity's tags in document order.
        pub fn tags(&self) -> TagIter<'a> {
            self.object.tags()
        }

        /// Attributes preserved verbatim from the input.
        pub fn extension_attrs(&self) -> TagIter<'a> {
            self.object.extension_attrs()
        }
    };
}

/// Decoded view of a node record.
#[derive(Clone, Copy, Debug)]
pub struct NodeView<'a> {
    object: ObjectBytes<'a>,
}

impl<'a> NodeView<'a> {
    object_accessors!();

    /// The node's location; undefined if the input had no coordinates.
    pub fn location(&self) -> Location {
        Location::from_raw(
            i32_at(self.object.payload, node::LON),
            i32_at(self.object.payload, node::LAT),
        )
    }
}

/// Decoded view of a way record.
#[derive(Clone, Copy, Debug)]
pub struct WayView<'a> {
    object: ObjectBytes<'a>,
}

impl<'a> WayView<'a> {
    object_accessors!();

    /// The way's ordered node references.
    pub fn node_refs(&self) -> NodeRefIter<'a> {
        NodeRefIter {
            data: self.object.list_payload(ItemKind::NodeRefList),
            pos: 0,
        }
    }
}

/// Decoded view of a relation record.
#[derive(Clone, Copy, Debug)]
pub struct RelationView<'a> {
    object: ObjectBytes<'a>,
}

impl<'a> RelationView<'a> {
    object_accessors!();

    /// The relation's ordered typed members.
    pub fn members(&self) -> MemberIter<'a> {
        MemberIter {
            data: self.object.list_payload(ItemKind::RelationMemberList),
            pos: 0,
        }
    }
}

/// Decoded view of a changeset record.
#[derive(Clone, Copy, Debug)]
pub struct ChangesetView<'a> {
    object: ObjectBytes<'a>,
}

impl<'a> ChangesetView<'a> {
    object_accessors!();

    /// The changeset's bounding coordinates as (min, max).
    pub fn bounds(&self) -> (Location, Location) {
        let p = self.object.payload;
        (
            Location::from_raw(i32_at(p, changeset::MIN_LON), i32_at(p, changeset::MIN_LAT)),
            Location::from_raw(i32_at(p, changeset::MAX_LON), i32_at(p, changeset::MAX_LAT)),
        )
    }

    /// The changeset's discussion comments in document order.
    pub fn comments(&self) -> CommentIter<'a> {
        CommentIter {
            data: self.object.list_payload(ItemKind::ChangesetDiscussion),
            pos: 0,
        }
    }
}

/// Iterator over key/value string pairs (tags or extension attributes).
#[derive(Clone, Debug)]
pub struct TagIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> TagIter<'a> {
    fn next_str(&mut self) -> Option<&'a str> {
        let rest = &self.data[self.pos..];
        let nul = rest.iter().position(|&b| b == 0)?;
        self.pos += nul + 1;
        std::str::from_utf8(&rest[..nul]).ok()
    }
}

impl<'a> Iterator for TagIter<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<(&'a str, &'a str)> {
        if self.pos >= self.data.len() {
            return None;
        }
        let key = self.next_str()?;
        let value = self.next_str()?;
        Some((key, value))
    }
}

/// Iterator over a way's node references.
#[derive(Clone, Debug)]
pub struct NodeRefIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for NodeRefIter<'a> {
    type Item = (i64, Location);

    fn next(&mut self) -> Option<(i64, Location)> {
        if self.pos + node_ref::SIZE > self.data.len() {
            return None;
        }
        let item = &self.data[self.pos..];
        self.pos += node_ref::SIZE;
        Some((
            i64_at(item, node_ref::REF),
            Location::from_raw(i32_at(item, node_ref::LON), i32_at(item, node_ref::LAT)),
        ))
    }
}

/// Decoded view of one relation member.
#[derive(Clone, Copy, Debug)]
pub struct MemberView<'a> {
    data: &'a [u8],
}

impl<'a> MemberView<'a> {
    /// The member's entity kind.
    pub fn kind(&self) -> ItemKind {
        ItemKind::from_u16(u16::from(self.data[member::KIND])).unwrap_or(ItemKind::Node)
    }

    /// Id of the referenced entity. Never zero.
    pub fn ref_id(&self) -> i64 {
        i64_at(self.data, member::REF)
    }

    /// The member's role, possibly empty.
    pub fn role(&self) -> &'a str {
        let len = u16_at(self.data, member::ROLE_LEN) as usize;
        str_at(self.data, member::SIZE, len)
    }

    /// Whether an inline full-member snapshot follows the role.
    pub fn is_resolved(&self) -> bool {
        self.data[member::FLAGS] & member::FLAG_FULL_MEMBER != 0
    }

    /// The inline full-member record, if the member is resolved.
    pub fn full_member(&self) -> Option<Record<'a>> {
        if !self.is_resolved() {
            return None;
        }
        let role_len = u16_at(self.data, member::ROLE_LEN) as usize;
        let offset = member::SIZE + layout::padded_length(role_len);
        RecordIter::new(&self.data[offset..]).next()
    }
}

/// Iterator over a relation's members.
#[derive(Clone, Debug)]
pub struct MemberIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for MemberIter<'a> {
    type Item = MemberView<'a>;

    fn next(&mut self) -> Option<MemberView<'a>> {
        if self.pos + member::SIZE > self.data.len() {
            return None;
        }
        let item = &self.data[self.pos..];
        let role_len = u16_at(item, member::ROLE_LEN) as usize;
        let mut advance = member::SIZE + layout::padded_length(role_len);
        if item[member::FLAGS] & member::FLAG_FULL_MEMBER != 0 {
            let full_size = u32_at(item, advance + ITEM_SIZE_OFFSET) as usize;
            advance += layout::padded_length(full_size);
        }
        let view = MemberView {
            data: &item[..advance.min(item.len())],
        };
        self.pos += advance;
        Some(view)
    }
}

/// Decoded view of one discussion comment.
#[derive(Clone, Copy, Debug)]
pub struct CommentView<'a> {
    data: &'a [u8],
}

impl<'a> CommentView<'a> {
    /// When the comment was written.
    pub fn date(&self) -> Timestamp {
        Timestamp(i64_at(self.data, comment::DATE))
    }

    /// Id of the commenting user.
    pub fn uid(&self) -> i32 {
        i32_at(self.data, comment::UID)
    }

    /// Name of the commenting user.
    pub fn user(&self) -> &'a str {
        let len = u16_at(self.data, comment::USER_LEN) as usize;
        str_at(self.data, comment::SIZE, len)
    }

    /// The comment's free text.
    pub fn text(&self) -> &'a str {
        let user_len = u16_at(self.data, comment::USER_LEN) as usize;
        let text_len = u32_at(self.data, comment::TEXT_LEN) as usize;
        str_at(self.data, comment::SIZE + user_len, text_len)
    }
}

/// Iterator over a changeset discussion's comments.
#[derive(Clone, Debug)]
pub struct CommentIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for CommentIter<'a> {
    type Item = CommentView<'a>;

    fn next(&mut self) -> Option<CommentView<'a>> {
        if self.pos + comment::SIZE > self.data.len() {
            return None;
        }
        let item = &self.data[self.pos..];
        let user_len = u16_at(item, comment::USER_LEN) as usize;
        let text_len = u32_at(item, comment::TEXT_LEN) as usize;
        let advance = layout::padded_length(comment::SIZE + user_len + text_len);
        let view = CommentView {
            data: &item[..advance.min(item.len())],
        };
        self.pos += advance;
        Some(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;

    #[test]
    fn empty_buffer_yields_no_records() {
        let buf = ArenaBuffer::with_capacity(64);
        assert!(buf.records().next().is_none());
    }

    #[test]
    fn uncommitted_region_is_invisible() {
        let mut b = Builder::new(ArenaBuffer::with_capacity(4096));
        let h = b.start_node().unwrap();
        b.set_id(h, 1);
        b.append_user(h, "").unwrap();
        b.finish_entity().unwrap();
        // Second record open but not committed.
        let h = b.start_node().unwrap();
        b.set_id(h, 2);
        assert_eq!(b.buffer().records().count(), 1);
        b.append_user(h, "").unwrap();
        b.finish_entity().unwrap();
        assert_eq!(b.buffer().records().count(), 2);
    }

    #[test]
    fn record_starts_are_aligned() {
        let mut b = Builder::new(ArenaBuffer::with_capacity(1 << 16));
        for (i, user) in ["a", "bcdef", "", "xyz"].iter().enumerate() {
            let h = b.start_node().unwrap();
            b.set_id(h, i as i64);
            b.append_user(h, user).unwrap();
            b.open_record(ItemKind::TagList).unwrap();
            b.add_tag("name", user).unwrap();
            b.close_record().unwrap();
            b.finish_entity().unwrap();
        }
        let data = b.buffer().committed_slice();
        let mut pos = 0;
        let mut count = 0;
        while pos + ITEM_HEADER_SIZE <= data.len() {
            assert_eq!(pos % ALIGNMENT, 0);
            let size = u32_at(data, pos + ITEM_SIZE_OFFSET) as usize;
            pos += layout::padded_length(size);
            count += 1;
        }
        assert_eq!(count, 4);
        assert_eq!(pos, data.len());
    }

    #[test]
    fn declared_size_matches_header_plus_lists() {
        let mut b = Builder::new(ArenaBuffer::with_capacity(4096));
        let h = b.start_way().unwrap();
        b.append_user(h, "u").unwrap();
        b.open_record(ItemKind::NodeRefList).unwrap();
        b.add_node_ref(1, None).unwrap();
        b.add_node_ref(2, None).unwrap();
        b.close_record().unwrap();
        b.open_record(ItemKind::TagList).unwrap();
        b.add_tag("k", "v").unwrap();
        b.close_record().unwrap();
        b.finish_entity().unwrap();

        let data = b.buffer().committed_slice();
        let declared = u32_at(data, ITEM_SIZE_OFFSET) as usize;
        // header 8 + common 36 + user 2 + pad 2 → 48;
        // node ref list 8 + 32 = 40 (aligned);
        // tag list 8 + 4 = 12, padded to 16 in the parent.
        assert_eq!(declared, 48 + 40 + 12 + 4);
        assert_eq!(data.len(), layout::padded_length(declared));
    }
}
