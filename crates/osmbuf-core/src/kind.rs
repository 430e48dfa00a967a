//! Record kind tags used in arena item headers.

use std::fmt;

/// The kind tag stored in every record's item header.
///
/// Entity kinds occupy the low range; nested list kinds start at 0x11,
/// so a corrupted header is unlikely to alias a valid kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ItemKind {
    /// A node (point) entity.
    Node = 0x01,
    /// A way entity.
    Way = 0x02,
    /// A relation entity.
    Relation = 0x03,
    /// A changeset entity.
    Changeset = 0x04,
    /// Nested list of key/value tags.
    TagList = 0x11,
    /// Nested list of way node references.
    NodeRefList = 0x12,
    /// Nested list of typed relation members.
    RelationMemberList = 0x13,
    /// Nested list of changeset discussion comments.
    ChangesetDiscussion = 0x14,
    /// Nested list of attributes preserved verbatim from the input.
    ExtensionAttrList = 0x15,
}

impl ItemKind {
    /// Decode a kind tag from its wire value.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x01 => Some(Self::Node),
            0x02 => Some(Self::Way),
            0x03 => Some(Self::Relation),
            0x04 => Some(Self::Changeset),
            0x11 => Some(Self::TagList),
            0x12 => Some(Self::NodeRefList),
            0x13 => Some(Self::RelationMemberList),
            0x14 => Some(Self::ChangesetDiscussion),
            0x15 => Some(Self::ExtensionAttrList),
            _ => None,
        }
    }

    /// Decode a relation member type from the first character of its
    /// `type` attribute ("node", "way", "relation").
    pub fn from_member_char(c: char) -> Option<Self> {
        match c {
            'n' => Some(Self::Node),
            'w' => Some(Self::Way),
            'r' => Some(Self::Relation),
            _ => None,
        }
    }

    /// Whether this kind is a top-level entity record.
    pub fn is_entity(&self) -> bool {
        matches!(
            self,
            Self::Node | Self::Way | Self::Relation | Self::Changeset
        )
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
            Self::Changeset => "changeset",
            Self::TagList => "tag list",
            Self::NodeRefList => "node ref list",
            Self::RelationMemberList => "relation member list",
            Self::ChangesetDiscussion => "changeset discussion",
            Self::ExtensionAttrList => "extension attribute list",
        };
        f.write_str(name)
    }
}
