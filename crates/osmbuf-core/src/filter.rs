//! The entity-kind read filter.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use crate::kind::ItemKind;

/// A set of entity kinds the reader should materialize.
///
/// Entities excluded by the filter are structurally skipped during
/// parsing: only enough of them is read to locate their closing element,
/// and no record is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntityFilter(u8);

impl EntityFilter {
    /// Matches nothing. With an empty filter the reader stops as soon
    /// as the document header has been delivered.
    pub const EMPTY: EntityFilter = EntityFilter(0);
    /// Nodes only.
    pub const NODE: EntityFilter = EntityFilter(1 << 0);
    /// Ways only.
    pub const WAY: EntityFilter = EntityFilter(1 << 1);
    /// Relations only.
    pub const RELATION: EntityFilter = EntityFilter(1 << 2);
    /// Changesets only.
    pub const CHANGESET: EntityFilter = EntityFilter(1 << 3);
    /// Every entity kind.
    pub const ALL: EntityFilter = EntityFilter(0b1111);

    /// Whether the filter selects the given entity kind.
    ///
    /// Non-entity kinds are never selected.
    pub fn contains(&self, kind: ItemKind) -> bool {
        let bit = match kind {
            ItemKind::Node => Self::NODE.0,
            ItemKind::Way => Self::WAY.0,
            ItemKind::Relation => Self::RELATION.0,
            ItemKind::Changeset => Self::CHANGESET.0,
            _ => 0,
        };
        self.0 & bit != 0
    }

    /// Whether the filter selects no entity kind at all.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl Default for EntityFilter {
    fn default() -> Self {
        Self::ALL
    }
}

impl BitOr for EntityFilter {
    type Output = EntityFilter;

    fn bitor(self, rhs: EntityFilter) -> EntityFilter {
        EntityFilter(self.0 | rhs.0)
    }
}

impl BitOrAssign for EntityFilter {
    fn bitor_assign(&mut self, rhs: EntityFilter) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for EntityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (bit, name) in [
            (Self::NODE, "node"),
            (Self::WAY, "way"),
            (Self::RELATION, "relation"),
            (Self::CHANGESET, "changeset"),
        ] {
            if self.0 & bit.0 != 0 {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        if first {
            f.write_str("nothing")?;
        }
        Ok(())
    }
}
