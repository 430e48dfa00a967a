//! The record builder engine.
//!
//! A [`Builder`] owns the active [`ArenaBuffer`] plus a stack of open
//! record frames. Each frame remembers where its record's size field
//! lives; growing the innermost record is an indexed add into every
//! open frame's size field, which is how nested content enlarges all
//! enclosing records without a second pass.
//!
//! Padding rules (observable through record sizes, so they are part of
//! the format):
//!
//! - closing a record pads the cursor to alignment, and the pad bytes
//!   count toward the *ancestors'* sizes, not the closed record's own;
//! - padding requested while a record is still open (after the user
//!   name, after a member role) counts toward the open record itself.

use osmbuf_core::ItemKind;

use crate::buffer::{ArenaBuffer, ALIGNMENT};
use crate::error::ArenaError;
use crate::layout::{ITEM_HEADER_SIZE, ITEM_KIND_OFFSET, ITEM_SIZE_OFFSET};

/// One open record: the absolute offset of its size field and its kind.
#[derive(Clone, Copy, Debug)]
struct Frame {
    size_offset: usize,
    kind: ItemKind,
}

/// Writes records (and their descendants) into the active buffer.
///
/// Exactly one top-level record is open at a time; nested records are
/// opened and closed strictly LIFO. The typed entity operations live in
/// the [`object`](crate::object) module.
#[derive(Debug)]
pub struct Builder {
    buffer: ArenaBuffer,
    frames: Vec<Frame>,
}

impl Builder {
    /// Create a builder writing into the given buffer.
    pub fn new(buffer: ArenaBuffer) -> Self {
        Self {
            buffer,
            frames: Vec::with_capacity(4),
        }
    }

    /// Read access to the underlying buffer.
    pub fn buffer(&self) -> &ArenaBuffer {
        &self.buffer
    }

    /// Swap in a fresh buffer, returning the old one for handoff.
    ///
    /// Must only be called between top-level records.
    pub fn replace_buffer(&mut self, fresh: ArenaBuffer) -> ArenaBuffer {
        debug_assert!(self.frames.is_empty(), "buffer swapped with open records");
        std::mem::replace(&mut self.buffer, fresh)
    }

    /// Nesting depth of open records.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Kind of the innermost open record, if any.
    pub fn innermost_kind(&self) -> Option<ItemKind> {
        self.frames.last().map(|f| f.kind)
    }

    /// Open a new record of the given kind at the cursor.
    ///
    /// Reserves the item header (counted toward all ancestors) and
    /// returns the absolute offset of the record's payload.
    pub fn open_record(&mut self, kind: ItemKind) -> Result<usize, ArenaError> {
        debug_assert_eq!(
            self.buffer.cursor() % ALIGNMENT,
            0,
            "record opened at unaligned cursor"
        );
        debug_assert!(
            kind.is_entity() == self.frames.is_empty(),
            "entity records open at top level, list records nest inside one"
        );
        let header = self.buffer.reserve(ITEM_HEADER_SIZE)?;
        self.buffer.write_at(
            header + ITEM_SIZE_OFFSET,
            &(ITEM_HEADER_SIZE as u32).to_le_bytes(),
        );
        self.buffer
            .write_at(header + ITEM_KIND_OFFSET, &(kind as u16).to_le_bytes());
        self.grow(ITEM_HEADER_SIZE as u32);
        self.frames.push(Frame {
            size_offset: header + ITEM_SIZE_OFFSET,
            kind,
        });
        Ok(header + ITEM_HEADER_SIZE)
    }

    /// Add `n` bytes to the declared size of every open record.
    pub fn grow(&mut self, n: u32) {
        for frame in &self.frames {
            self.buffer.add_to_u32_at(frame.size_offset, n);
        }
    }

    /// Reserve `n` zeroed bytes inside the innermost open record.
    pub fn reserve(&mut self, n: usize) -> Result<usize, ArenaError> {
        let offset = self.buffer.reserve(n)?;
        self.grow(n as u32);
        Ok(offset)
    }

    /// Append raw bytes to the innermost open record.
    pub fn append(&mut self, bytes: &[u8]) -> Result<(), ArenaError> {
        self.buffer.append(bytes)?;
        self.grow(bytes.len() as u32);
        Ok(())
    }

    /// Append a NUL-terminated string to the innermost open record,
    /// returning the number of bytes written including the terminator.
    pub fn append_zero_terminated(&mut self, text: &str) -> Result<usize, ArenaError> {
        let written = self.buffer.append_zero_terminated(text)?;
        self.grow(written as u32);
        Ok(written)
    }

    /// Pad the cursor to alignment, counting the pad bytes toward the
    /// innermost open record and all its ancestors.
    pub fn pad_inside(&mut self) -> Result<(), ArenaError> {
        let pad = self.buffer.pad_to_alignment()?;
        if pad > 0 {
            self.grow(pad as u32);
        }
        Ok(())
    }

    /// Close the innermost open record.
    ///
    /// Pads the cursor to alignment; the pad bytes count toward the
    /// remaining ancestors only, so the closed record's declared size
    /// states its exact extent.
    pub fn close_record(&mut self) -> Result<(), ArenaError> {
        let frame = self.frames.pop();
        debug_assert!(frame.is_some(), "close_record with no open record");
        let pad = self.buffer.pad_to_alignment()?;
        if pad > 0 {
            self.grow(pad as u32);
        }
        Ok(())
    }

    /// Close the top-level record and commit it.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if nested records are still open.
    pub fn close_top_level(&mut self) -> Result<(), ArenaError> {
        debug_assert_eq!(self.frames.len(), 1, "nested records still open");
        self.close_record()?;
        self.buffer.commit();
        Ok(())
    }

    /// Overwrite bytes at an absolute offset (header field writes).
    pub(crate) fn write_at(&mut self, offset: usize, bytes: &[u8]) {
        self.buffer.write_at(offset, bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout;

    fn builder() -> Builder {
        Builder::new(ArenaBuffer::with_capacity(4096))
    }

    fn record_size(builder: &Builder, offset: usize) -> u32 {
        let data = builder.buffer().committed_slice();
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&data[offset..offset + 4]);
        u32::from_le_bytes(raw)
    }

    #[test]
    fn open_close_commit_single_record() {
        let mut b = builder();
        b.open_record(ItemKind::Node).unwrap();
        b.reserve(layout::node::HEADER_SIZE).unwrap();
        b.close_top_level().unwrap();
        // 8 header + 44 payload padded to 48 → cursor 56, size 52.
        assert_eq!(b.buffer().committed(), 56);
        assert_eq!(record_size(&b, 0), 52);
    }

    #[test]
    fn nested_growth_propagates_to_ancestors() {
        let mut b = builder();
        b.open_record(ItemKind::Way).unwrap();
        b.reserve(layout::object::COMMON_SIZE).unwrap();
        b.pad_inside().unwrap();
        let list_payload = b.open_record(ItemKind::TagList).unwrap();
        b.append_zero_terminated("highway").unwrap();
        b.append_zero_terminated("primary").unwrap();
        b.close_record().unwrap();
        b.close_top_level().unwrap();

        // Tag list: 8 header + 16 content = 24 (its own size excludes
        // the trailing pad, and 24 happens to be aligned already).
        assert_eq!(record_size(&b, list_payload - 8), 24);
        // Way: 8 + 36 + 4 pad + 24 list = 72.
        assert_eq!(record_size(&b, 0), 72);
        assert_eq!(b.buffer().committed(), 72);
    }

    #[test]
    fn close_record_pad_counts_in_parent_only() {
        let mut b = builder();
        b.open_record(ItemKind::Relation).unwrap();
        b.reserve(layout::object::COMMON_SIZE).unwrap();
        b.pad_inside().unwrap();
        let list_payload = b.open_record(ItemKind::TagList).unwrap();
        b.append_zero_terminated("ab").unwrap(); // 3 bytes, cursor unaligned
        b.close_record().unwrap();
        b.close_top_level().unwrap();

        // List size: 8 header + 3 content = 11, no trailing pad counted.
        assert_eq!(record_size(&b, list_payload - 8), 11);
        // Relation: 8 + 36 + 4 + 11 + 5 pad = 64.
        assert_eq!(record_size(&b, 0), 64);
    }

    #[test]
    fn replace_buffer_hands_over_committed_bytes() {
        let mut b = builder();
        b.open_record(ItemKind::Node).unwrap();
        b.reserve(layout::node::HEADER_SIZE).unwrap();
        b.close_top_level().unwrap();
        let committed = b.buffer().committed();

        let old = b.replace_buffer(ArenaBuffer::with_capacity(4096));
        assert_eq!(old.committed(), committed);
        assert_eq!(b.buffer().committed(), 0);
    }

    #[test]
    fn capacity_error_surfaces() {
        let mut b = Builder::new(ArenaBuffer::with_capacity(16));
        b.open_record(ItemKind::Node).unwrap();
        let result = b.reserve(layout::node::HEADER_SIZE);
        assert!(matches!(result, Err(ArenaError::CapacityExceeded { .. })));
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn record_starts_stay_aligned(tag_lens in proptest::collection::vec(0usize..40, 0..20)) {
                let mut b = Builder::new(ArenaBuffer::with_capacity(1 << 16));
                for lens in tag_lens.chunks(2) {
                    b.open_record(ItemKind::Node).unwrap();
                    b.reserve(layout::node::HEADER_SIZE).unwrap();
                    b.pad_inside().unwrap();
                    b.open_record(ItemKind::TagList).unwrap();
                    for len in lens {
                        b.append_zero_terminated(&"k".repeat(*len)).unwrap();
                        b.append_zero_terminated("v").unwrap();
                    }
                    b.close_record().unwrap();
                    b.close_top_level().unwrap();
                    prop_assert_eq!(b.buffer().committed() % ALIGNMENT, 0);
                }
            }

            #[test]
            fn declared_size_covers_content(user_len in 0usize..60, n_tags in 0usize..10) {
                let mut b = Builder::new(ArenaBuffer::with_capacity(1 << 16));
                b.open_record(ItemKind::Way).unwrap();
                b.reserve(layout::object::COMMON_SIZE).unwrap();
                b.append_zero_terminated(&"u".repeat(user_len)).unwrap();
                b.pad_inside().unwrap();
                if n_tags > 0 {
                    b.open_record(ItemKind::TagList).unwrap();
                    for i in 0..n_tags {
                        b.append_zero_terminated(&format!("key{i}")).unwrap();
                        b.append_zero_terminated("value").unwrap();
                    }
                    b.close_record().unwrap();
                }
                b.close_top_level().unwrap();

                let data = b.buffer().committed_slice();
                let mut raw = [0u8; 4];
                raw.copy_from_slice(&data[0..4]);
                let declared = u32::from_le_bytes(raw) as usize;
                // Entity size plus its trailing pad is the whole commit.
                prop_assert_eq!(layout::padded_length(declared), data.len());
            }
        }
    }
}
