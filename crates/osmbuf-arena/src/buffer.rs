//! The append-only arena buffer.
//!
//! An [`ArenaBuffer`] is a fixed-capacity byte region with a write
//! cursor and a committed watermark. Records are written at the cursor
//! by the active builder chain; once a top-level entity is complete the
//! region up to the cursor is committed and becomes visible to readers.
//! The region between the committed watermark and the cursor holds at
//! most one partially written entity.

use crate::error::ArenaError;

/// Alignment of every record start, in bytes.
pub const ALIGNMENT: usize = 8;

/// A fixed-capacity append-only byte region.
///
/// Invariant: `committed <= cursor <= capacity`, and both the committed
/// watermark and every record boundary are multiples of [`ALIGNMENT`].
/// Exactly one producer writes a given buffer; there is no interior
/// mutability and no concurrent access to an open buffer.
#[derive(Debug)]
pub struct ArenaBuffer {
    /// Backing storage; `data.len()` is the write cursor.
    data: Vec<u8>,
    capacity: usize,
    committed: usize,
}

impl ArenaBuffer {
    /// Create an empty buffer with the given fixed capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            capacity,
            committed: 0,
        }
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current write cursor.
    pub fn cursor(&self) -> usize {
        self.data.len()
    }

    /// Bytes committed so far.
    pub fn committed(&self) -> usize {
        self.committed
    }

    /// Whether nothing has been committed yet.
    pub fn is_empty(&self) -> bool {
        self.committed == 0
    }

    /// Reserve `n` zeroed bytes at the cursor, returning their offset.
    pub fn reserve(&mut self, n: usize) -> Result<usize, ArenaError> {
        let offset = self.data.len();
        let new_cursor = offset.checked_add(n).ok_or(ArenaError::CapacityExceeded {
            requested: n,
            capacity: self.capacity,
        })?;
        if new_cursor > self.capacity {
            return Err(ArenaError::CapacityExceeded {
                requested: n,
                capacity: self.capacity,
            });
        }
        self.data.resize(new_cursor, 0);
        Ok(offset)
    }

    /// Append raw bytes at the cursor, returning the number written.
    pub fn append(&mut self, bytes: &[u8]) -> Result<usize, ArenaError> {
        if self.data.len() + bytes.len() > self.capacity {
            return Err(ArenaError::CapacityExceeded {
                requested: bytes.len(),
                capacity: self.capacity,
            });
        }
        self.data.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    /// Append text followed by a NUL byte, returning the number of
    /// bytes written including the terminator.
    pub fn append_zero_terminated(&mut self, text: &str) -> Result<usize, ArenaError> {
        let written = self.append(text.as_bytes())?;
        self.append(&[0])?;
        Ok(written + 1)
    }

    /// Zero-pad the cursor to the next multiple of [`ALIGNMENT`],
    /// returning the number of pad bytes written.
    pub fn pad_to_alignment(&mut self) -> Result<usize, ArenaError> {
        let misalign = self.data.len() % ALIGNMENT;
        if misalign == 0 {
            return Ok(0);
        }
        let pad = ALIGNMENT - misalign;
        self.reserve(pad)?;
        Ok(pad)
    }

    /// Advance the committed watermark to the cursor.
    ///
    /// Called once per fully written top-level entity. The cursor is
    /// aligned at this point because closing a record always pads.
    pub fn commit(&mut self) {
        debug_assert_eq!(self.data.len() % ALIGNMENT, 0);
        self.committed = self.data.len();
    }

    /// The committed region, ready for iteration or handoff.
    pub fn committed_slice(&self) -> &[u8] {
        &self.data[..self.committed]
    }

    /// Overwrite bytes at an absolute offset inside the written region.
    ///
    /// # Panics
    ///
    /// Panics if the range is outside the written region. Offsets come
    /// from `reserve()` on this buffer, so that indicates a logic bug.
    pub(crate) fn write_at(&mut self, offset: usize, bytes: &[u8]) {
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    /// Read a little-endian u32 at an absolute offset.
    pub(crate) fn read_u32_at(&self, offset: usize) -> u32 {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.data[offset..offset + 4]);
        u32::from_le_bytes(raw)
    }

    /// Add `n` to the little-endian u32 at an absolute offset.
    pub(crate) fn add_to_u32_at(&mut self, offset: usize, n: u32) {
        let value = self.read_u32_at(offset) + n;
        self.write_at(offset, &value.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_buffer_is_empty() {
        let buf = ArenaBuffer::with_capacity(1024);
        assert_eq!(buf.capacity(), 1024);
        assert_eq!(buf.cursor(), 0);
        assert_eq!(buf.committed(), 0);
        assert!(buf.is_empty());
    }

    #[test]
    fn reserve_advances_cursor_and_zero_fills() {
        let mut buf = ArenaBuffer::with_capacity(1024);
        let off = buf.reserve(16).unwrap();
        assert_eq!(off, 0);
        assert_eq!(buf.cursor(), 16);
        let off2 = buf.reserve(8).unwrap();
        assert_eq!(off2, 16);
    }

    #[test]
    fn reserve_fails_past_capacity() {
        let mut buf = ArenaBuffer::with_capacity(16);
        buf.reserve(16).unwrap();
        let result = buf.reserve(1);
        assert!(matches!(
            result,
            Err(ArenaError::CapacityExceeded {
                requested: 1,
                capacity: 16
            })
        ));
    }

    #[test]
    fn append_zero_terminated_counts_nul() {
        let mut buf = ArenaBuffer::with_capacity(64);
        let written = buf.append_zero_terminated("abc").unwrap();
        assert_eq!(written, 4);
        assert_eq!(buf.cursor(), 4);
    }

    #[test]
    fn pad_to_alignment() {
        let mut buf = ArenaBuffer::with_capacity(64);
        buf.append(b"abc").unwrap();
        let pad = buf.pad_to_alignment().unwrap();
        assert_eq!(pad, 5);
        assert_eq!(buf.cursor(), 8);
        // Already aligned: no-op.
        assert_eq!(buf.pad_to_alignment().unwrap(), 0);
    }

    #[test]
    fn commit_moves_watermark() {
        let mut buf = ArenaBuffer::with_capacity(64);
        buf.reserve(24).unwrap();
        buf.commit();
        assert_eq!(buf.committed(), 24);
        assert_eq!(buf.committed_slice().len(), 24);
        assert!(!buf.is_empty());
    }

    #[test]
    fn size_field_arithmetic() {
        let mut buf = ArenaBuffer::with_capacity(64);
        let off = buf.reserve(8).unwrap();
        buf.write_at(off, &8u32.to_le_bytes());
        buf.add_to_u32_at(off, 16);
        assert_eq!(buf.read_u32_at(off), 24);
    }
}
