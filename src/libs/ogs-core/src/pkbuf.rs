//! Packet buffer implementation
//!
//! Bounded, append-only packet buffer used by the protocol builders.
//!
//! Besides the usual `put_*` helpers the buffer can hand out a
//! [`PkbufSlot`]: a zero-filled region reserved at the current tail whose
//! content is only known after more bytes have been appended (a MAC that
//! covers the bytes following it, for instance). The slot is filled in place
//! with [`OgsPkbuf::fill_slot`].
//!
//! ```text
//! |<-- data (len) -->|<-- tailroom -->|
//! 0                  tail             capacity
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

/// Cluster sizes
pub const CLUSTER_128: usize = 128;
pub const CLUSTER_256: usize = 256;
pub const CLUSTER_512: usize = 512;
pub const CLUSTER_1024: usize = 1024;
pub const CLUSTER_2048: usize = 2048;
pub const CLUSTER_8192: usize = 8192;

/// Packet buffer errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PkbufError {
    #[error("not enough tailroom: need {needed} bytes, {available} available")]
    NoTailroom { needed: usize, available: usize },
    #[error("slot at offset {offset} ({len} bytes) is outside the written data ({data_len} bytes)")]
    SlotOutOfRange {
        offset: usize,
        len: usize,
        data_len: usize,
    },
    #[error("slot holds {expected} bytes, got {actual}")]
    SlotSizeMismatch { expected: usize, actual: usize },
}

pub type PkbufResult<T> = Result<T, PkbufError>;

/// A region reserved inside an [`OgsPkbuf`], to be written later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PkbufSlot {
    offset: usize,
    len: usize,
}

impl PkbufSlot {
    /// Offset of the first reserved byte
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of reserved bytes
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Offset just past the reserved region
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// Bounded packet buffer
#[derive(Debug, Clone)]
pub struct OgsPkbuf {
    data: BytesMut,
    capacity: usize,
}

impl OgsPkbuf {
    /// Create a new packet buffer able to hold at least `size` bytes.
    ///
    /// The real capacity is rounded up to the next cluster size.
    pub fn new(size: usize) -> Self {
        let capacity = Self::select_cluster_size(size);
        OgsPkbuf {
            data: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    fn select_cluster_size(size: usize) -> usize {
        [CLUSTER_128, CLUSTER_256, CLUSTER_512, CLUSTER_1024, CLUSTER_2048, CLUSTER_8192]
            .into_iter()
            .find(|&cluster| size <= cluster)
            .unwrap_or_else(|| size.next_power_of_two())
    }

    /// Maximum number of bytes this buffer accepts
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current write offset
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn tailroom(&self) -> usize {
        self.capacity - self.data.len()
    }

    fn ensure_tailroom(&self, needed: usize) -> PkbufResult<()> {
        let available = self.tailroom();
        if needed > available {
            return Err(PkbufError::NoTailroom { needed, available });
        }
        Ok(())
    }

    pub fn put_u8(&mut self, val: u8) -> PkbufResult<()> {
        self.ensure_tailroom(1)?;
        self.data.put_u8(val);
        Ok(())
    }

    /// Put a u16 value in big-endian
    pub fn put_u16(&mut self, val: u16) -> PkbufResult<()> {
        self.ensure_tailroom(2)?;
        self.data.put_u16(val);
        Ok(())
    }

    /// Put the low 24 bits of `val` in big-endian
    pub fn put_u24(&mut self, val: u32) -> PkbufResult<()> {
        self.ensure_tailroom(3)?;
        self.data.put_uint(u64::from(val & 0x00ff_ffff), 3);
        Ok(())
    }

    pub fn put_data(&mut self, data: &[u8]) -> PkbufResult<()> {
        self.ensure_tailroom(data.len())?;
        self.data.put_slice(data);
        Ok(())
    }

    /// Append `len` zero bytes and return the slot covering them.
    pub fn reserve_slot(&mut self, len: usize) -> PkbufResult<PkbufSlot> {
        self.ensure_tailroom(len)?;
        let offset = self.data.len();
        self.data.put_bytes(0, len);
        Ok(PkbufSlot { offset, len })
    }

    /// Overwrite a previously reserved slot.
    pub fn fill_slot(&mut self, slot: PkbufSlot, value: &[u8]) -> PkbufResult<()> {
        if value.len() != slot.len {
            return Err(PkbufError::SlotSizeMismatch {
                expected: slot.len,
                actual: value.len(),
            });
        }
        if slot.end() > self.data.len() {
            return Err(PkbufError::SlotOutOfRange {
                offset: slot.offset,
                len: slot.len,
                data_len: self.data.len(),
            });
        }
        self.data[slot.offset..slot.end()].copy_from_slice(value);
        Ok(())
    }

    /// Written data
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Written data from `offset` up to the tail.
    ///
    /// Returns an empty slice when `offset` is at or beyond the tail.
    pub fn data_from(&self, offset: usize) -> &[u8] {
        self.data.get(offset..).unwrap_or(&[])
    }

    /// Drop all written data, keeping the capacity
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Convert into immutable bytes
    pub fn freeze(self) -> Bytes {
        self.data.freeze()
    }
}

impl AsRef<[u8]> for OgsPkbuf {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pkbuf_cluster_selection() {
        assert_eq!(OgsPkbuf::new(0).capacity(), CLUSTER_128);
        assert_eq!(OgsPkbuf::new(100).capacity(), CLUSTER_128);
        assert_eq!(OgsPkbuf::new(129).capacity(), CLUSTER_256);
        assert_eq!(OgsPkbuf::new(1500).capacity(), CLUSTER_2048);
        assert_eq!(OgsPkbuf::new(10000).capacity(), 16384);
    }

    #[test]
    fn test_pkbuf_put() {
        let mut pkbuf = OgsPkbuf::new(CLUSTER_128);
        pkbuf.put_u8(0x37).unwrap();
        pkbuf.put_u16(0x1234).unwrap();
        pkbuf.put_u24(3).unwrap();
        pkbuf.put_data(&[0xaa, 0xbb]).unwrap();

        assert_eq!(pkbuf.as_slice(), &[0x37, 0x12, 0x34, 0x00, 0x00, 0x03, 0xaa, 0xbb]);
        assert_eq!(pkbuf.len(), 8);
        assert_eq!(pkbuf.tailroom(), CLUSTER_128 - 8);
    }

    #[test]
    fn test_pkbuf_no_tailroom() {
        let mut pkbuf = OgsPkbuf::new(CLUSTER_128);
        pkbuf.put_data(&[0u8; CLUSTER_128 - 1]).unwrap();

        let err = pkbuf.put_u16(1).unwrap_err();
        assert_eq!(err, PkbufError::NoTailroom { needed: 2, available: 1 });
        // Failed put leaves the buffer untouched
        assert_eq!(pkbuf.len(), CLUSTER_128 - 1);
        pkbuf.put_u8(1).unwrap();
        assert!(pkbuf.put_u8(1).is_err());
    }

    #[test]
    fn test_pkbuf_reserve_and_fill_slot() {
        let mut pkbuf = OgsPkbuf::new(CLUSTER_128);
        pkbuf.put_u8(0x37).unwrap();
        let slot = pkbuf.reserve_slot(4).unwrap();
        pkbuf.put_data(&[1, 2, 3]).unwrap();

        assert_eq!(slot.offset(), 1);
        assert_eq!(slot.end(), 5);
        assert_eq!(pkbuf.as_slice(), &[0x37, 0, 0, 0, 0, 1, 2, 3]);
        assert_eq!(pkbuf.data_from(slot.end()), &[1, 2, 3]);

        pkbuf.fill_slot(slot, &[0xde, 0xad, 0xbe, 0xef]).unwrap();
        assert_eq!(pkbuf.as_slice(), &[0x37, 0xde, 0xad, 0xbe, 0xef, 1, 2, 3]);
    }

    #[test]
    fn test_pkbuf_fill_slot_errors() {
        let mut pkbuf = OgsPkbuf::new(CLUSTER_128);
        let slot = pkbuf.reserve_slot(4).unwrap();

        assert_eq!(
            pkbuf.fill_slot(slot, &[1, 2]),
            Err(PkbufError::SlotSizeMismatch { expected: 4, actual: 2 })
        );

        pkbuf.clear();
        assert_eq!(
            pkbuf.fill_slot(slot, &[1, 2, 3, 4]),
            Err(PkbufError::SlotOutOfRange { offset: 0, len: 4, data_len: 0 })
        );
    }

    #[test]
    fn test_pkbuf_data_from_past_tail() {
        let mut pkbuf = OgsPkbuf::new(CLUSTER_128);
        pkbuf.put_u8(1).unwrap();
        assert!(pkbuf.data_from(1).is_empty());
        assert!(pkbuf.data_from(10).is_empty());
    }

    #[test]
    fn test_pkbuf_freeze() {
        let mut pkbuf = OgsPkbuf::new(CLUSTER_128);
        pkbuf.put_data(&[1, 2, 3]).unwrap();
        let bytes = pkbuf.freeze();
        assert_eq!(&bytes[..], &[1, 2, 3]);
    }
}
