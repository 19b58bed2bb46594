//! The padded input buffer (§3, §4.1): a byte slice guaranteed readable for
//! [`PADDING`] bytes past its logical length, so the classifier can read a
//! full 64-byte block even when the logical content ends mid-block without
//! a bounds check on every read.

/// Minimum number of additional bytes a caller-supplied "already padded"
/// buffer must be safely readable for. Matches the classifier's block width
/// (§4.1, §GLOSSARY "Padding").
pub const PADDING: usize = 64;

/// A borrowed byte buffer paired with its logical length.
///
/// `data` may be longer than `len` (the padding); bytes in `data[len..]` are
/// never interpreted syntactically, only read speculatively by the block
/// classifier so it never needs a bounds check mid-block.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PaddedBuffer<'a> {
    data: &'a [u8],
    len: usize,
}

impl<'a> PaddedBuffer<'a> {
    pub(crate) fn new(data: &'a [u8], len: usize) -> Self {
        debug_assert!(data.len() >= len + PADDING || data.len() >= len);
        Self { data, len }
    }

    /// The logical (unpadded) content.
    pub(crate) fn logical(&self) -> &'a [u8] {
        &self.data[..self.len]
    }

    /// The full padded slice, including the trailing scratch bytes.
    pub(crate) fn padded(&self) -> &'a [u8] {
        self.data
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Returns a view with the first `n` bytes dropped from the logical
    /// content (used to skip a UTF-8 BOM). The padded tail is unaffected.
    pub(crate) fn skip(self, n: usize) -> Self {
        Self {
            data: &self.data[n..],
            len: self.len - n,
        }
    }

    /// Reads a 64-byte block starting at `base`. If fewer than 64 logical
    /// bytes remain, the tail is filled with spaces (`0x20`) in a scratch
    /// array, matching the reference design's handling of the final
    /// partial block.
    pub(crate) fn read_block(&self, base: usize) -> [u8; 64] {
        if base + 64 <= self.len {
            let mut block = [0u8; 64];
            block.copy_from_slice(&self.data[base..base + 64]);
            block
        } else {
            // Straddles or lies past the logical end: only bytes up to
            // `self.len` are real content, regardless of what garbage an
            // "already padded" caller's scratch tail happens to hold.
            let mut block = [b' '; 64];
            let remaining = self.len.saturating_sub(base).min(64);
            block[..remaining].copy_from_slice(&self.data[base..base + remaining]);
            block
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_short_final_block_with_spaces() {
        let data = b"abc";
        let mut owned = alloc::vec::Vec::from(&data[..]);
        owned.resize(data.len() + PADDING, 0xFF);
        let buf = PaddedBuffer::new(&owned, data.len());
        let block = buf.read_block(0);
        assert_eq!(&block[..3], b"abc");
        assert!(block[3..].iter().all(|&b| b == b' '));
    }

    #[test]
    fn full_block_copies_logical_bytes_directly() {
        let data = [b'x'; 64];
        let mut owned = alloc::vec::Vec::from(&data[..]);
        owned.resize(data.len() + PADDING, 0xFF);
        let buf = PaddedBuffer::new(&owned, data.len());
        let block = buf.read_block(0);
        assert_eq!(block, data);
    }
}
