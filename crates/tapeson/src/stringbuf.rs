//! The string buffer (spec §3 "String buffer"): a byte buffer written
//! strictly forward during stage 2. Each stored string occupies
//! `4 + L + 1` bytes — a little-endian `u32` length, `L` bytes of decoded
//! UTF-8 payload, and a terminating zero — with the public offset pointing
//! *past* the length prefix, so a hot-path read is one aligned load
//! (`bytes(p)`) plus one more for the length (`length_at(p - 4)`).

use alloc::vec::Vec;

#[derive(Debug, Default)]
pub(crate) struct StringBuffer {
    data: Vec<u8>,
}

impl StringBuffer {
    pub(crate) fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Writes `bytes` (already decoded, validated UTF-8) and returns the
    /// offset of the first payload byte (i.e. past the length prefix).
    pub(crate) fn write(&mut self, bytes: &[u8]) -> u32 {
        let len =
            u32::try_from(bytes.len()).expect("decoded string length exceeds u32::MAX");
        self.data.extend_from_slice(&len.to_le_bytes());
        let offset = self.data.len();
        self.data.extend_from_slice(bytes);
        self.data.push(0);
        u32::try_from(offset).expect("string buffer offset exceeds u32::MAX")
    }

    /// The decoded length of the string stored at `offset`.
    pub(crate) fn len_at(&self, offset: u32) -> u32 {
        let offset = offset as usize;
        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&self.data[offset - 4..offset]);
        u32::from_le_bytes(len_bytes)
    }

    /// The decoded string stored at `offset`.
    pub(crate) fn get(&self, offset: u32) -> &str {
        let len = self.len_at(offset) as usize;
        let offset = offset as usize;
        // Invariant: only bytes written by `write`, which validated UTF-8
        // before this buffer was populated, are ever read back here.
        core::str::from_utf8(&self.data[offset..offset + len])
            .unwrap_or_else(|_| unreachable!("string buffer invariant violated"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_with_embedded_nul() {
        let mut buf = StringBuffer::new();
        let off = buf.write(b"a\0b");
        assert_eq!(buf.len_at(off), 3);
        assert_eq!(buf.get(off), "a\0b");
    }

    #[test]
    fn multiple_writes_do_not_collide() {
        let mut buf = StringBuffer::new();
        let a = buf.write(b"hello");
        let b = buf.write(b"world");
        assert_eq!(buf.get(a), "hello");
        assert_eq!(buf.get(b), "world");
    }
}
