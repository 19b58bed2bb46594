//! Structural indexing: stage 1 of the pipeline (spec §4).
//!
//! Ties the block classifier, the quote/escape resolver, and the UTF-8
//! validator together into a single pass that produces the sorted list of
//! byte offsets stage 2 walks (`structural_indexes`), terminated by a
//! sentinel equal to the document's logical length (spec §4.3).

use alloc::vec::Vec;

use crate::classifier::{self, Masks};
use crate::error::ErrorCode;
use crate::padded::PaddedBuffer;
use crate::quotes::{self, QuoteState};
use crate::string_unescape;

/// Runs stage 1 over `buf`, appending every structural and pseudo-structural
/// byte offset to `out` in ascending order, followed by the sentinel
/// `buf.len()`.
///
/// Grounded on `finalize_structurals`/`find_structural_bits` in the
/// reference design: quoted content is masked out of the structural mask,
/// the opening quote of each string is kept as a structural marker (the
/// closing quote is redundant once stage 2 scans the string's contents),
/// and a "pseudo-structural" bit is set on the first byte of every
/// unquoted token (`true`, `-12.5`, ...) so stage 2 can treat atoms and
/// numbers uniformly with bracketed values.
pub(crate) fn build_index(buf: &PaddedBuffer<'_>, out: &mut Vec<u32>) -> crate::Result<()> {
    string_unescape::validate(buf.logical())?;

    out.clear();
    let len = buf.len();
    let mut quote_state = QuoteState::default();
    // The very first byte of the document is treated as following
    // whitespace, so a leading atom/number is itself pseudo-structural.
    let mut prev_ends_pseudo_pred = true;

    let mut idx = 0usize;
    while idx < len {
        let block = buf.read_block(idx);
        let Masks {
            backslash,
            quote,
            whitespace,
            structural: raw_structural,
        } = classifier::classify_block(&block);

        let quote_masks = quotes::resolve(&mut quote_state, backslash, quote);
        let string_region = quote_masks.open_quotes | quote_masks.inside_string;

        let mut structural = raw_structural & !string_region;
        structural |= quote_masks.real_quotes;

        let pseudo_pred = structural | whitespace;
        let carry_in = u64::from(prev_ends_pseudo_pred);
        let shifted = (pseudo_pred << 1) | carry_in;
        prev_ends_pseudo_pred = pseudo_pred & (1u64 << 63) != 0;
        let pseudo_structurals = shifted & !whitespace & !string_region;
        structural |= pseudo_structurals;

        // Drop closing quotes: they were re-added above via `real_quotes`
        // but only the opening quote should act as a structural marker.
        structural &= !(quote_masks.real_quotes & !string_region);

        flatten(out, idx, structural, len);
        idx += 64;
    }

    if quote_state.inside_string_at_eof() {
        return Err(ErrorCode::UnclosedString);
    }

    // A document with no structural byte at all (e.g. pure whitespace) has
    // no value to build a tape from; the reference design rejects this
    // before stage 2 ever runs rather than letting it fall out as a vague
    // tape error.
    if out.is_empty() {
        return Err(ErrorCode::Empty);
    }

    let len_u32 = u32::try_from(len).map_err(|_| ErrorCode::Capacity)?;
    if out.last() != Some(&len_u32) {
        out.push(len_u32);
    }

    Ok(())
}

/// Appends the set bits of `bits` (positions relative to `base`) to `out`,
/// in ascending order, skipping any position at or past `len` (padding).
fn flatten(out: &mut Vec<u32>, base: usize, bits: u64, len: usize) {
    let mut bits = bits;
    while bits != 0 {
        let k = bits.trailing_zeros() as usize;
        let pos = base + k;
        if pos < len {
            out.push(pos as u32);
        }
        bits &= bits - 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_of(input: &[u8]) -> crate::Result<Vec<u32>> {
        let mut owned = alloc::vec::Vec::from(input);
        owned.resize(input.len() + crate::padded::PADDING, 0);
        let buf = PaddedBuffer::new(&owned, input.len());
        let mut out = Vec::new();
        build_index(&buf, &mut out)?;
        Ok(out)
    }

    #[test]
    fn array_of_numbers() {
        let idx = index_of(b"[1,2,3]").unwrap();
        // '[' 1 ',' 2 ',' 3 ']' -> structural/pseudo at every position here.
        assert_eq!(idx, alloc::vec![0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn object_with_string_and_bool() {
        let idx = index_of(br#"{"a":true}"#).unwrap();
        // { " a  : t }  -- closing quote of "a" (index 3) is dropped.
        assert_eq!(idx, alloc::vec![0, 1, 4, 5, 9, 10]);
    }

    #[test]
    fn comma_inside_string_is_not_structural() {
        let idx = index_of(br#"["a,b"]"#).unwrap();
        // [ " a,b ]   -- the comma at index 3 must not appear.
        assert_eq!(idx, alloc::vec![0, 1, 6, 7]);
    }

    #[test]
    fn whitespace_only_is_rejected() {
        assert_eq!(index_of(b"   \n\t "), Err(ErrorCode::Empty));
    }

    #[test]
    fn unterminated_string_errors() {
        assert_eq!(index_of(br#""abc"#), Err(ErrorCode::UnclosedString));
    }

    #[test]
    fn straddles_block_boundary() {
        // A structural character sitting exactly at byte 64 must still be
        // found in the second block's pass.
        let mut input = alloc::vec::Vec::new();
        input.extend(core::iter::repeat(b' ').take(63));
        input.push(b'[');
        input.push(b']');
        let idx = index_of(&input).unwrap();
        assert_eq!(idx, alloc::vec![63, 64, 65]);
    }
}
