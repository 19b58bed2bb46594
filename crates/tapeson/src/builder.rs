//! Tape construction: stage 2 of the pipeline (spec §5).
//!
//! The reference design's `unified_machine` is one large function built
//! around computed `goto` between labels (`object_begin`, `array_continue`,
//! `scope_end`, ...), with per-depth `ret_address` and
//! `containing_scope_offset` arrays standing in for a call stack. Rust has
//! no computed `goto`, so this port keeps the same non-recursive shape —
//! an explicit loop walking the structural index exactly once, a `Frame`
//! stack in place of the `ret_address`/`containing_scope_offset` arrays —
//! but drives it from an enum match rather than label addresses.
//!
//! Container tape words link to each other directly: an opening `{`/`['s
//! payload is the tape index of its matching close, and vice versa, set by
//! [`close_scope`] the moment a scope's closing bracket is seen. This is
//! the same sibling-skip encoding the reference design's tape carries, and
//! is what lets the iterator move across a whole object or array in O(1).

use alloc::vec::Vec;

use crate::error::ErrorCode;
use crate::number::{self, Number};
use crate::options::ParserOptions;
use crate::padded::PaddedBuffer;
use crate::string_unescape;
use crate::stringbuf::StringBuffer;
use crate::tape::{Tag, Tape};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Object,
    Array,
}

/// What the top of a container frame is waiting to read next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    /// Object: a key or the close. Array: a value or the close.
    Entry,
    /// A comma (leading into another entry) or the close.
    Separator,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    /// Tape index of this container's opening word.
    open_idx: usize,
    kind: FrameKind,
    expect: Expect,
}

/// Walks `structural_indexes` and builds a tape plus the string buffer its
/// string words point into.
///
/// Grounded on `unified_machine` in the reference design: a single value at
/// the document root (object, array, or bare scalar — `ALLOWANYTHINGINROOT`
/// in the reference design), followed by nothing but the sentinel.
pub(crate) fn build_tape(
    buf: &PaddedBuffer<'_>,
    structural_indexes: &[u32],
    options: &ParserOptions,
) -> crate::Result<(Tape, StringBuffer)> {
    let mut tape = Tape::new();
    let mut strings = StringBuffer::new();
    tape.push(Tag::Root, 0);

    let mut stack: Vec<Frame> = Vec::new();
    let mut i = 0usize;

    let (idx, c) = next_char(buf, structural_indexes, &mut i)?;
    dispatch_value(c, idx, buf, &mut tape, &mut strings, &mut stack, options)?;

    while !stack.is_empty() {
        step(buf, structural_indexes, &mut i, &mut tape, &mut strings, &mut stack, options)?;
    }

    // Exactly the sentinel should remain: a second root-level value (or any
    // other trailing token) is garbage the reference design also rejects
    // once back at `start_continue` with more than one structural index left.
    if i + 1 != structural_indexes.len() {
        return Err(ErrorCode::TapeError);
    }

    let final_idx = tape.push(Tag::Root, 0);
    tape.patch_payload(0, final_idx as u64);

    Ok((tape, strings))
}

/// Advances one container frame by exactly one grammar step (a key, a
/// value, a comma, or a close), mirroring one pass through
/// `object_continue`/`array_continue` in the reference design.
fn step(
    buf: &PaddedBuffer<'_>,
    structural_indexes: &[u32],
    i: &mut usize,
    tape: &mut Tape,
    strings: &mut StringBuffer,
    stack: &mut Vec<Frame>,
    options: &ParserOptions,
) -> crate::Result<()> {
    let frame_idx = stack.len() - 1;
    let (kind, expect) = {
        let frame = &stack[frame_idx];
        (frame.kind, frame.expect)
    };

    match (kind, expect) {
        (FrameKind::Object, Expect::Entry) => {
            let (idx, c) = next_char(buf, structural_indexes, i)?;
            if c == b'}' {
                close_scope(tape, stack, Tag::ObjectEnd);
                return Ok(());
            }
            object_entry(buf, idx, c, i, structural_indexes, tape, strings, stack, options)?;
            stack[frame_idx].expect = Expect::Separator;
        }
        (FrameKind::Object, Expect::Separator) => {
            let (_, c) = next_char(buf, structural_indexes, i)?;
            match c {
                b'}' => close_scope(tape, stack, Tag::ObjectEnd),
                b',' => {
                    let (idx, c) = next_char(buf, structural_indexes, i)?;
                    object_entry(buf, idx, c, i, structural_indexes, tape, strings, stack, options)?;
                    stack[frame_idx].expect = Expect::Separator;
                }
                _ => return Err(ErrorCode::TapeError),
            }
        }
        (FrameKind::Array, Expect::Entry) => {
            let (idx, c) = next_char(buf, structural_indexes, i)?;
            if c == b']' {
                close_scope(tape, stack, Tag::ArrayEnd);
                return Ok(());
            }
            dispatch_value(c, idx, buf, tape, strings, stack, options)?;
            stack[frame_idx].expect = Expect::Separator;
        }
        (FrameKind::Array, Expect::Separator) => {
            let (_, c) = next_char(buf, structural_indexes, i)?;
            match c {
                b']' => close_scope(tape, stack, Tag::ArrayEnd),
                b',' => {
                    let (idx, c) = next_char(buf, structural_indexes, i)?;
                    dispatch_value(c, idx, buf, tape, strings, stack, options)?;
                    stack[frame_idx].expect = Expect::Separator;
                }
                _ => return Err(ErrorCode::TapeError),
            }
        }
    }
    Ok(())
}

/// A `"key":value` pair: `c`/`idx` is the key's opening quote, already read.
#[allow(clippy::too_many_arguments)]
fn object_entry(
    buf: &PaddedBuffer<'_>,
    idx: usize,
    c: u8,
    i: &mut usize,
    structural_indexes: &[u32],
    tape: &mut Tape,
    strings: &mut StringBuffer,
    stack: &mut Vec<Frame>,
    options: &ParserOptions,
) -> crate::Result<()> {
    if c != b'"' {
        return Err(ErrorCode::TapeError);
    }
    write_string(buf, idx, tape, strings)?;
    let (_, colon) = next_char(buf, structural_indexes, i)?;
    if colon != b':' {
        return Err(ErrorCode::TapeError);
    }
    let (vidx, vc) = next_char(buf, structural_indexes, i)?;
    dispatch_value(vc, vidx, buf, tape, strings, stack, options)
}

/// Writes a scalar tape entry for `c`, or opens a new container frame.
fn dispatch_value(
    c: u8,
    idx: usize,
    buf: &PaddedBuffer<'_>,
    tape: &mut Tape,
    strings: &mut StringBuffer,
    stack: &mut Vec<Frame>,
    options: &ParserOptions,
) -> crate::Result<()> {
    match c {
        b'"' => write_string(buf, idx, tape, strings),
        b't' => write_atom(buf, idx, b"true", ErrorCode::TAtomError, Tag::True, tape),
        b'f' => write_atom(buf, idx, b"false", ErrorCode::FAtomError, Tag::False, tape),
        b'n' => write_atom(buf, idx, b"null", ErrorCode::NAtomError, Tag::Null, tape),
        b'0'..=b'9' | b'-' => write_number(buf, idx, tape),
        b'{' => open_scope(tape, stack, FrameKind::Object, Tag::ObjectStart, options),
        b'[' => open_scope(tape, stack, FrameKind::Array, Tag::ArrayStart, options),
        _ => Err(ErrorCode::TapeError),
    }
}

fn open_scope(
    tape: &mut Tape,
    stack: &mut Vec<Frame>,
    kind: FrameKind,
    tag: Tag,
    options: &ParserOptions,
) -> crate::Result<()> {
    let open_idx = tape.push(tag, 0);
    stack.push(Frame { open_idx, kind, expect: Expect::Entry });
    if stack.len() > options.max_depth {
        return Err(ErrorCode::DepthError);
    }
    Ok(())
}

fn close_scope(tape: &mut Tape, stack: &mut Vec<Frame>, close_tag: Tag) {
    let frame = stack.pop().expect("close_scope called on an empty stack");
    let close_idx = tape.push(close_tag, frame.open_idx as u64);
    tape.patch_payload(frame.open_idx, close_idx as u64);
}

fn write_string(
    buf: &PaddedBuffer<'_>,
    idx: usize,
    tape: &mut Tape,
    strings: &mut StringBuffer,
) -> crate::Result<()> {
    let (offset, _consumed) = string_unescape::unescape(&buf.padded()[idx + 1..], strings)?;
    tape.push(Tag::String, u64::from(offset));
    Ok(())
}

fn write_atom(
    buf: &PaddedBuffer<'_>,
    idx: usize,
    literal: &[u8],
    err: ErrorCode,
    tag: Tag,
    tape: &mut Tape,
) -> crate::Result<()> {
    if !atom_matches(buf, idx, literal) {
        return Err(err);
    }
    tape.push(tag, 0);
    Ok(())
}

fn write_number(buf: &PaddedBuffer<'_>, idx: usize, tape: &mut Tape) -> crate::Result<()> {
    // Bounded to the document's logical length, not the full padded slice:
    // an already-padded caller buffer (`Parser::parse(_, true)`) is only
    // guaranteed zeroed up to `buf.len()` (spec §6) — past that, `scan`
    // must never read caller-supplied trailing garbage into the literal.
    let (n, _len) = number::parse(&buf.padded()[idx..buf.len()])?;
    match n {
        Number::Signed(v) => {
            tape.push(Tag::Int64, 0);
            tape.push_raw(v as u64);
        }
        Number::Unsigned(v) => {
            tape.push(Tag::Uint64, 0);
            tape.push_raw(v);
        }
        Number::Double(d) => {
            tape.push(Tag::Double, 0);
            tape.push_raw(d.to_bits());
        }
    }
    Ok(())
}

/// True for the bytes allowed to immediately follow an atom (`true`,
/// `false`, `null`): the same set the reference design's
/// `is_valid_true_atom` family checks after its masked load.
fn is_structural_or_whitespace(b: u8) -> bool {
    matches!(
        b,
        b'{' | b'}' | b'[' | b']' | b':' | b',' | b' ' | b'\t' | b'\n' | b'\r'
    )
}

fn atom_terminated(buf: &PaddedBuffer<'_>, after: usize) -> bool {
    after >= buf.len() || is_structural_or_whitespace(buf.padded()[after])
}

fn atom_matches(buf: &PaddedBuffer<'_>, idx: usize, literal: &[u8]) -> bool {
    let end = idx + literal.len();
    buf.padded().get(idx..end) == Some(literal) && atom_terminated(buf, end)
}

/// Reads the next structural byte, advancing `i`. Running off the end of
/// `structural_indexes` (more tokens expected than the document has) and
/// landing on a structural index at or past the logical end (only the
/// sentinel remains) both surface as [`ErrorCode::TapeError`] once the
/// caller's grammar match fails to recognize the byte found there.
fn next_char(
    buf: &PaddedBuffer<'_>,
    structural_indexes: &[u32],
    i: &mut usize,
) -> crate::Result<(usize, u8)> {
    let idx = *structural_indexes.get(*i).ok_or(ErrorCode::TapeError)? as usize;
    *i += 1;
    let c = *buf.padded().get(idx).ok_or(ErrorCode::TapeError)?;
    Ok((idx, c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structural;

    fn parse(input: &[u8]) -> crate::Result<(Tape, StringBuffer)> {
        let mut owned = alloc::vec::Vec::from(input);
        owned.resize(input.len() + crate::padded::PADDING, 0);
        let buf = PaddedBuffer::new(&owned, input.len());
        let mut indexes = Vec::new();
        structural::build_index(&buf, &mut indexes)?;
        build_tape(&buf, &indexes, &ParserOptions::default())
    }

    #[test]
    fn array_of_numbers_tape_shape() {
        let (tape, _strings) = parse(b"[1,2,3]").unwrap();
        // Root, ArrayStart, (Int64, raw) x 3, ArrayEnd, Root.
        assert_eq!(tape.len(), 10);
        assert_eq!(tape.tag_at(0), Tag::Root);
        assert_eq!(tape.tag_at(1), Tag::ArrayStart);
        assert_eq!(tape.tag_at(2), Tag::Int64);
        assert_eq!(tape.payload_at(3), 1);
        assert_eq!(tape.tag_at(8), Tag::ArrayEnd);
        assert_eq!(tape.tag_at(9), Tag::Root);
        assert_eq!(tape.payload_at(0), 9);
        assert_eq!(tape.payload_at(1), 8);
        assert_eq!(tape.payload_at(9), 0);
    }

    #[test]
    fn object_links_open_and_close() {
        let (tape, strings) = parse(br#"{"a":true}"#).unwrap();
        assert_eq!(tape.tag_at(1), Tag::ObjectStart);
        let key_offset = tape.payload_at(2) as u32;
        assert_eq!(strings.get(key_offset), "a");
        assert_eq!(tape.tag_at(3), Tag::True);
        let close_idx = tape.payload_at(1) as usize;
        assert_eq!(tape.tag_at(close_idx), Tag::ObjectEnd);
        assert_eq!(tape.payload_at(close_idx) as usize, 1);
    }

    #[test]
    fn nested_array_links_skip_whole_container() {
        let (tape, _) = parse(b"[[1,2],3]").unwrap();
        assert_eq!(tape.tag_at(1), Tag::ArrayStart);
        let inner_open = 2usize;
        assert_eq!(tape.tag_at(inner_open), Tag::ArrayStart);
        let inner_close = tape.payload_at(inner_open) as usize;
        assert_eq!(tape.tag_at(inner_close), Tag::ArrayEnd);
        // After the inner array closes, the next word is the outer `3`.
        assert_eq!(tape.tag_at(inner_close + 1), Tag::Int64);
    }

    #[test]
    fn bare_root_scalar() {
        let (tape, _) = parse(b"42").unwrap();
        assert_eq!(tape.len(), 4);
        assert_eq!(tape.tag_at(1), Tag::Int64);
        assert_eq!(tape.payload_at(2), 42);
    }

    #[test]
    fn bare_root_string() {
        let (tape, strings) = parse(br#""hello""#).unwrap();
        let offset = tape.payload_at(1) as u32;
        assert_eq!(strings.get(offset), "hello");
    }

    #[test]
    fn truncated_array_is_tape_error() {
        assert_eq!(parse(b"[1").unwrap_err(), ErrorCode::TapeError);
    }

    #[test]
    fn mismatched_close_is_tape_error() {
        assert_eq!(parse(b"[1}").unwrap_err(), ErrorCode::TapeError);
    }

    #[test]
    fn trailing_garbage_is_tape_error() {
        assert_eq!(parse(b"1 2").unwrap_err(), ErrorCode::TapeError);
    }

    #[test]
    fn bad_true_atom_errors() {
        assert_eq!(parse(b"tru3").unwrap_err(), ErrorCode::TAtomError);
    }

    #[test]
    fn depth_limit_enforced() {
        let opts = ParserOptions { max_depth: 1 };
        let mut owned = alloc::vec::Vec::from(&b"[[1]]"[..]);
        owned.resize(owned.len() + crate::padded::PADDING, 0);
        let buf = PaddedBuffer::new(&owned, 5);
        let mut indexes = Vec::new();
        structural::build_index(&buf, &mut indexes).unwrap();
        assert_eq!(
            build_tape(&buf, &indexes, &opts).unwrap_err(),
            ErrorCode::DepthError
        );
    }

    #[test]
    fn object_key_must_be_string() {
        assert_eq!(parse(b"{1:2}").unwrap_err(), ErrorCode::TapeError);
    }

    #[test]
    fn trailing_comma_in_array_errors() {
        assert_eq!(parse(b"[1,]").unwrap_err(), ErrorCode::TapeError);
    }
}
