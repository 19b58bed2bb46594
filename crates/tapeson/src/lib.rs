//! `tapeson` is a high-throughput JSON parsing engine.
//!
//! It ingests a byte buffer and produces a compact, navigable in-memory
//! representation (the *tape*) in two stages:
//!
//! 1. **Structural indexing** — a data-parallel pass over 64-byte blocks
//!    classifies every byte (whitespace / structural / string / other),
//!    tracks escape and quote state across blocks, and emits the offsets of
//!    every structurally significant byte.
//! 2. **Tape construction** — a state-machine walk over the structural index
//!    that validates document grammar, decodes scalars, and writes tagged
//!    64-bit words onto the tape.
//!
//! The crate does not build a DOM; [`Navigator`] walks the tape directly.
//! Downstream ergonomic layers (DOM, `serde`, pretty-printing) are
//! deliberately out of scope.

#![no_std]
#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]
extern crate alloc;

#[cfg(test)]
extern crate std;

mod builder;
mod classifier;
mod error;
mod iterator;
mod number;
mod options;
mod padded;
mod quotes;
mod string_unescape;
mod stringbuf;
mod structural;
mod tape;


pub use error::ErrorCode;
pub use iterator::Navigator;
pub use number::Number;
pub use options::ParserOptions;
pub use padded::PADDING;
pub use tape::Tag;

use alloc::vec::Vec;

use padded::PaddedBuffer;
use stringbuf::StringBuffer;
use tape::Tape;

/// Result type used throughout the crate.
pub type Result<T> = core::result::Result<T, ErrorCode>;

/// A single parsed JSON document: the tape plus the string buffer it
/// references.
///
/// Construct a [`Navigator`] with [`Document::navigator`] to walk it.
#[derive(Debug)]
pub struct Document {
    tape: Tape,
    strings: StringBuffer,
}

impl Document {
    /// Returns a read-only cursor positioned at the document root.
    #[must_use]
    pub fn navigator(&self) -> Navigator<'_> {
        Navigator::new(&self.tape, &self.strings)
    }

    /// Number of 64-bit words on the tape, including the two root sentinels.
    #[must_use]
    pub fn tape_len(&self) -> usize {
        self.tape.len()
    }
}

/// The core JSON parser.
///
/// A `Parser` owns two resizable buffers (structural index, padding scratch)
/// that are allocated on first use and reused across calls to
/// [`Parser::parse`]. Each call also produces a freshly owned tape and
/// string buffer inside the returned [`Document`], which remains valid after
/// the next parse begins.
#[derive(Debug)]
pub struct Parser {
    options: ParserOptions,
    structural_indexes: Vec<u32>,
    padded: Vec<u8>,
}

impl Parser {
    /// Creates a parser with the given options and no pre-allocated capacity.
    #[must_use]
    pub fn new(options: ParserOptions) -> Self {
        Self {
            options,
            structural_indexes: Vec::new(),
            padded: Vec::new(),
        }
    }

    /// Creates a parser with options and a capacity hint (in bytes) for the
    /// largest document expected, avoiding reallocation on the first parse.
    #[must_use]
    pub fn with_capacity(options: ParserOptions, capacity_hint: usize) -> Self {
        Self {
            options,
            structural_indexes: Vec::with_capacity(capacity_hint / 2 + 2),
            padded: Vec::with_capacity(capacity_hint + padded::PADDING),
        }
    }

    /// Parses `input` and returns a [`Document`] view over a freshly built
    /// tape and string buffer.
    ///
    /// `already_padded` asserts that `input` is safely readable for
    /// [`PADDING`] bytes past its end; when `false`, the parser copies
    /// `input` into an internally owned padded buffer first.
    ///
    /// # Errors
    ///
    /// Returns the first [`ErrorCode`] encountered: stage-1 failures
    /// (`Utf8Error`, `UnclosedString`) are detected before stage 2 runs, and
    /// stage-2 failures (`TapeError`, `DepthError`, scalar decode errors)
    /// otherwise.
    pub fn parse(&mut self, input: &[u8], already_padded: bool) -> Result<Document> {
        if input.is_empty() {
            return Err(ErrorCode::Empty);
        }

        let owned: &[u8] = if already_padded {
            input
        } else {
            self.padded.clear();
            self.padded.extend_from_slice(input);
            self.padded.resize(input.len() + padded::PADDING, 0);
            &self.padded[..input.len() + padded::PADDING]
        };
        let buf = PaddedBuffer::new(owned, input.len());
        let buf = skip_bom(buf);

        self.structural_indexes.clear();
        structural::build_index(&buf, &mut self.structural_indexes)?;

        let (tape, strings) = builder::build_tape(&buf, &self.structural_indexes, &self.options)?;
        Ok(Document { tape, strings })
    }

    /// Parses a buffer of whitespace-separated concatenated JSON documents
    /// (e.g. JSON Lines), returning an iterator of per-document results.
    ///
    /// This is a thin, single-threaded loop over [`Parser::parse`]: it is
    /// orchestration over the core parser, not a new parsing engine, and it
    /// performs no internal concurrency.
    pub fn parse_many<'p, 'b: 'p>(
        &'p mut self,
        input: &'b [u8],
    ) -> impl Iterator<Item = Result<Document>> + 'p {
        let mut rest = input;
        core::iter::from_fn(move || {
            let trimmed = skip_leading_whitespace(rest);
            if trimmed.is_empty() {
                return None;
            }
            let (doc_len, _started) = match scan_one_document(trimmed) {
                Ok(v) => v,
                Err(e) => {
                    rest = &[];
                    return Some(Err(e));
                }
            };
            let doc_bytes = &trimmed[..doc_len];
            rest = &trimmed[doc_len..];
            Some(self.parse(doc_bytes, false))
        })
    }
}

fn skip_leading_whitespace(buf: &[u8]) -> &[u8] {
    let mut i = 0;
    while i < buf.len() && matches!(buf[i], b' ' | b'\t' | b'\n' | b'\r') {
        i += 1;
    }
    &buf[i..]
}

/// Scans exactly one JSON value out of the front of `buf`, returning its
/// byte length. Used only to split a multi-document buffer before handing
/// each document to the real parser; malformed documents are still caught
/// (and their real error reported) by the subsequent `Parser::parse` call,
/// so this scan only needs to find a plausible boundary.
fn scan_one_document(buf: &[u8]) -> Result<(usize, bool)> {
    let mut depth: i64 = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut started = false;
    let mut i = 0;
    while i < buf.len() {
        let b = buf[i];
        if in_string {
            i += 1;
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
                if depth == 0 {
                    break;
                }
            }
            continue;
        }
        match b {
            b'"' => {
                in_string = true;
                started = true;
                i += 1;
            }
            b'{' | b'[' => {
                depth += 1;
                started = true;
                i += 1;
            }
            b'}' | b']' => {
                depth -= 1;
                i += 1;
                if depth <= 0 && started {
                    break;
                }
            }
            b' ' | b'\t' | b'\n' | b'\r' if depth == 0 && started => break,
            _ => {
                started = true;
                i += 1;
            }
        }
    }
    if !started {
        return Err(ErrorCode::Empty);
    }
    Ok((i, started))
}

fn skip_bom(buf: PaddedBuffer<'_>) -> PaddedBuffer<'_> {
    const BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];
    if buf.logical().len() >= 3 && buf.logical()[..3] == BOM {
        buf.skip(3)
    } else {
        buf
    }
}
