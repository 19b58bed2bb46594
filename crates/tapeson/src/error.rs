use thiserror::Error;

/// The stable error taxonomy for the parsing engine.
///
/// A failed parse returns exactly one variant identifying the
/// earliest-detected problem; there is no partial-success mode.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCode {
    /// Requested capacity exceeds what the parser was configured to hold.
    #[error("requested capacity exceeds configured limit")]
    Capacity,
    /// A grammar rule was violated while walking the structural index.
    #[error("unexpected token while building the tape")]
    TapeError,
    /// Nesting exceeded the configured maximum depth.
    #[error("nesting depth exceeds the configured maximum")]
    DepthError,
    /// A string literal was malformed (bad escape, raw control character).
    #[error("malformed string literal")]
    StringError,
    /// A `true` atom did not match exactly.
    #[error("invalid `true` literal")]
    TAtomError,
    /// A `false` atom did not match exactly.
    #[error("invalid `false` literal")]
    FAtomError,
    /// A `null` atom did not match exactly.
    #[error("invalid `null` literal")]
    NAtomError,
    /// A number literal violated the strict JSON grammar or overflowed to
    /// infinity.
    #[error("malformed or out-of-range number literal")]
    NumberError,
    /// The input contained invalid UTF-8.
    #[error("invalid UTF-8")]
    Utf8Error,
    /// The input ended while a string literal was still open.
    #[error("unterminated string literal")]
    UnclosedString,
    /// The input was empty (after any leading whitespace/BOM).
    #[error("empty input")]
    Empty,
    /// A JSON Pointer string was not well-formed.
    #[error("malformed JSON pointer")]
    InvalidJsonPointer,
    /// A navigation call addressed a field that does not exist.
    #[error("no such field")]
    NoSuchField,
    /// A navigation call addressed an array index out of bounds.
    #[error("index out of bounds")]
    IndexOutOfBounds,
    /// A typed accessor was called against a tape word of a different tag.
    #[error("tape value has a different type than requested")]
    IncorrectType,
}
