//! Quote & escape resolver (spec §4.2).
//!
//! The reference design computes `odd_escape_end` and `inside_string` with a
//! branchless carry-propagation trick and a carry-less multiply
//! respectively. Per spec §4.2 ("a portable fallback scans quote bits
//! sequentially"), this port uses the explicitly sanctioned portable
//! fallback for both: a single sequential scan over the block's bits,
//! carrying one bit of state across block boundaries. This trades the
//! reference design's branchless-SIMD performance for code whose
//! correctness can be read directly off the loop body.

/// Cross-block carry state for the quote/escape resolver.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct QuoteState {
    /// Whether the previous block ended inside an odd-length run of
    /// backslashes (the next byte is escaped).
    odd_backslash_run: bool,
    /// Whether the previous block ended inside a JSON string.
    inside_string: bool,
}

/// Per-block output of the resolver.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct QuoteMasks {
    /// Bit `k` set iff `buf[k]` is escaped (immediately follows an
    /// odd-length run of backslashes).
    pub(crate) odd_escape_end: u64,
    /// Bit `k` set iff `buf[k]` is an unescaped (real) quote.
    pub(crate) real_quotes: u64,
    /// Bit `k` set iff `buf[k]` lies strictly inside a string: after the
    /// opening quote, up to but not including the closing quote.
    pub(crate) inside_string: u64,
    /// Subset of `real_quotes` that opens a string (as opposed to closing
    /// one). The structural flattener keeps only these: the closing quote
    /// is redundant once the string's contents have been consumed.
    pub(crate) open_quotes: u64,
}

impl QuoteState {
    /// If the final carry out of the last block is still "inside a
    /// string", the document has an unterminated string (spec §4.2 failure
    /// mode).
    pub(crate) fn inside_string_at_eof(&self) -> bool {
        self.inside_string
    }
}

pub(crate) fn resolve(
    state: &mut QuoteState,
    backslash_bits: u64,
    quote_bits: u64,
) -> QuoteMasks {
    let mut odd_escape_end = 0u64;
    let mut odd_run = state.odd_backslash_run;
    for k in 0..64 {
        let bit = 1u64 << k;
        if odd_run {
            odd_escape_end |= bit;
        }
        if backslash_bits & bit != 0 {
            odd_run = !odd_run;
        } else {
            odd_run = false;
        }
    }
    state.odd_backslash_run = odd_run;

    let real_quotes = quote_bits & !odd_escape_end;

    let mut inside_string_mask = 0u64;
    let mut open_quotes = 0u64;
    let mut inside = state.inside_string;
    for k in 0..64 {
        let bit = 1u64 << k;
        if real_quotes & bit != 0 {
            // The quote byte itself is never "inside" (matches the
            // half-open convention documented in spec §4.2).
            if !inside {
                open_quotes |= bit;
            }
            inside = !inside;
        } else if inside {
            inside_string_mask |= bit;
        }
    }
    state.inside_string = inside;

    QuoteMasks {
        odd_escape_end,
        real_quotes,
        inside_string: inside_string_mask,
        open_quotes,
    }
}
