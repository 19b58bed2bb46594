/// Configuration options for the [`crate::Parser`].
///
/// # Examples
///
/// ```rust
/// use tapeson::{Parser, ParserOptions};
///
/// let options = ParserOptions {
///     max_depth: 64,
///     ..ParserOptions::default()
/// };
/// let mut parser = Parser::new(options);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ParserOptions {
    /// Maximum nesting depth of objects and arrays. Exceeding it fails a
    /// parse with [`crate::ErrorCode::DepthError`].
    ///
    /// # Default
    ///
    /// `1024`
    pub max_depth: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self { max_depth: 1024 }
    }
}
