//! Error types for markdown conversion.

/// Error returned when the tokenizer cannot consume its input.
///
/// Every input is expected to be consumed by the fallback text rules, so
/// either variant points at a hole in the grammar rather than at bad markdown.
#[derive(Debug, thiserror::Error)]
pub enum MarkdownError {
    /// No block rule matched the remaining source.
    #[error("no block rule matched at byte {offset}: {snippet:?}")]
    UnmatchedBlock { offset: usize, snippet: String },

    /// No inline rule matched the remaining text.
    #[error("no inline rule matched: {snippet:?}")]
    UnmatchedInline { snippet: String },
}

/// Short prefix of the unconsumed input for error messages.
pub(crate) fn snippet(rest: &str) -> String {
    rest.chars().take(32).collect()
}
