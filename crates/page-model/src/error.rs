//! Error types for the document model.

use thiserror::Error;

/// Errors raised while building or validating a [`Document`](crate::Document).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModelError {
    /// A span points outside the text buffer.
    #[error("span [{start}, {end}) exceeds text length {len}")]
    OffsetOutOfRange {
        /// Span start (characters).
        start: usize,
        /// Span end (characters).
        end: usize,
        /// Length of the text buffer (characters).
        len: usize,
    },

    /// Two paragraphs (or two runs) leave a hole between them.
    #[error("gap between {previous_end} and {next_start} in {scope}")]
    Gap {
        /// Which layer the gap was found in ("document" or "paragraph N").
        scope: String,
        /// End of the span before the gap.
        previous_end: usize,
        /// Start of the span after the gap.
        next_start: usize,
    },

    /// Two spans overlap.
    #[error("overlap at {offset} in {scope}")]
    Overlap {
        /// Which layer the overlap was found in.
        scope: String,
        /// First overlapping offset.
        offset: usize,
    },

    /// A span is empty or inverted.
    #[error("empty span [{start}, {end}) in {scope}")]
    EmptySpan {
        /// Which layer the span belongs to.
        scope: String,
        /// Span start.
        start: usize,
        /// Span end.
        end: usize,
    },

    /// A run references a component that is not in the component table.
    #[error("run references unknown component #{0}")]
    UnknownComponent(usize),

    /// Color text could not be parsed.
    #[error("invalid color '{0}'")]
    InvalidColor(String),
}

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
