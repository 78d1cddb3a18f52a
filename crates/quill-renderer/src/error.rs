//! Pipeline error types.

use crate::tree::NodeKind;

/// Fatal error that aborts the transformation of one document.
///
/// Everything recoverable (malformed directives, unknown names, card
/// failures) degrades in place and is reported as a warning instead.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Input contains a NUL byte.
    #[error("Input is binary, not text (NUL byte at offset {offset})")]
    Binary {
        /// Byte offset of the first NUL.
        offset: usize,
    },
    /// Input bytes are not valid UTF-8.
    #[error("Input is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    /// Front matter is not a YAML mapping.
    #[error("Invalid front matter: {message}")]
    FrontMatter {
        /// Parser message.
        message: String,
    },
    /// A stage received a node it has no rule for.
    #[error("{stage} received an unexpected {kind} node")]
    UnexpectedNode {
        /// Stage that rejected the tree.
        stage: &'static str,
        kind: NodeKind,
    },
}

/// A [`PipelineError`] attributed to the document it came from.
#[derive(Debug, thiserror::Error)]
#[error("{document}: {source}")]
pub struct DocumentError {
    /// Document identifier.
    pub document: String,
    #[source]
    pub source: PipelineError,
}

impl DocumentError {
    #[must_use]
    pub fn new(document: impl Into<String>, source: PipelineError) -> Self {
        Self {
            document: document.into(),
            source,
        }
    }
}
