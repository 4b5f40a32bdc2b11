//! Error taxonomy for the transformation pipeline.
//!
//! Every error here is scoped to a single document: the batch runner records
//! it and moves on to the next file. Missing metadata fields are *not*
//! errors — they degrade to defaults in [`crate::meta`].

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by [`crate::store::DocumentStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found: {0}")]
    NotFound(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors raised while applying a transform to one document.
///
/// The document is left unmodified when either variant occurs.
#[derive(Debug, Error)]
pub enum TransformError {
    /// A singular anchor marker matched more than once. Guessing which
    /// occurrence to use is exactly how the old scripts corrupted files,
    /// so the transform refuses instead.
    #[error("anchor `{anchor}` matched {count} times where exactly one was expected")]
    AmbiguousAnchor { anchor: String, count: usize },

    /// The tag structure could not be scanned at all (unterminated tag,
    /// unclosed comment). Flagged for manual review.
    #[error("document structure could not be scanned: {0}")]
    MalformedDocument(String),

    /// A transform would have reduced the document's paragraph count.
    #[error("transform would remove content it does not own: {0}")]
    ContentLoss(String),
}
