//! Error types for the editor.
//!
//! Failures inside the document (a target id that no longer exists, an
//! invalid selection) are benign no-ops, not errors — see
//! [`crate::Operation`]. Errors exist only at the external boundaries.

use thiserror::Error;

/// Clipboard read/write failure at the platform boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClipboardError {
    #[error("clipboard access denied: {0}")]
    AccessDenied(String),

    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum EditorError {
    /// Clipboard I/O failed. Surfaced to the user as a transient
    /// notification; the document is unaffected.
    #[error("clipboard error: {0}")]
    Clipboard(#[from] ClipboardError),

    /// A section copy was requested for a label that does not exist.
    #[error("no section with label id {0}")]
    SectionNotFound(String),
}
