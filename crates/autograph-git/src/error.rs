//! Error types for git operations.
//!
//! [`VcsError`] is the single error type returned by all [`Vcs`](crate::Vcs)
//! trait methods. Callers match on variants rather than parsing messages —
//! in particular [`VcsError::EmptyCommit`], which the autocommit core treats
//! as a benign no-op, never as a failure.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by [`Vcs`](crate::Vcs) operations.
#[derive(Debug, Error)]
pub enum VcsError {
    /// A requested object, ref, or path was not found.
    #[error("not found: {message}")]
    NotFound {
        /// Human-readable description of what was missing.
        message: String,
    },

    /// A commit was attempted with nothing staged, or with staged content
    /// identical to the parent tree. Benign: no history entry is created.
    #[error("nothing to commit (staged tree matches HEAD)")]
    EmptyCommit,

    /// A commit was attempted with an incomplete author identity.
    #[error("author identity incomplete: {message}")]
    IdentityMissing {
        /// Which field was missing.
        message: String,
    },

    /// A path handed to `stage` cannot be staged (a directory, a path
    /// outside the working tree, the git metadata directory).
    #[error("cannot stage {}: {reason}", path.display())]
    Unstageable {
        /// The offending path.
        path: PathBuf,
        /// Why it was rejected.
        reason: String,
    },

    /// An I/O error occurred (reading worktree files, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The underlying git backend returned an unclassified error.
    ///
    /// The catch-all for failures that don't fit other variants; `message`
    /// carries enough context to diagnose the failure.
    #[error("git backend error: {message}")]
    Backend {
        /// Freeform error description from the backend.
        message: String,
    },
}
