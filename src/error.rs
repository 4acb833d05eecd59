//! Error types for the autocommit core.
//!
//! Defines [`AutographError`], the unified error type for session and
//! classification operations. Nothing here ever crosses the host boundary
//! as a panic: the scheduler catches every failure, reports it through
//! `tracing`, and returns to idle, so one bad cycle never blocks the next.

use std::fmt;
use std::path::PathBuf;

use autograph_git::VcsError;

// ---------------------------------------------------------------------------
// AutographError
// ---------------------------------------------------------------------------

/// Unified error type for the autocommit core.
#[derive(Debug)]
pub enum AutographError {
    /// The repository could not be created or opened. Fatal to this
    /// session's autocommit feature; logged once, then triggers become
    /// no-ops until the host restarts.
    RepoInit {
        /// The directory that was being initialized.
        root: PathBuf,
        /// Human-readable description of the failure.
        detail: String,
    },

    /// The classification root does not exist.
    WorkDirMissing {
        /// The missing directory.
        root: PathBuf,
    },

    /// The classification root exists but could not be read. The cycle is
    /// skipped; the next trigger retries naturally.
    WorkDirUnreadable {
        /// The unreadable directory.
        root: PathBuf,
        /// Human-readable description of the failure.
        detail: String,
    },

    /// An exclusion glob in the settings failed to parse.
    BadExcludePattern {
        /// The offending pattern.
        pattern: String,
        /// Why it was rejected.
        detail: String,
    },

    /// The settings file could not be loaded or written.
    Settings {
        /// Path to the settings file.
        path: PathBuf,
        /// Human-readable description of the problem.
        detail: String,
    },

    /// A version-control operation failed.
    Vcs(VcsError),

    /// An I/O error outside any more specific context.
    Io(std::io::Error),
}

impl fmt::Display for AutographError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RepoInit { root, detail } => {
                write!(
                    f,
                    "failed to initialize repository at {}: {detail}",
                    root.display()
                )
            }
            Self::WorkDirMissing { root } => {
                write!(f, "working directory {} does not exist", root.display())
            }
            Self::WorkDirUnreadable { root, detail } => {
                write!(
                    f,
                    "working directory {} is not readable: {detail}",
                    root.display()
                )
            }
            Self::BadExcludePattern { pattern, detail } => {
                write!(f, "invalid exclusion pattern '{pattern}': {detail}")
            }
            Self::Settings { path, detail } => {
                write!(f, "settings file {}: {detail}", path.display())
            }
            Self::Vcs(e) => write!(f, "{e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for AutographError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Vcs(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<VcsError> for AutographError {
    fn from(e: VcsError) -> Self {
        Self::Vcs(e)
    }
}

impl From<std::io::Error> for AutographError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
