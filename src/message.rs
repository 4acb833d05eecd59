//! Commit message generation.
//!
//! One line per classified change, `"<Verb> file '<path>'"`, in ChangeSet
//! order — so an unchanged tree always reproduces the same message.

use crate::classify::{ChangeKind, ChangeSet};

/// The summary line for one change.
fn line(kind: ChangeKind, path: &str) -> Option<String> {
    match kind {
        ChangeKind::Added => Some(format!("Added file '{path}'")),
        ChangeKind::Removed => Some(format!("Removed file '{path}'")),
        ChangeKind::Modified => Some(format!("Modified file '{path}'")),
        ChangeKind::RenamedFrom => Some(format!("Renamed file '{path}' in index")),
        ChangeKind::TypeChanged => Some(format!("Staged type change for file '{path}'")),
        ChangeKind::Ignored | ChangeKind::Unreadable | ChangeKind::Unchanged => None,
    }
}

/// Build a commit message from a change set.
///
/// With a `head` (a user-supplied manual-commit message, or the initial
/// commit's subject), the per-file lines follow after a blank separator.
/// Without one, the lines are the whole message, as the original autocommit
/// wrote them.
#[must_use]
pub fn compose(head: Option<&str>, changes: &ChangeSet) -> String {
    let mut message = String::new();
    if let Some(head) = head {
        message.push_str(head.trim_end());
        message.push_str("\n\n");
    }
    for record in changes {
        if let Some(line) = line(record.kind, &record.path) {
            message.push_str(&line);
            message.push('\n');
        }
    }
    message
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
