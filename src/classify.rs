//! Working-tree change classification.
//!
//! [`Classifier::classify`] walks every regular file under the project root,
//! asks the VCS collaborator for each path's status, and maps the result
//! into a [`ChangeSet`] of stageable records. Gitignored files are skipped
//! by the walker itself; configured exclusion globs (build outputs, package
//! caches, backups) are configuration, not hard-coded logic.
//!
//! Classification is a pure query: nothing is staged, nothing is mutated,
//! and two passes over an unchanged tree produce identical ChangeSets —
//! the walk is sorted, and tracked-but-deleted paths are reconciled in
//! sorted order after it.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use autograph_git::{FileStatus, Vcs};
use serde::Serialize;

use crate::error::AutographError;

// ---------------------------------------------------------------------------
// ChangeKind / ChangeRecord
// ---------------------------------------------------------------------------

/// How a path changed relative to the last commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeKind {
    /// New file, not yet tracked.
    Added,
    /// Tracked file with modified content.
    Modified,
    /// Tracked file deleted from the working tree.
    Removed,
    /// Tracked file renamed (reported only by rename-aware backends).
    RenamedFrom,
    /// Tracked file changed kind (file vs. symlink).
    TypeChanged,
    /// Excluded from version control.
    Ignored,
    /// Could not be read.
    Unreadable,
    /// Identical to the last commit.
    Unchanged,
}

impl ChangeKind {
    /// Kinds that never enter a [`ChangeSet`]: classified, but not staged.
    #[must_use]
    pub const fn is_excluded(self) -> bool {
        matches!(self, Self::Ignored | Self::Unreadable | Self::Unchanged)
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Removed => "removed",
            Self::RenamedFrom => "renamed",
            Self::TypeChanged => "type-changed",
            Self::Ignored => "ignored",
            Self::Unreadable => "unreadable",
            Self::Unchanged => "unchanged",
        };
        f.write_str(s)
    }
}

/// One classified path. Immutable snapshot value, produced fresh on every
/// classification pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChangeRecord {
    /// Path relative to the project root, `/`-separated.
    pub path: String,
    /// How the path changed.
    pub kind: ChangeKind,
}

// ---------------------------------------------------------------------------
// ChangeSet
// ---------------------------------------------------------------------------

/// An ordered set of [`ChangeRecord`]s: insertion order is traversal order,
/// and a path appears at most once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    records: Vec<ChangeRecord>,
    seen: BTreeSet<String>,
}

impl ChangeSet {
    /// An empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record unless its path is already present.
    ///
    /// Returns `false` on a duplicate.
    pub fn push(&mut self, record: ChangeRecord) -> bool {
        if self.seen.contains(&record.path) {
            return false;
        }
        self.seen.insert(record.path.clone());
        self.records.push(record);
        true
    }

    /// The records, in traversal order.
    #[must_use]
    pub fn records(&self) -> &[ChangeRecord] {
        &self.records
    }

    /// Iterate the records in traversal order.
    pub fn iter(&self) -> std::slice::Iter<'_, ChangeRecord> {
        self.records.iter()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// `true` when no record survived classification.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The paths to stage, in order.
    #[must_use]
    pub fn paths(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.path.as_str()).collect()
    }

    /// Keep only records whose path appears in `selection` — the
    /// externally-filtered subset of a manual commit. Selections are
    /// compared after normalizing a leading `./` and backslashes.
    pub fn retain_selected(&mut self, selection: &[String]) {
        let normalized: BTreeSet<String> = selection.iter().map(|s| normalize_rel(s)).collect();
        self.records.retain(|r| normalized.contains(&r.path));
        self.seen = self.records.iter().map(|r| r.path.clone()).collect();
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a ChangeRecord;
    type IntoIter = std::slice::Iter<'a, ChangeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn normalize_rel(path: &str) -> String {
    let path = path.replace('\\', "/");
    path.strip_prefix("./").unwrap_or(&path).to_owned()
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Classifies a working directory against the VCS collaborator.
#[derive(Debug)]
pub struct Classifier {
    exclude: Vec<glob::Pattern>,
}

impl Classifier {
    /// Build a classifier from the configured exclusion globs.
    pub fn new(patterns: &[String]) -> Result<Self, AutographError> {
        let exclude = patterns
            .iter()
            .map(|p| {
                glob::Pattern::new(p).map_err(|e| AutographError::BadExcludePattern {
                    pattern: p.clone(),
                    detail: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { exclude })
    }

    fn is_excluded_path(&self, rel: &str) -> bool {
        self.exclude.iter().any(|p| p.matches(rel))
    }

    /// Classify every file under `root`.
    ///
    /// The result contains only stageable records: `Ignored`, `Unreadable`,
    /// and `Unchanged` paths are classified but dropped, and gitignored or
    /// excluded paths are never visited. Deleted tracked files, which the
    /// walk cannot see, are reconciled from [`Vcs::tracked_paths`] in
    /// sorted order after it.
    pub fn classify<V: Vcs + ?Sized>(
        &self,
        root: &Path,
        vcs: &V,
    ) -> Result<ChangeSet, AutographError> {
        match std::fs::metadata(root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(AutographError::WorkDirMissing {
                    root: root.to_path_buf(),
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AutographError::WorkDirMissing {
                    root: root.to_path_buf(),
                });
            }
            Err(e) => {
                return Err(AutographError::WorkDirUnreadable {
                    root: root.to_path_buf(),
                    detail: e.to_string(),
                });
            }
        }

        let mut changes = ChangeSet::new();

        for rel in self.walk(root) {
            let status = vcs.status_of(Path::new(&rel))?;
            self.record(&mut changes, &rel, status);
        }

        // Deleted (or gitignored-but-tracked) files never show up in the
        // walk; reconcile them against HEAD.
        for rel in vcs.tracked_paths()? {
            if changes.seen.contains(&rel) || self.is_excluded_path(&rel) {
                continue;
            }
            let status = vcs.status_of(Path::new(&rel))?;
            self.record(&mut changes, &rel, status);
        }

        Ok(changes)
    }

    fn record(&self, changes: &mut ChangeSet, rel: &str, status: FileStatus) {
        let kind = match status {
            FileStatus::Added => ChangeKind::Added,
            FileStatus::Modified => ChangeKind::Modified,
            FileStatus::Removed => ChangeKind::Removed,
            FileStatus::Renamed => ChangeKind::RenamedFrom,
            FileStatus::TypeChanged => ChangeKind::TypeChanged,
            FileStatus::Ignored => ChangeKind::Ignored,
            FileStatus::Unreadable => ChangeKind::Unreadable,
            FileStatus::Unchanged => ChangeKind::Unchanged,
            FileStatus::Nonexistent => return,
        };
        if kind.is_excluded() {
            tracing::trace!(path = rel, status = %status, "skipping non-stageable path");
            return;
        }
        changes.push(ChangeRecord {
            path: rel.to_owned(),
            kind,
        });
    }

    /// Sorted walk of the regular files under `root`, yielding
    /// `/`-separated relative paths. Honors `.gitignore`, skips the git
    /// metadata directory and the configured exclusions.
    fn walk(&self, root: &Path) -> Vec<String> {
        let filter_root = root.to_path_buf();
        let filter_patterns = self.exclude.clone();

        let walker = ignore::WalkBuilder::new(root)
            .hidden(false)
            .parents(false)
            .ignore(false)
            .git_global(false)
            .git_ignore(true)
            .git_exclude(true)
            .require_git(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                if entry.file_name() == ".git" {
                    return false;
                }
                let rel = entry
                    .path()
                    .strip_prefix(&filter_root)
                    .unwrap_or_else(|_| entry.path());
                let rel = rel.to_string_lossy().replace('\\', "/");
                !filter_patterns.iter().any(|p| p.matches(&rel))
            })
            .build();

        let mut paths = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!(error = %e, "walk error; skipping entry");
                    continue;
                }
            };
            let is_file = entry
                .file_type()
                .is_some_and(|t| t.is_file() || t.is_symlink());
            if !is_file {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(root)
                .unwrap_or_else(|_| entry.path());
            paths.push(rel.to_string_lossy().replace('\\', "/"));
        }
        paths
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_set_dedupes_by_path() {
        let mut set = ChangeSet::new();
        assert!(set.push(ChangeRecord {
            path: "a.txt".into(),
            kind: ChangeKind::Added,
        }));
        assert!(!set.push(ChangeRecord {
            path: "a.txt".into(),
            kind: ChangeKind::Modified,
        }));
        assert_eq!(set.len(), 1);
        assert_eq!(set.records()[0].kind, ChangeKind::Added);
    }

    #[test]
    fn retain_selected_filters_and_normalizes() {
        let mut set = ChangeSet::new();
        set.push(ChangeRecord {
            path: "a.txt".into(),
            kind: ChangeKind::Added,
        });
        set.push(ChangeRecord {
            path: "b.txt".into(),
            kind: ChangeKind::Modified,
        });

        set.retain_selected(&["./a.txt".to_owned()]);
        assert_eq!(set.paths(), vec!["a.txt"]);
    }

    #[test]
    fn excluded_kinds() {
        assert!(ChangeKind::Ignored.is_excluded());
        assert!(ChangeKind::Unreadable.is_excluded());
        assert!(ChangeKind::Unchanged.is_excluded());
        assert!(!ChangeKind::Added.is_excluded());
        assert!(!ChangeKind::Removed.is_excluded());
        assert!(!ChangeKind::RenamedFrom.is_excluded());
    }

    #[test]
    fn bad_exclude_pattern_is_reported() {
        let err = Classifier::new(&["[".to_owned()]).unwrap_err();
        assert!(matches!(
            err,
            AutographError::BadExcludePattern { .. }
        ));
    }
}
