//! The [`Vcs`] trait — the abstraction boundary between the autocommit core
//! and git.
//!
//! The trait covers exactly the capabilities the core consumes: per-path
//! status, the HEAD file listing, staging, committing, and config reads.
//! It is object-safe so callers can hold `&mut dyn Vcs` or `Box<dyn Vcs>`;
//! repository creation ([`GixVcs::init_or_open`](crate::GixVcs::init_or_open))
//! lives on the concrete type because constructors cannot be object-safe.

use std::path::Path;
use std::time::SystemTime;

use crate::error::VcsError;
use crate::types::{CommitId, FileStatus, Identity};

/// The version-control interface consumed by the autocommit core.
///
/// Implementations may be backed by gix (the production backend) or a
/// scripted test double. All paths are interpreted relative to
/// [`work_dir`](Self::work_dir); absolute paths under it are accepted too.
pub trait Vcs {
    /// The repository working directory.
    fn work_dir(&self) -> &Path;

    /// Returns `true` once the repository has at least one commit.
    ///
    /// `false` means HEAD is unborn — the next commit will be the initial,
    /// parentless one.
    fn head_exists(&self) -> Result<bool, VcsError>;

    /// Report the status of a single path, comparing the working tree
    /// against HEAD.
    ///
    /// Pure query: never touches the staging state. Directories report
    /// [`FileStatus::Nonexistent`] — git tracks files, not directories.
    fn status_of(&self, path: &Path) -> Result<FileStatus, VcsError>;

    /// List every file path recorded in the HEAD tree, sorted,
    /// `/`-separated, relative to the working directory.
    ///
    /// Empty when HEAD is unborn. Used to detect deletions, which a
    /// working-tree walk alone can never see.
    fn tracked_paths(&self) -> Result<Vec<String>, VcsError>;

    /// Mark a path for inclusion in the next commit.
    ///
    /// For an existing file the content is captured at stage time; for a
    /// tracked-but-deleted path the removal is recorded. Staging the same
    /// path again replaces the earlier capture. Errors are per-path — a
    /// failed stage leaves previously staged paths intact, so callers may
    /// log and continue with the rest of a batch.
    fn stage(&mut self, path: &Path) -> Result<(), VcsError>;

    /// Number of paths currently staged for the next commit.
    fn staged_count(&self) -> usize;

    /// Create one commit from the staged set, authored by `identity` at
    /// `when` (UTC), and advance the current branch.
    ///
    /// Returns [`VcsError::EmptyCommit`] when nothing is staged or the
    /// staged content is identical to HEAD — no history entry is created in
    /// that case. On success (and on the empty-commit no-op) the staged set
    /// is cleared.
    fn commit(
        &mut self,
        message: &str,
        identity: &Identity,
        when: SystemTime,
    ) -> Result<CommitId, VcsError>;

    /// Read a git config value. Returns `None` if the key is not set.
    ///
    /// Used to auto-fill the author identity from `user.name` /
    /// `user.email` when settings carry none.
    fn config_value(&self, key: &str) -> Result<Option<String>, VcsError>;
}
