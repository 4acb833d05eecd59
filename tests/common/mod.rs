//! Shared test support: a scripted in-memory [`Vcs`] so scheduling and
//! classification behavior is deterministic — no real repository, no real
//! clock.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use autograph_git::{CommitId, FileStatus, Identity, Vcs, VcsError};

/// A commit recorded by [`MockVcs`].
#[derive(Clone, Debug)]
pub struct RecordedCommit {
    pub message: String,
    pub author: Identity,
    pub when: SystemTime,
    /// The paths that were staged for this commit, in staging order.
    pub staged: Vec<String>,
}

/// Scripted [`Vcs`] double.
///
/// Paths without a scripted status report [`FileStatus::Unchanged`], so a
/// test only sees the changes it set up.
pub struct MockVcs {
    root: PathBuf,
    statuses: BTreeMap<String, FileStatus>,
    tracked: Vec<String>,
    config: BTreeMap<String, String>,
    head_exists: bool,
    staged: Vec<String>,
    pub commits: Vec<RecordedCommit>,
    /// Paths whose staging fails.
    pub fail_stage: BTreeSet<String>,
    /// Force every commit to fail.
    pub fail_commit: bool,
}

impl MockVcs {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            statuses: BTreeMap::new(),
            tracked: Vec::new(),
            config: BTreeMap::new(),
            head_exists: false,
            staged: Vec::new(),
            commits: Vec::new(),
            fail_stage: BTreeSet::new(),
            fail_commit: false,
        }
    }

    pub fn set_status(&mut self, path: &str, status: FileStatus) {
        self.statuses.insert(path.to_owned(), status);
    }

    pub fn set_tracked(&mut self, paths: &[&str]) {
        self.tracked = paths.iter().map(|p| (*p).to_owned()).collect();
        self.tracked.sort();
    }

    pub fn set_config(&mut self, key: &str, value: &str) {
        self.config.insert(key.to_owned(), value.to_owned());
    }

    pub fn staged(&self) -> &[String] {
        &self.staged
    }

    fn rel(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        rel.to_string_lossy().replace('\\', "/")
    }
}

impl Vcs for MockVcs {
    fn work_dir(&self) -> &Path {
        &self.root
    }

    fn head_exists(&self) -> Result<bool, VcsError> {
        Ok(self.head_exists || !self.commits.is_empty())
    }

    fn status_of(&self, path: &Path) -> Result<FileStatus, VcsError> {
        let rel = self.rel(path);
        Ok(self
            .statuses
            .get(&rel)
            .copied()
            .unwrap_or(FileStatus::Unchanged))
    }

    fn tracked_paths(&self) -> Result<Vec<String>, VcsError> {
        Ok(self.tracked.clone())
    }

    fn stage(&mut self, path: &Path) -> Result<(), VcsError> {
        let rel = self.rel(path);
        if self.fail_stage.contains(&rel) {
            return Err(VcsError::Backend {
                message: format!("scripted staging failure for '{rel}'"),
            });
        }
        if !self.staged.contains(&rel) {
            self.staged.push(rel);
        }
        Ok(())
    }

    fn staged_count(&self) -> usize {
        self.staged.len()
    }

    fn commit(
        &mut self,
        message: &str,
        identity: &Identity,
        when: SystemTime,
    ) -> Result<CommitId, VcsError> {
        if self.fail_commit {
            return Err(VcsError::Backend {
                message: "scripted commit failure".to_owned(),
            });
        }
        if !identity.is_complete() {
            return Err(VcsError::IdentityMissing {
                message: "scripted identity check".to_owned(),
            });
        }
        if self.staged.is_empty() {
            return Err(VcsError::EmptyCommit);
        }
        let staged = std::mem::take(&mut self.staged);
        self.commits.push(RecordedCommit {
            message: message.to_owned(),
            author: identity.clone(),
            when,
            staged,
        });
        self.head_exists = true;
        let n = u8::try_from(self.commits.len() % 256).expect("bounded by modulo");
        Ok(CommitId::from_bytes([n; 20]))
    }

    fn config_value(&self, key: &str) -> Result<Option<String>, VcsError> {
        Ok(self.config.get(key).cloned())
    }
}

/// A deterministic timestamp `secs` seconds past the epoch.
pub fn t(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}

/// The identity used by most tests.
pub fn test_author() -> Identity {
    Identity::new("Jane Doe".into(), "jane@example.com".into())
}
