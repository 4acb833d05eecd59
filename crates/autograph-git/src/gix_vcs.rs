//! The gix-backed implementation of [`Vcs`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::VcsError;
use crate::repo::Vcs;
use crate::types::{CommitId, FileStatus, Identity};

/// A pending index edit, recorded by `stage` and consumed by `commit`.
///
/// Blobs are written to the object store at stage time; the commit step only
/// assembles the tree.
#[derive(Clone, Debug)]
pub(crate) enum PendingEdit {
    /// Insert or update the entry at this path.
    Upsert {
        kind: gix::objs::tree::EntryKind,
        oid: gix::ObjectId,
    },
    /// Remove the entry at this path.
    Remove,
}

/// A [`Vcs`] implementation backed by [gix](https://github.com/GitoxideLabs/gitoxide).
///
/// Construct via [`GixVcs::open`] or [`GixVcs::init_or_open`].
pub struct GixVcs {
    pub(crate) repo: gix::Repository,
    pub(crate) work_dir: PathBuf,
    /// Staged-but-uncommitted edits, keyed by `/`-separated relative path.
    pub(crate) pending: BTreeMap<String, PendingEdit>,
}

impl GixVcs {
    /// Open the existing git repository at `path`.
    pub fn open(path: &Path) -> Result<Self, VcsError> {
        let repo = gix::open(path).map_err(|e| VcsError::Backend {
            message: format!("failed to open repository at {}: {e}", path.display()),
        })?;
        Self::from_repo(repo)
    }

    /// Open the repository at `path`, initializing a fresh one if none
    /// exists. Returns the repository and whether it was newly created.
    ///
    /// This is the one-time `InitRepo` step of a session; everything else
    /// goes through the [`Vcs`] trait.
    pub fn init_or_open(path: &Path) -> Result<(Self, bool), VcsError> {
        match gix::open(path) {
            Ok(repo) => Ok((Self::from_repo(repo)?, false)),
            Err(gix::open::Error::NotARepository { .. }) => {
                let repo = gix::init(path).map_err(|e| VcsError::Backend {
                    message: format!(
                        "failed to initialize repository at {}: {e}",
                        path.display()
                    ),
                })?;
                tracing::debug!(path = %path.display(), "initialized git repository");
                Ok((Self::from_repo(repo)?, true))
            }
            Err(e) => Err(VcsError::Backend {
                message: format!("failed to open repository at {}: {e}", path.display()),
            }),
        }
    }

    fn from_repo(repo: gix::Repository) -> Result<Self, VcsError> {
        let work_dir = repo
            .workdir()
            .ok_or_else(|| VcsError::Backend {
                message: "bare repositories have no working directory to autocommit".to_owned(),
            })?
            .to_path_buf();
        Ok(Self {
            repo,
            work_dir,
            pending: BTreeMap::new(),
        })
    }

    /// Normalize `path` into a `/`-separated path relative to the working
    /// directory. Accepts both absolute paths under the work dir and
    /// already-relative ones.
    pub(crate) fn rel_path(&self, path: &Path) -> Result<String, VcsError> {
        let rel = path.strip_prefix(&self.work_dir).unwrap_or(path);
        if rel.is_absolute() {
            return Err(VcsError::Unstageable {
                path: path.to_path_buf(),
                reason: "path is outside the working directory".to_owned(),
            });
        }
        let mut parts = Vec::new();
        for component in rel.components() {
            match component {
                std::path::Component::Normal(c) => {
                    parts.push(c.to_string_lossy().into_owned());
                }
                std::path::Component::CurDir => {}
                _ => {
                    return Err(VcsError::Unstageable {
                        path: path.to_path_buf(),
                        reason: "path escapes the working directory".to_owned(),
                    });
                }
            }
        }
        Ok(parts.join("/"))
    }

    /// Absolute on-disk location of a repo-relative path.
    pub(crate) fn abs_path(&self, rel: &str) -> PathBuf {
        self.work_dir.join(rel)
    }
}

impl Vcs for GixVcs {
    fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    fn head_exists(&self) -> Result<bool, VcsError> {
        let head = self.repo.head().map_err(|e| VcsError::Backend {
            message: format!("failed to resolve HEAD: {e}"),
        })?;
        Ok(!head.is_unborn())
    }

    fn status_of(&self, path: &Path) -> Result<FileStatus, VcsError> {
        crate::status_impl::status_of(self, path)
    }

    fn tracked_paths(&self) -> Result<Vec<String>, VcsError> {
        crate::status_impl::tracked_paths(self)
    }

    fn stage(&mut self, path: &Path) -> Result<(), VcsError> {
        crate::commit_impl::stage(self, path)
    }

    fn staged_count(&self) -> usize {
        self.pending.len()
    }

    fn commit(
        &mut self,
        message: &str,
        identity: &Identity,
        when: SystemTime,
    ) -> Result<CommitId, VcsError> {
        crate::commit_impl::commit(self, message, identity, when)
    }

    fn config_value(&self, key: &str) -> Result<Option<String>, VcsError> {
        crate::config_impl::config_value(self, key)
    }
}
