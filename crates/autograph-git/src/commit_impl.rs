//! gix-backed staging and commit creation.
//!
//! Staging writes blobs eagerly and records pending tree edits; `commit`
//! assembles the new tree from HEAD plus those edits, refuses empty commits,
//! writes the commit object, and advances the branch HEAD points at. The
//! on-disk index file is never touched — the staged set lives with the
//! repository handle for the duration of the session.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::VcsError;
use crate::gix_vcs::{GixVcs, PendingEdit};
use crate::status_impl::head_tree_id;
use crate::types::{CommitId, Identity};

pub fn stage(vcs: &mut GixVcs, path: &Path) -> Result<(), VcsError> {
    let rel = vcs.rel_path(path)?;
    if rel.is_empty() || rel == ".git" || rel.starts_with(".git/") {
        return Err(VcsError::Unstageable {
            path: path.to_path_buf(),
            reason: "not a stageable path".to_owned(),
        });
    }
    let abs = vcs.abs_path(&rel);

    match std::fs::symlink_metadata(&abs) {
        Ok(meta) if meta.is_dir() => Err(VcsError::Unstageable {
            path: path.to_path_buf(),
            reason: "git stages files, not directories".to_owned(),
        }),
        Ok(meta) if meta.file_type().is_symlink() => {
            let target = std::fs::read_link(&abs)?;
            let oid = write_blob(vcs, target.to_string_lossy().as_bytes())?;
            vcs.pending.insert(
                rel,
                PendingEdit::Upsert {
                    kind: gix::objs::tree::EntryKind::Link,
                    oid,
                },
            );
            Ok(())
        }
        Ok(meta) => {
            let data = std::fs::read(&abs)?;
            let oid = write_blob(vcs, &data)?;
            let kind = if is_executable(&meta) {
                gix::objs::tree::EntryKind::BlobExecutable
            } else {
                gix::objs::tree::EntryKind::Blob
            };
            vcs.pending.insert(rel, PendingEdit::Upsert { kind, oid });
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            // A vanished file can still be staged as a deletion — but only
            // if HEAD actually tracks it.
            if is_tracked(vcs, &rel)? {
                vcs.pending.insert(rel, PendingEdit::Remove);
                Ok(())
            } else {
                Err(VcsError::NotFound {
                    message: format!("'{rel}' is neither on disk nor tracked"),
                })
            }
        }
        Err(e) => Err(VcsError::Io(e)),
    }
}

pub fn commit(
    vcs: &mut GixVcs,
    message: &str,
    identity: &Identity,
    when: SystemTime,
) -> Result<CommitId, VcsError> {
    if identity.name.trim().is_empty() {
        return Err(VcsError::IdentityMissing {
            message: "author name is empty".to_owned(),
        });
    }
    if identity.email.trim().is_empty() {
        return Err(VcsError::IdentityMissing {
            message: "author email is empty".to_owned(),
        });
    }
    if vcs.pending.is_empty() {
        return Err(VcsError::EmptyCommit);
    }

    let parent_tree = head_tree_id(vcs)?;
    let new_tree = write_staged_tree(vcs, parent_tree)?;

    // Refuse history entries that change nothing.
    let is_noop = match parent_tree {
        Some(parent) => new_tree == parent,
        None => new_tree == vcs.repo.empty_tree().id,
    };
    if is_noop {
        vcs.pending.clear();
        return Err(VcsError::EmptyCommit);
    }

    let seconds = when
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0);
    let signature = gix::actor::Signature {
        name: identity.name.clone().into(),
        email: identity.email.clone().into(),
        time: gix::date::Time::new(seconds, 0),
    };

    let parents: Vec<gix::ObjectId> = match parent_tree {
        Some(_) => {
            let head = vcs.repo.head_commit().map_err(|e| VcsError::Backend {
                message: format!("failed to resolve HEAD commit: {e}"),
            })?;
            vec![head.id]
        }
        None => Vec::new(),
    };

    let commit_obj = gix::objs::Commit {
        tree: new_tree,
        parents: parents.into_iter().collect(),
        author: signature.clone(),
        committer: signature,
        encoding: None,
        message: message.into(),
        extra_headers: Default::default(),
    };
    let id = vcs
        .repo
        .write_object(&commit_obj)
        .map_err(|e| VcsError::Backend {
            message: format!("failed to write commit object: {e}"),
        })?
        .detach();

    advance_head(vcs, id)?;
    vcs.pending.clear();

    let bytes: [u8; 20] = id.as_bytes().try_into().expect("SHA1 is 20 bytes");
    Ok(CommitId::from_bytes(bytes))
}

/// Build the new tree: HEAD's tree (or the empty tree on an unborn branch)
/// with every pending edit applied.
fn write_staged_tree(
    vcs: &GixVcs,
    parent_tree: Option<gix::ObjectId>,
) -> Result<gix::ObjectId, VcsError> {
    let base = match parent_tree {
        Some(id) => vcs.repo.find_tree(id).map_err(|e| VcsError::Backend {
            message: format!("failed to load HEAD tree: {e}"),
        })?,
        None => vcs.repo.empty_tree(),
    };
    let mut editor = base.edit().map_err(|e| VcsError::Backend {
        message: format!("failed to create tree editor: {e}"),
    })?;

    for (rel, edit) in &vcs.pending {
        match edit {
            PendingEdit::Upsert { kind, oid } => {
                editor
                    .upsert(rel.as_str(), *kind, *oid)
                    .map_err(|e| VcsError::Backend {
                        message: format!("tree edit upsert '{rel}': {e}"),
                    })?;
            }
            PendingEdit::Remove => {
                editor
                    .remove(rel.as_str())
                    .map_err(|e| VcsError::Backend {
                        message: format!("tree edit remove '{rel}': {e}"),
                    })?;
            }
        }
    }

    let id = editor.write().map_err(|e| VcsError::Backend {
        message: format!("failed to write staged tree: {e}"),
    })?;
    Ok(id.detach())
}

/// Point the branch HEAD refers to at `commit`, creating it on an unborn
/// branch. Detached HEADs are refused — autocommit only ever operates on a
/// branch.
fn advance_head(vcs: &GixVcs, commit: gix::ObjectId) -> Result<(), VcsError> {
    let head_ref = vcs
        .repo
        .head_name()
        .map_err(|e| VcsError::Backend {
            message: format!("failed to read HEAD target: {e}"),
        })?
        .ok_or_else(|| VcsError::Backend {
            message: "HEAD is detached; refusing to move it".to_owned(),
        })?;
    let name = head_ref.as_bstr().to_string();
    vcs.repo
        .reference(
            name.as_str(),
            commit,
            gix::refs::transaction::PreviousValue::Any,
            "autograph: commit",
        )
        .map_err(|e| VcsError::Backend {
            message: format!("failed to update {name}: {e}"),
        })?;
    Ok(())
}

fn write_blob(vcs: &GixVcs, data: &[u8]) -> Result<gix::ObjectId, VcsError> {
    Ok(vcs
        .repo
        .write_blob(data)
        .map_err(|e| VcsError::Backend {
            message: format!("failed to write blob: {e}"),
        })?
        .detach())
}

fn is_tracked(vcs: &GixVcs, rel: &str) -> Result<bool, VcsError> {
    let Some(tree_id) = head_tree_id(vcs)? else {
        return Ok(false);
    };
    let tree = vcs.repo.find_tree(tree_id).map_err(|e| VcsError::Backend {
        message: format!("failed to load HEAD tree: {e}"),
    })?;
    let entry = tree
        .lookup_entry_by_path(rel)
        .map_err(|e| VcsError::Backend {
            message: format!("failed to look up '{rel}' in HEAD tree: {e}"),
        })?;
    Ok(entry.is_some())
}

#[cfg(unix)]
fn is_executable(meta: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt as _;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &std::fs::Metadata) -> bool {
    false
}
