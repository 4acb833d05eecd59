//! gix-backed per-path status and HEAD tree listing.

use std::path::Path;

use crate::error::VcsError;
use crate::gix_vcs::GixVcs;
use crate::types::FileStatus;

/// The shape of a path on disk, reduced to what a git tree entry records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DiskKind {
    Regular,
    Executable,
    Symlink,
}

/// The tree OID HEAD points at, or `None` when HEAD is unborn.
pub(crate) fn head_tree_id(vcs: &GixVcs) -> Result<Option<gix::ObjectId>, VcsError> {
    let head = vcs.repo.head().map_err(|e| VcsError::Backend {
        message: format!("failed to resolve HEAD: {e}"),
    })?;
    if head.is_unborn() {
        return Ok(None);
    }
    let commit = vcs.repo.head_commit().map_err(|e| VcsError::Backend {
        message: format!("failed to resolve HEAD commit: {e}"),
    })?;
    let tree_id = commit.tree_id().map_err(|e| VcsError::Backend {
        message: format!("failed to read HEAD tree id: {e}"),
    })?;
    Ok(Some(tree_id.detach()))
}

/// Look up the blob entry for `rel` in the HEAD tree.
///
/// Returns `None` when HEAD is unborn, the path is absent, or the entry is
/// not a file (a subtree or submodule).
fn head_entry(vcs: &GixVcs, rel: &str) -> Result<Option<(gix::objs::tree::EntryKind, gix::ObjectId)>, VcsError> {
    let Some(tree_id) = head_tree_id(vcs)? else {
        return Ok(None);
    };
    let tree = vcs.repo.find_tree(tree_id).map_err(|e| VcsError::Backend {
        message: format!("failed to load HEAD tree: {e}"),
    })?;
    let entry = tree
        .lookup_entry_by_path(rel)
        .map_err(|e| VcsError::Backend {
            message: format!("failed to look up '{rel}' in HEAD tree: {e}"),
        })?;
    Ok(entry.and_then(|e| {
        let kind = e.mode().kind();
        match kind {
            gix::objs::tree::EntryKind::Blob
            | gix::objs::tree::EntryKind::BlobExecutable
            | gix::objs::tree::EntryKind::Link => Some((kind, e.id().detach())),
            gix::objs::tree::EntryKind::Tree | gix::objs::tree::EntryKind::Commit => None,
        }
    }))
}

pub fn status_of(vcs: &GixVcs, path: &Path) -> Result<FileStatus, VcsError> {
    let rel = vcs.rel_path(path)?;
    if rel.is_empty() {
        return Ok(FileStatus::Nonexistent);
    }
    if rel == ".git" || rel.starts_with(".git/") {
        return Ok(FileStatus::Ignored);
    }

    let head = head_entry(vcs, &rel)?;
    let abs = vcs.abs_path(&rel);

    let disk = match std::fs::symlink_metadata(&abs) {
        Ok(meta) => Some(meta),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            tracing::debug!(path = %abs.display(), error = %e, "worktree metadata unreadable");
            return Ok(FileStatus::Unreadable);
        }
    };

    match (head, disk) {
        (None, None) => Ok(FileStatus::Nonexistent),
        (None, Some(meta)) => {
            if meta.is_dir() {
                Ok(FileStatus::Nonexistent)
            } else {
                Ok(FileStatus::Added)
            }
        }
        (Some(_), None) => Ok(FileStatus::Removed),
        (Some((kind, oid)), Some(meta)) => {
            if meta.is_dir() {
                // The tracked file was replaced by a directory.
                return Ok(FileStatus::TypeChanged);
            }
            let disk_kind = disk_kind_of(&meta);
            let head_kind = match kind {
                gix::objs::tree::EntryKind::BlobExecutable => DiskKind::Executable,
                gix::objs::tree::EntryKind::Link => DiskKind::Symlink,
                _ => DiskKind::Regular,
            };
            // Symlink vs. file is a type change; an executable-bit flip is
            // an ordinary modification.
            if (disk_kind == DiskKind::Symlink) != (head_kind == DiskKind::Symlink) {
                return Ok(FileStatus::TypeChanged);
            }

            let disk_bytes = match read_disk_bytes(&abs, disk_kind) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::debug!(path = %abs.display(), error = %e, "worktree file unreadable");
                    return Ok(FileStatus::Unreadable);
                }
            };
            let mut blob = vcs.repo.find_blob(oid).map_err(|e| VcsError::Backend {
                message: format!("failed to read HEAD blob for '{rel}': {e}"),
            })?;
            if blob.take_data() == disk_bytes {
                if disk_kind == head_kind {
                    Ok(FileStatus::Unchanged)
                } else {
                    Ok(FileStatus::Modified)
                }
            } else {
                Ok(FileStatus::Modified)
            }
        }
    }
}

/// Recursively list the HEAD tree, sorted.
pub fn tracked_paths(vcs: &GixVcs) -> Result<Vec<String>, VcsError> {
    let Some(tree_id) = head_tree_id(vcs)? else {
        return Ok(Vec::new());
    };
    let mut paths = Vec::new();
    collect_tree_paths(vcs, tree_id, "", &mut paths)?;
    paths.sort();
    Ok(paths)
}

fn collect_tree_paths(
    vcs: &GixVcs,
    tree_id: gix::ObjectId,
    prefix: &str,
    out: &mut Vec<String>,
) -> Result<(), VcsError> {
    let tree = vcs.repo.find_tree(tree_id).map_err(|e| VcsError::Backend {
        message: format!("failed to load tree {tree_id}: {e}"),
    })?;
    for result in tree.iter() {
        let entry = result.map_err(|e| VcsError::Backend {
            message: format!("failed to decode tree entry: {e}"),
        })?;
        let name = entry.inner.filename.to_string();
        let path = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };
        match entry.inner.mode.kind() {
            gix::objs::tree::EntryKind::Tree => {
                collect_tree_paths(vcs, entry.inner.oid.to_owned(), &path, out)?;
            }
            // Submodules are not files of this repository.
            gix::objs::tree::EntryKind::Commit => {}
            _ => out.push(path),
        }
    }
    Ok(())
}

fn disk_kind_of(meta: &std::fs::Metadata) -> DiskKind {
    if meta.file_type().is_symlink() {
        return DiskKind::Symlink;
    }
    if is_executable(meta) {
        return DiskKind::Executable;
    }
    DiskKind::Regular
}

fn read_disk_bytes(abs: &Path, kind: DiskKind) -> std::io::Result<Vec<u8>> {
    if kind == DiskKind::Symlink {
        let target = std::fs::read_link(abs)?;
        Ok(target.to_string_lossy().into_owned().into_bytes())
    } else {
        std::fs::read(abs)
    }
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
