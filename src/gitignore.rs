//! `.gitignore` generation.
//!
//! Pure data: the template mirrors the default exclusion globs (backup,
//! build output and package directories) plus editor log and user-data
//! files. An existing `.gitignore` is never overwritten.

use std::path::Path;

use crate::error::AutographError;

/// File name, relative to the project root.
pub const GITIGNORE_FILE: &str = ".gitignore";

/// The generated `.gitignore` content.
#[must_use]
pub fn template() -> String {
    let mut out = String::new();
    out.push_str("# Generated by autograph\n");
    out.push_str("# ENCODING: UTF-8\n");
    out.push('\n');
    out.push_str("# Directories\n");
    out.push_str("#\n");
    out.push_str(".git\n");
    out.push_str("Backup\n");
    out.push_str("Source/Code/**/bin\n");
    out.push_str("Source/Code/**/obj\n");
    out.push_str("Source/Packages\n");
    out.push('\n');
    out.push_str("# Files\n");
    out.push_str("#\n");
    out.push_str("*.csproj.user\n");
    out.push_str("*.suo\n");
    out.push_str("AppData.dat\n");
    out.push_str("EditorUserData.xml\n");
    out.push_str("logfile*.txt\n");
    out.push_str("perflog*.txt\n");
    out.push('\n');
    out
}

/// Create `<root>/.gitignore` from the template if it does not exist.
///
/// Returns `true` when the file was created, `false` when one already
/// existed.
pub fn ensure(root: &Path) -> Result<bool, AutographError> {
    let path = root.join(GITIGNORE_FILE);
    if path.exists() {
        tracing::debug!(".gitignore exists; keeping it");
        return Ok(false);
    }
    std::fs::write(&path, template())?;
    tracing::debug!(path = %path.display(), "created .gitignore");
    Ok(true)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_covers_metadata_and_build_dirs() {
        let t = template();
        assert!(t.contains(".git\n"));
        assert!(t.contains("Backup\n"));
        assert!(t.contains("Source/Packages\n"));
        assert!(t.contains("logfile*.txt\n"));
    }

    #[test]
    fn ensure_creates_once_and_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ensure(dir.path()).unwrap());
        assert!(!ensure(dir.path()).unwrap());

        // A user-edited file survives.
        let path = dir.path().join(GITIGNORE_FILE);
        std::fs::write(&path, "custom\n").unwrap();
        assert!(!ensure(dir.path()).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "custom\n");
    }
}
