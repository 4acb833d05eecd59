//! gix-backed config reads.

use crate::error::VcsError;
use crate::gix_vcs::GixVcs;

pub fn config_value(vcs: &GixVcs, key: &str) -> Result<Option<String>, VcsError> {
    let snapshot = vcs.repo.config_snapshot();
    Ok(snapshot.string(key).map(|value| value.to_string()))
}
