//! Host-session glue: repository bootstrap and trigger dispatch.
//!
//! A [`Session`] is what a host (editor plugin shim, or this crate's own
//! CLI) holds for its lifetime. Bootstrap opens or initializes the
//! repository, ensures `.gitignore` exists, resolves the author identity,
//! creates the first-run initial commit, and wires a [`CommitScheduler`]
//! with its collaborators passed explicitly — no global plugin singleton.
//!
//! A failed repository init disables autocommit for the session (logged
//! once); the host keeps running and every later trigger is a quiet no-op.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use autograph_git::{GixVcs, Identity, Vcs, VcsError};

use crate::classify::Classifier;
use crate::config::Settings;
use crate::error::AutographError;
use crate::gitignore;
use crate::message;
use crate::scheduler::{CommitScheduler, Outcome, Trigger};

/// One autocommit session over a project directory.
pub struct Session<V: Vcs> {
    root: PathBuf,
    settings: Settings,
    /// `None` when repository init failed — the feature is disabled until
    /// the host restarts.
    scheduler: Option<CommitScheduler<V>>,
}

impl Session<GixVcs> {
    /// Bootstrap a session over `root` with the gix backend.
    ///
    /// Never fails: an unusable repository disables the feature instead of
    /// erroring out of the host.
    #[must_use]
    pub fn bootstrap(root: &Path, now: SystemTime) -> Self {
        let settings = match Settings::load(root) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(error = %e, "settings unreadable; using defaults");
                Settings::default()
            }
        };

        match GixVcs::init_or_open(root) {
            Ok((vcs, created)) => {
                tracing::debug!(root = %root.display(), created, "repository ready");
                match Self::with_vcs(vcs, settings, root, created, now) {
                    Ok(session) => session,
                    Err((settings, e)) => Self::disabled(root, settings, &e),
                }
            }
            Err(e) => {
                let e = AutographError::RepoInit {
                    root: root.to_path_buf(),
                    detail: e.to_string(),
                };
                Self::disabled(root, settings, &e)
            }
        }
    }
}

impl<V: Vcs> Session<V> {
    /// Build a session over an already-opened repository.
    ///
    /// `first_run` marks a repository created by this bootstrap: it gets the
    /// `.gitignore`-only initial commit. On error the settings are handed
    /// back so the caller can still construct a disabled session.
    pub fn with_vcs(
        mut vcs: V,
        mut settings: Settings,
        root: &Path,
        first_run: bool,
        now: SystemTime,
    ) -> Result<Self, (Settings, AutographError)> {
        if let Err(e) = gitignore::ensure(root) {
            // Not fatal: the repository still works without it.
            tracing::warn!(error = %e, "failed to create .gitignore");
        }

        autofill_author(&mut settings, &vcs);
        let author = settings.author.identity();

        if first_run {
            initial_commit(&mut vcs, root, &author, now);
        }

        let classifier = match Classifier::new(&settings.classify.exclude) {
            Ok(classifier) => classifier,
            Err(e) => return Err((settings, e)),
        };
        let scheduler = CommitScheduler::new(vcs, classifier, settings.commit.clone(), author, now);
        Ok(Self {
            root: root.to_path_buf(),
            settings,
            scheduler: Some(scheduler),
        })
    }

    fn disabled(root: &Path, settings: Settings, reason: &AutographError) -> Self {
        tracing::error!(error = %reason, "autocommit disabled for this session");
        Self {
            root: root.to_path_buf(),
            settings,
            scheduler: None,
        }
    }

    /// `true` when bootstrap succeeded and triggers can lead to commits.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.scheduler.is_some()
    }

    /// The loaded settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The scheduler, when the session is enabled.
    pub fn scheduler(&mut self) -> Option<&mut CommitScheduler<V>> {
        self.scheduler.as_mut()
    }

    /// Handle one host trigger.
    ///
    /// Settings are persisted when the gate asks for a flush, and always on
    /// termination — matching the original plugin, which saved its user
    /// data in its terminate handler regardless of policy.
    pub fn on_trigger(&mut self, trigger: Trigger, at: SystemTime) -> Outcome {
        let Some(scheduler) = self.scheduler.as_mut() else {
            tracing::trace!(trigger = %trigger, "session disabled; ignoring trigger");
            return Outcome::Gated;
        };
        let outcome = scheduler.on_trigger(trigger, at);
        let flush = matches!(outcome, Outcome::SettingsFlush) || trigger == Trigger::Terminating;
        if flush {
            self.persist_settings();
        }
        outcome
    }

    /// Manual commit with an optional path selection and message override.
    pub fn manual_commit(
        &mut self,
        selection: Option<&[String]>,
        head: Option<&str>,
        at: SystemTime,
    ) -> Outcome {
        let Some(scheduler) = self.scheduler.as_mut() else {
            tracing::trace!("session disabled; ignoring manual commit");
            return Outcome::Gated;
        };
        scheduler.commit_selected(selection, head, at)
    }

    fn persist_settings(&self) {
        if let Err(e) = self.settings.save(&self.root) {
            tracing::warn!(error = %e, "failed to persist settings");
        } else {
            tracing::debug!("settings persisted");
        }
    }
}

/// Fill an empty author from the git config when auto-fetch is enabled.
fn autofill_author<V: Vcs>(settings: &mut Settings, vcs: &V) {
    let author = &mut settings.author;
    if !author.name.is_empty() || !author.email.is_empty() || !author.auto_fetch_config {
        return;
    }
    match (
        vcs.config_value("user.name"),
        vcs.config_value("user.email"),
    ) {
        (Ok(Some(name)), Ok(Some(email))) => {
            tracing::debug!(name = %name, email = %email, "author auto-filled from git config");
            author.name = name;
            author.email = email;
        }
        (Ok(_), Ok(_)) => {
            tracing::debug!("git config has no author identity to auto-fill");
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "failed to read git config for author auto-fill");
        }
    }
}

/// Stage exactly `.gitignore` and create the initial commit.
///
/// Skipped (with a reported error) when the author is incomplete or the
/// file is missing — a later manual commit will pick it up instead.
fn initial_commit<V: Vcs>(vcs: &mut V, root: &Path, author: &Identity, now: SystemTime) {
    if !author.is_complete() {
        tracing::error!(
            "author identity incomplete; skipping initial commit (set [author] in settings)"
        );
        return;
    }
    if !root.join(gitignore::GITIGNORE_FILE).exists() {
        tracing::warn!(".gitignore missing; skipping initial commit");
        return;
    }

    if let Err(e) = vcs.stage(Path::new(gitignore::GITIGNORE_FILE)) {
        tracing::warn!(error = %e, "failed to stage .gitignore for the initial commit");
        return;
    }

    let mut changes = crate::classify::ChangeSet::new();
    changes.push(crate::classify::ChangeRecord {
        path: gitignore::GITIGNORE_FILE.to_owned(),
        kind: crate::classify::ChangeKind::Added,
    });
    let message = message::compose(Some("Initial commit"), &changes);

    match vcs.commit(&message, author, now) {
        Ok(id) => tracing::info!(commit = %id, "created initial commit"),
        Err(VcsError::EmptyCommit) => {
            tracing::debug!("nothing to commit for the initial commit");
        }
        Err(e) => tracing::error!(error = %e, "initial commit failed"),
    }
}
