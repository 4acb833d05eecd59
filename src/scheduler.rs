//! The commit scheduler: a small state machine deciding when a trigger
//! becomes a commit.
//!
//! Host lifecycle events arrive as [`Trigger`] values with a timestamp; the
//! [gate](gate) — a pure function of policy, last-commit time, trigger kind
//! and timestamp — decides between committing, flushing settings, and doing
//! nothing. Commit execution classifies the working tree, stages the
//! stageable records, and issues at most one commit through the VCS
//! collaborator.
//!
//! # Lifecycle
//!
//! ```text
//! Idle ──trigger, gate passes──▶ Committing ──attempt done──▶ Idle
//!   │                                │
//!   └── gate fails: stay Idle        └── re-entrant trigger: dropped
//! ```
//!
//! Every attempt — success, no-op, or error — returns the scheduler to
//! `Idle` and advances the last-commit timestamp, so a failing repository
//! can never thrash or permanently block later triggers.

use std::fmt;
use std::time::SystemTime;

use autograph_git::{CommitId, Identity, Vcs, VcsError};

use crate::classify::{ChangeSet, Classifier};
use crate::config::{CommitPolicy, CommitTrigger};
use crate::message;

// ---------------------------------------------------------------------------
// Trigger
// ---------------------------------------------------------------------------

/// An external event that may cause a commit decision.
///
/// Carries no payload; the event timestamp travels alongside as a
/// [`SystemTime`] argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// The host is idle.
    IdleTick,
    /// The user explicitly requested a commit.
    ManualRequest,
    /// The host saved all open documents.
    SaveAll,
    /// The host is shutting down.
    Terminating,
    /// The host is reloading its settings.
    SettingsReload,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdleTick => write!(f, "idle-tick"),
            Self::ManualRequest => write!(f, "manual-request"),
            Self::SaveAll => write!(f, "save-all"),
            Self::Terminating => write!(f, "terminating"),
            Self::SettingsReload => write!(f, "settings-reload"),
        }
    }
}

// ---------------------------------------------------------------------------
// SchedulerPhase
// ---------------------------------------------------------------------------

/// The scheduler's state-machine phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SchedulerPhase {
    /// Waiting for a trigger.
    #[default]
    Idle,
    /// A commit attempt is executing; concurrent triggers are dropped.
    Committing,
}

impl SchedulerPhase {
    /// `true` while a commit attempt is in flight.
    #[must_use]
    pub const fn is_committing(self) -> bool {
        matches!(self, Self::Committing)
    }
}

impl fmt::Display for SchedulerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Committing => write!(f, "committing"),
        }
    }
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// What a trigger leads to under the current policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateDecision {
    /// Attempt a commit now.
    Commit,
    /// Persist the settings; no commit.
    FlushSettings,
    /// Nothing to do.
    Ignore,
}

/// The policy gate: pure function of policy, last-commit time, trigger kind
/// and event timestamp.
///
/// - A manual request passes under every policy.
/// - An idle tick passes only under the automatic policy, once the
///   configured interval has elapsed since the last commit attempt.
/// - Save-all persists settings under every policy and never commits.
/// - Termination commits only under the on-exit policy.
/// - A settings reload persists settings only under the on-reload policy.
#[must_use]
pub fn gate(
    policy: &CommitPolicy,
    last_commit: SystemTime,
    trigger: Trigger,
    at: SystemTime,
) -> GateDecision {
    match trigger {
        Trigger::ManualRequest => GateDecision::Commit,
        Trigger::IdleTick => {
            if policy.trigger != CommitTrigger::Automatic {
                return GateDecision::Ignore;
            }
            // A clock that moved backwards counts as "no time elapsed".
            let elapsed = at.duration_since(last_commit).unwrap_or_default();
            if elapsed >= policy.interval.duration() {
                GateDecision::Commit
            } else {
                GateDecision::Ignore
            }
        }
        Trigger::SaveAll => GateDecision::FlushSettings,
        Trigger::Terminating => {
            if policy.trigger == CommitTrigger::OnExit {
                GateDecision::Commit
            } else {
                GateDecision::Ignore
            }
        }
        Trigger::SettingsReload => {
            if policy.trigger == CommitTrigger::OnReload {
                GateDecision::FlushSettings
            } else {
                GateDecision::Ignore
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// What handling a trigger did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// A commit was created.
    Committed {
        /// The new commit.
        id: CommitId,
        /// How many paths were staged for it.
        staged: usize,
    },
    /// The gate passed but the working tree had no stageable changes.
    NoChanges,
    /// The gate rejected the trigger.
    Gated,
    /// The trigger only asks for the settings to be persisted; the session
    /// owns that write.
    SettingsFlush,
    /// A commit was already in flight; the trigger was dropped, not queued.
    Dropped,
    /// The attempt failed; details were logged and the scheduler is idle
    /// again.
    Failed,
}

// ---------------------------------------------------------------------------
// CommitScheduler
// ---------------------------------------------------------------------------

/// Decides when to snapshot the working directory and performs the
/// classify → stage → commit pipeline.
///
/// Owns its collaborators (VCS, classifier) and its state — there is no
/// global plugin instance to reach for. One scheduler per session.
pub struct CommitScheduler<V: Vcs> {
    vcs: V,
    classifier: Classifier,
    policy: CommitPolicy,
    author: Identity,
    phase: SchedulerPhase,
    last_commit: SystemTime,
}

impl<V: Vcs> CommitScheduler<V> {
    /// Create a scheduler. `started_at` seeds the last-commit timestamp, so
    /// the first automatic commit happens one full interval into the
    /// session.
    pub fn new(
        vcs: V,
        classifier: Classifier,
        policy: CommitPolicy,
        author: Identity,
        started_at: SystemTime,
    ) -> Self {
        Self {
            vcs,
            classifier,
            policy,
            author,
            phase: SchedulerPhase::Idle,
            last_commit: started_at,
        }
    }

    /// The VCS collaborator.
    pub fn vcs(&self) -> &V {
        &self.vcs
    }

    /// Mutable access to the VCS collaborator (session bootstrap needs it
    /// for the initial commit).
    pub fn vcs_mut(&mut self) -> &mut V {
        &mut self.vcs
    }

    /// The current phase.
    #[must_use]
    pub fn phase(&self) -> SchedulerPhase {
        self.phase
    }

    /// Timestamp of the most recent commit attempt.
    #[must_use]
    pub fn last_commit(&self) -> SystemTime {
        self.last_commit
    }

    /// Replace the author identity (settings changed mid-session).
    pub fn set_author(&mut self, author: Identity) {
        self.author = author;
    }

    /// Handle one host trigger delivered at `at`.
    pub fn on_trigger(&mut self, trigger: Trigger, at: SystemTime) -> Outcome {
        if self.phase.is_committing() {
            tracing::debug!(trigger = %trigger, "commit in flight; dropping trigger");
            return Outcome::Dropped;
        }
        match gate(&self.policy, self.last_commit, trigger, at) {
            GateDecision::Commit => self.attempt(None, None, at),
            GateDecision::FlushSettings => Outcome::SettingsFlush,
            GateDecision::Ignore => {
                tracing::trace!(trigger = %trigger, policy = %self.policy.trigger, "gate rejected trigger");
                Outcome::Gated
            }
        }
    }

    /// Manual commit with an externally filtered selection.
    ///
    /// `selection`, when present, is the authoritative staging list: only
    /// those paths (never directories) are staged, and the generated
    /// message mentions only them. `head` overrides the message subject.
    pub fn commit_selected(
        &mut self,
        selection: Option<&[String]>,
        head: Option<&str>,
        at: SystemTime,
    ) -> Outcome {
        if self.phase.is_committing() {
            tracing::debug!("commit in flight; dropping manual request");
            return Outcome::Dropped;
        }
        self.attempt(selection, head, at)
    }

    /// One commit attempt. Always returns to `Idle`, always advances
    /// `last_commit`, never propagates an error.
    fn attempt(&mut self, selection: Option<&[String]>, head: Option<&str>, at: SystemTime) -> Outcome {
        self.phase = SchedulerPhase::Committing;
        let outcome = self.execute(selection, head, at);
        self.phase = SchedulerPhase::Idle;
        self.last_commit = at;
        outcome
    }

    fn execute(&mut self, selection: Option<&[String]>, head: Option<&str>, at: SystemTime) -> Outcome {
        if !self.author.is_complete() {
            tracing::error!(
                "author identity incomplete (set [author] name/email in settings); skipping commit"
            );
            return Outcome::Failed;
        }

        let root = self.vcs.work_dir().to_path_buf();
        let mut changes = match self.classifier.classify(&root, &self.vcs) {
            Ok(changes) => changes,
            Err(e) => {
                tracing::warn!(error = %e, "classification failed; skipping this cycle");
                return Outcome::Failed;
            }
        };
        if let Some(selection) = selection {
            changes.retain_selected(selection);
        }
        if changes.is_empty() {
            tracing::debug!("nothing changed; skipping commit");
            return Outcome::NoChanges;
        }

        let staged = self.stage_all(&changes);
        let message = message::compose(head, &changes);

        match self.vcs.commit(&message, &self.author, at) {
            Ok(id) => {
                tracing::info!(commit = %id, files = staged, "committed working-tree changes");
                Outcome::Committed { id, staged }
            }
            Err(VcsError::EmptyCommit) => {
                tracing::debug!("staged content matches HEAD; skipping commit");
                Outcome::NoChanges
            }
            Err(e) => {
                tracing::error!(error = %e, "commit failed");
                Outcome::Failed
            }
        }
    }

    /// Stage every path in the set. Per-path failures are logged and the
    /// rest of the batch continues — the commit proceeds with whatever
    /// staged successfully.
    fn stage_all(&mut self, changes: &ChangeSet) -> usize {
        let mut staged = 0;
        for record in changes {
            match self.vcs.stage(std::path::Path::new(&record.path)) {
                Ok(()) => staged += 1,
                Err(e) => {
                    tracing::warn!(path = %record.path, error = %e, "failed to stage; continuing");
                }
            }
        }
        staged
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
