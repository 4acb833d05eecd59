//! Scheduling-policy properties, driven through the scripted Vcs: the gate
//! rows, interval arithmetic, the no-op law, selection filtering, and the
//! failure semantics around a commit attempt.

mod common;

use std::fs;

use autograph::classify::Classifier;
use autograph::config::{CommitInterval, CommitPolicy, CommitTrigger};
use autograph::scheduler::{CommitScheduler, Outcome, Trigger};
use autograph_git::{FileStatus, Identity};
use common::{MockVcs, t, test_author};
use proptest::prelude::*;

const MIN_10: u64 = 10 * 60;
const MIN_15: u64 = 15 * 60;

fn scheduler(
    vcs: MockVcs,
    trigger: CommitTrigger,
    interval: CommitInterval,
) -> CommitScheduler<MockVcs> {
    CommitScheduler::new(
        vcs,
        Classifier::new(&[]).expect("patterns"),
        CommitPolicy { trigger, interval },
        test_author(),
        t(0),
    )
}

/// A tempdir with one changed file the mock reports as Added.
fn dirty_fixture() -> (tempfile::TempDir, MockVcs) {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("a.txt"), "one\n").expect("write");
    let mut vcs = MockVcs::new(dir.path());
    vcs.set_status("a.txt", FileStatus::Added);
    (dir, vcs)
}

#[test]
fn manual_request_commits_under_manual_policy() {
    let (_dir, vcs) = dirty_fixture();
    let mut scheduler = scheduler(vcs, CommitTrigger::Manual, CommitInterval::OneHour);

    // Even at the last-commit timestamp itself the gate passes.
    let outcome = scheduler.on_trigger(Trigger::ManualRequest, t(0));
    assert!(matches!(outcome, Outcome::Committed { staged: 1, .. }));
}

#[test]
fn second_tick_inside_the_interval_never_commits() {
    let (_dir, vcs) = dirty_fixture();
    let mut scheduler = scheduler(vcs, CommitTrigger::Automatic, CommitInterval::FiveMinutes);

    let outcome = scheduler.on_trigger(Trigger::IdleTick, t(5 * 60));
    assert!(matches!(outcome, Outcome::Committed { .. }));

    // 4m59s later: rejected by the gate.
    let outcome = scheduler.on_trigger(Trigger::IdleTick, t(5 * 60 + 299));
    assert_eq!(outcome, Outcome::Gated);
    assert_eq!(scheduler.vcs().commits.len(), 1);

    // Exactly the interval later: commits again (the tree is still dirty —
    // the mock keeps reporting Added).
    let outcome = scheduler.on_trigger(Trigger::IdleTick, t(10 * 60));
    assert!(matches!(outcome, Outcome::Committed { .. }));
    assert_eq!(scheduler.vcs().commits.len(), 2);
}

#[test]
fn ticks_ten_minutes_apart_under_a_15m_policy() {
    // End-to-end scenario: policy automatic/15m, two ticks 10 minutes apart,
    // changed files present at both.
    let (_dir, vcs) = dirty_fixture();
    let mut scheduler = scheduler(
        vcs,
        CommitTrigger::Automatic,
        CommitInterval::FifteenMinutes,
    );

    let outcome = scheduler.on_trigger(Trigger::IdleTick, t(MIN_15));
    assert!(matches!(outcome, Outcome::Committed { .. }));
    assert_eq!(scheduler.last_commit(), t(MIN_15));

    // Ten minutes later the gate rejects, and — crucially — the rejection
    // does not advance the last-commit timestamp.
    let outcome = scheduler.on_trigger(Trigger::IdleTick, t(MIN_15 + MIN_10));
    assert_eq!(outcome, Outcome::Gated);
    assert_eq!(scheduler.vcs().commits.len(), 1);
    assert_eq!(scheduler.last_commit(), t(MIN_15));
}

#[test]
fn empty_change_set_never_reaches_the_commit_primitive() {
    // No-op law: clean tree → the commit primitive is not called.
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("clean.txt"), "same\n").expect("write");
    let mut vcs = MockVcs::new(dir.path());
    vcs.set_status("clean.txt", FileStatus::Unchanged);

    let mut scheduler = scheduler(vcs, CommitTrigger::Manual, CommitInterval::FiveMinutes);
    let outcome = scheduler.on_trigger(Trigger::ManualRequest, t(100));
    assert_eq!(outcome, Outcome::NoChanges);
    assert!(scheduler.vcs().commits.is_empty());
    // The no-op still counts as an attempt.
    assert_eq!(scheduler.last_commit(), t(100));
}

#[test]
fn save_all_flushes_settings_and_never_commits() {
    let (_dir, vcs) = dirty_fixture();
    let mut scheduler = scheduler(vcs, CommitTrigger::Automatic, CommitInterval::FiveMinutes);

    let outcome = scheduler.on_trigger(Trigger::SaveAll, t(10_000));
    assert_eq!(outcome, Outcome::SettingsFlush);
    assert!(scheduler.vcs().commits.is_empty());
}

#[test]
fn terminating_commits_only_under_on_exit() {
    let (_dir, vcs) = dirty_fixture();
    let mut on_exit_scheduler = scheduler(vcs, CommitTrigger::OnExit, CommitInterval::FiveMinutes);
    let outcome = on_exit_scheduler.on_trigger(Trigger::Terminating, t(1));
    assert!(matches!(outcome, Outcome::Committed { .. }));

    let (_dir, vcs) = dirty_fixture();
    let mut scheduler = scheduler(vcs, CommitTrigger::Automatic, CommitInterval::FiveMinutes);
    let outcome = scheduler.on_trigger(Trigger::Terminating, t(10_000));
    assert_eq!(outcome, Outcome::Gated);
    assert!(scheduler.vcs().commits.is_empty());
}

#[test]
fn selection_restricts_staging_and_message() {
    // End-to-end scenario: ChangeSet = {Added a.txt, Modified b.txt}, user
    // deselects b.txt.
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("a.txt"), "a\n").expect("write");
    fs::write(dir.path().join("b.txt"), "b\n").expect("write");
    let mut vcs = MockVcs::new(dir.path());
    vcs.set_status("a.txt", FileStatus::Added);
    vcs.set_status("b.txt", FileStatus::Modified);

    let mut scheduler = scheduler(vcs, CommitTrigger::Manual, CommitInterval::FiveMinutes);
    let selection = vec!["a.txt".to_owned()];
    let outcome = scheduler.commit_selected(Some(&selection), None, t(50));
    assert!(matches!(outcome, Outcome::Committed { staged: 1, .. }));

    let commit = &scheduler.vcs().commits[0];
    assert_eq!(commit.staged, vec!["a.txt"]);
    assert!(commit.message.contains("Added file 'a.txt'"));
    assert!(!commit.message.contains("b.txt"));
}

#[test]
fn manual_message_becomes_the_subject() {
    let (_dir, vcs) = dirty_fixture();
    let mut scheduler = scheduler(vcs, CommitTrigger::Manual, CommitInterval::FiveMinutes);

    let outcome = scheduler.commit_selected(None, Some("tweak sprites"), t(50));
    assert!(matches!(outcome, Outcome::Committed { .. }));
    let commit = &scheduler.vcs().commits[0];
    assert!(commit.message.starts_with("tweak sprites\n\n"));
    assert!(commit.message.contains("Added file 'a.txt'"));
}

#[test]
fn empty_author_reports_an_error_and_commits_nothing() {
    // End-to-end scenario: Author.name empty → reported error, no commit,
    // scheduler back to idle.
    let (_dir, vcs) = dirty_fixture();
    let mut scheduler = scheduler(vcs, CommitTrigger::Manual, CommitInterval::FiveMinutes);
    scheduler.set_author(Identity::new(String::new(), "jane@example.com".into()));

    let outcome = scheduler.on_trigger(Trigger::ManualRequest, t(10));
    assert_eq!(outcome, Outcome::Failed);
    assert!(scheduler.vcs().commits.is_empty());
    assert!(!scheduler.phase().is_committing());

    // A corrected identity recovers on the next trigger.
    scheduler.set_author(test_author());
    let outcome = scheduler.on_trigger(Trigger::ManualRequest, t(20));
    assert!(matches!(outcome, Outcome::Committed { .. }));
}

#[test]
fn staging_failures_are_per_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("good.txt"), "g\n").expect("write");
    fs::write(dir.path().join("bad.txt"), "b\n").expect("write");
    let mut vcs = MockVcs::new(dir.path());
    vcs.set_status("good.txt", FileStatus::Added);
    vcs.set_status("bad.txt", FileStatus::Added);
    vcs.fail_stage.insert("bad.txt".to_owned());

    let mut scheduler = scheduler(vcs, CommitTrigger::Manual, CommitInterval::FiveMinutes);
    let outcome = scheduler.on_trigger(Trigger::ManualRequest, t(5));

    // The commit proceeds with whatever staged successfully.
    assert!(matches!(outcome, Outcome::Committed { staged: 1, .. }));
    assert_eq!(scheduler.vcs().commits[0].staged, vec!["good.txt"]);
}

#[test]
fn commit_failure_returns_to_idle_and_does_not_block_later_triggers() {
    let (_dir, mut vcs) = dirty_fixture();
    vcs.fail_commit = true;
    let mut scheduler = scheduler(vcs, CommitTrigger::Manual, CommitInterval::FiveMinutes);

    let outcome = scheduler.on_trigger(Trigger::ManualRequest, t(5));
    assert_eq!(outcome, Outcome::Failed);
    assert!(!scheduler.phase().is_committing());

    // The backend recovers; the next trigger commits normally.
    scheduler.vcs_mut().fail_commit = false;
    let outcome = scheduler.on_trigger(Trigger::ManualRequest, t(6));
    assert!(matches!(outcome, Outcome::Committed { .. }));
}

#[test]
fn commit_timestamp_is_the_trigger_timestamp() {
    let (_dir, vcs) = dirty_fixture();
    let mut scheduler = scheduler(vcs, CommitTrigger::Manual, CommitInterval::FiveMinutes);

    scheduler.on_trigger(Trigger::ManualRequest, t(12_345));
    assert_eq!(scheduler.vcs().commits[0].when, t(12_345));
}

proptest! {
    /// Manual requests pass the gate under every policy, whatever the
    /// last-commit and event timestamps.
    #[test]
    fn manual_always_passes_the_gate(
        trigger_idx in 0usize..4,
        interval_idx in 0usize..4,
        last in 0u64..100_000,
        at in 0u64..100_000,
    ) {
        let triggers = [
            CommitTrigger::Manual,
            CommitTrigger::Automatic,
            CommitTrigger::OnExit,
            CommitTrigger::OnReload,
        ];
        let intervals = [
            CommitInterval::FiveMinutes,
            CommitInterval::FifteenMinutes,
            CommitInterval::ThirtyMinutes,
            CommitInterval::OneHour,
        ];
        let policy = CommitPolicy {
            trigger: triggers[trigger_idx],
            interval: intervals[interval_idx],
        };
        let decision = autograph::scheduler::gate(
            &policy,
            t(last),
            Trigger::ManualRequest,
            t(at),
        );
        prop_assert_eq!(decision, autograph::scheduler::GateDecision::Commit);
    }
}
