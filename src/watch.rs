//! The `autograph watch` loop: the stand-in for an editor host's idle
//! events.
//!
//! Delivers a [`Trigger::IdleTick`] to the session every poll interval and
//! a [`Trigger::Terminating`] on the way out. The gate does the real time
//! arithmetic — the poll just has to fire often enough. Quit with `q`,
//! `Esc`, or Ctrl-C; key presses are polled during the sleep between ticks.

use std::path::Path;
use std::time::{Duration, Instant, SystemTime};

use anyhow::{Context, Result, bail};
use clap::Args;
use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crossterm::terminal;

use autograph::scheduler::Trigger;
use autograph::session::Session;

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Deliver a single idle tick, then terminate
    #[arg(long)]
    pub once: bool,

    /// Seconds between idle ticks
    #[arg(long, default_value_t = 30, value_name = "SECS")]
    pub poll_secs: u64,
}

pub fn run(root: &Path, args: &WatchArgs) -> Result<()> {
    let mut session = Session::bootstrap(root, SystemTime::now());
    if !session.is_enabled() {
        bail!("could not initialize a repository at {}", root.display());
    }
    tracing::info!(
        policy = %session.settings().commit.trigger,
        interval = %session.settings().commit.interval,
        "watch loop started"
    );

    if args.once {
        session.on_trigger(Trigger::IdleTick, SystemTime::now());
        session.on_trigger(Trigger::Terminating, SystemTime::now());
        return Ok(());
    }

    terminal::enable_raw_mode().context("failed to enable raw mode")?;
    let result = watch_loop(&mut session, Duration::from_secs(args.poll_secs.max(1)));
    terminal::disable_raw_mode().ok();

    session.on_trigger(Trigger::Terminating, SystemTime::now());
    tracing::info!("watch loop stopped");
    result
}

fn watch_loop(session: &mut Session<autograph_git::GixVcs>, poll: Duration) -> Result<()> {
    loop {
        session.on_trigger(Trigger::IdleTick, SystemTime::now());

        // Sleep until the next tick, waking early for quit keys.
        let deadline = Instant::now() + poll;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            if event::poll(remaining.min(Duration::from_millis(500)))
                .context("failed to poll terminal events")?
                && let Event::Key(key) = event::read().context("failed to read terminal event")?
            {
                let quit = matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
                    || (key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL));
                if quit {
                    return Ok(());
                }
            }
        }
    }
}
