use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use autograph::classify::{ChangeRecord, Classifier};
use autograph::config::Settings;
use autograph::scheduler::Outcome;
use autograph::session::Session;
use autograph::telemetry;
use autograph_git::{GixVcs, Vcs as _};

mod watch;

/// Keep a project directory under continuous version control
///
/// autograph initializes a git repository in the project directory,
/// generates a .gitignore, classifies changed files, and commits them —
/// on demand, on a schedule, or when the session ends.
///
/// QUICK START:
///
///   autograph init
///
///   # See what changed
///   autograph status
///
///   # Commit everything that changed (or just a selection)
///   autograph commit
///   autograph commit Assets/player.png -m "tweak player sprite"
///
///   # Or let the watch loop commit on the configured interval
///   autograph watch
///
/// The commit policy, author identity and classifier exclusions live in
/// autograph.toml next to the project; every field has a default.
#[derive(Parser)]
#[command(name = "autograph")]
#[command(version, about)]
#[command(propagate_version = true)]
#[command(after_help = "See 'autograph <command> --help' for more information on a specific command.")]
struct Cli {
    /// Project directory (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize autocommit for the project
    ///
    /// Opens or creates the git repository, writes a .gitignore if none
    /// exists, and creates the initial commit on a fresh repository.
    /// Safe to run multiple times.
    Init,

    /// Show the pending change set
    Status(StatusArgs),

    /// Commit changed files now
    ///
    /// Without paths, commits every stageable change. With paths, only the
    /// selection is staged and mentioned in the message.
    Commit(CommitArgs),

    /// Run the autocommit loop
    ///
    /// Delivers idle ticks to the scheduler until interrupted; the
    /// configured policy decides when a tick becomes a commit.
    Watch(watch::WatchArgs),
}

/// Output format for `status`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// Machine-readable JSON.
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

#[derive(Args, Debug)]
struct StatusArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

#[derive(Args, Debug)]
struct CommitArgs {
    /// Restrict the commit to these paths (relative to the project root)
    paths: Vec<String>,

    /// Commit message subject; the generated per-file lines follow it
    #[arg(short, long)]
    message: Option<String>,
}

fn main() -> Result<()> {
    telemetry::init();
    let cli = Cli::parse();

    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().context("failed to resolve the current directory")?,
    };

    match cli.command {
        Commands::Init => run_init(&root),
        Commands::Status(args) => run_status(&root, &args),
        Commands::Commit(args) => run_commit(&root, args),
        Commands::Watch(args) => watch::run(&root, &args),
    }
}

fn run_init(root: &Path) -> Result<()> {
    let session = Session::bootstrap(root, SystemTime::now());
    if !session.is_enabled() {
        bail!("could not initialize a repository at {}", root.display());
    }
    println!("autocommit ready at {}", root.display());
    println!("policy: {} (interval {})", session.settings().commit.trigger, session.settings().commit.interval);
    Ok(())
}

#[derive(Serialize)]
struct StatusEnvelope<'a> {
    changed_files: &'a [ChangeRecord],
    count: usize,
}

fn run_status(root: &Path, args: &StatusArgs) -> Result<()> {
    let vcs = GixVcs::open(root)
        .with_context(|| format!("no repository at {} (run 'autograph init')", root.display()))?;
    let settings = Settings::load(root)?;
    let classifier = Classifier::new(&settings.classify.exclude)?;
    let changes = classifier.classify(vcs.work_dir(), &vcs)?;

    match args.format {
        OutputFormat::Json => {
            let envelope = StatusEnvelope {
                changed_files: changes.records(),
                count: changes.len(),
            };
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }
        OutputFormat::Text => {
            if changes.is_empty() {
                println!("working tree clean");
            } else {
                for record in &changes {
                    println!("{}\t{}", record.kind, record.path);
                }
                println!("{} file(s) changed", changes.len());
            }
        }
    }
    Ok(())
}

fn run_commit(root: &Path, args: CommitArgs) -> Result<()> {
    let mut session = Session::bootstrap(root, SystemTime::now());
    let selection = if args.paths.is_empty() {
        None
    } else {
        Some(args.paths.as_slice())
    };

    let outcome = session.manual_commit(selection, args.message.as_deref(), SystemTime::now());
    match outcome {
        Outcome::Committed { id, staged } => {
            println!("committed {staged} file(s) as {id}");
            Ok(())
        }
        Outcome::NoChanges => {
            println!("nothing to commit");
            Ok(())
        }
        Outcome::Gated | Outcome::Dropped => bail!("commit request was not accepted"),
        Outcome::SettingsFlush => Ok(()),
        Outcome::Failed => bail!("commit failed; see the log above"),
    }
}
