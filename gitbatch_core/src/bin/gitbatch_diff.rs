use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gitbatch_core::{logging, CancellationToken, DiffConfig, DiffEngine, DiffOutcome, Repository};

/// Print commit and stash diffs the way gitbatch's diff view shows them.
#[derive(Debug, Parser)]
#[command(name = "gitbatch-diff", version)]
struct Cli {
    /// Repository to inspect.
    #[arg(long, default_value = ".")]
    repo: PathBuf,
    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the configured diff strategy (native, legacy).
    #[arg(long)]
    strategy: Option<String>,
    /// Increase log verbosity; repeat for more.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Diff a commit against its predecessor.
    Commit {
        /// Commit hash; defaults to the checked-out commit.
        hash: Option<String>,
    },
    /// Diff a stash against the commit it was taken on.
    Stash {
        /// Stash position, 0 being the most recent.
        id: usize,
    },
    /// List stash entries.
    Stashes,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logger(cli.verbose);

    let engine = DiffEngine::new(load_config(&cli)?);
    let repository = Repository::open(&cli.repo)
        .with_context(|| format!("failed to open repository at {}", cli.repo.display()))?;

    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Command::Commit { hash } => {
            let hash = match hash {
                Some(hash) => hash,
                None => {
                    let state = repository.state().context("repository has no commits")?;
                    tracing::info!(
                        commit = state.commit.short_oid(),
                        branch = state.branch.as_deref(),
                        "diffing checked-out commit"
                    );
                    state.commit.oid.clone()
                }
            };
            let outcome = engine
                .diff(&repository, &hash)
                .with_context(|| format!("failed to diff commit {hash}"))?;
            write_outcome(&mut stdout, &outcome)?;
        }
        Command::Stash { id } => {
            let outcome = engine
                .stash_diff(&repository, id, &CancellationToken::new())
                .with_context(|| format!("failed to diff stash@{{{id}}}"))?;
            write_outcome(&mut stdout, &outcome)?;
        }
        Command::Stashes => {
            for entry in repository.stashes() {
                writeln!(stdout, "{}", entry.display_line())?;
            }
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<DiffConfig> {
    let config = match &cli.config {
        Some(path) => DiffConfig::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => DiffConfig::default(),
    };
    let mut config = config.apply_env()?;
    if let Some(name) = &cli.strategy {
        config.strategy = name.parse()?;
    }
    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}

fn write_outcome(out: &mut impl Write, outcome: &DiffOutcome) -> Result<()> {
    if let Some(completeness) = outcome.is_truncated().then(|| outcome.completeness()) {
        tracing::warn!(?completeness, "diff output is incomplete");
    }
    out.write_all(outcome.text().as_bytes())?;
    if !outcome.text().ends_with('\n') {
        writeln!(out)?;
    }
    Ok(())
}
