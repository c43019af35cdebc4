//! issuesync CLI - keep Linear issue assignees and priorities in line with GitHub.

mod commands;
mod config;
mod progress;
mod shutdown;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use console::Term;
use issuesync::TrackedField;
use tracing_subscriber::EnvFilter;

use crate::commands::shared::OutputFormat;

#[derive(Parser)]
#[command(name = "issuesync")]
#[command(version)]
#[command(about = "One-way GitHub to Linear issue metadata sync")]
#[command(
    long_about = "issuesync finds the Linear issues that mirror open GitHub issues (via the \
owner/repo/issues/N link in the Linear description) and corrects their assignee or \
priority to match GitHub. It never writes to GitHub and never creates Linear issues."
)]
#[command(after_long_help = r#"EXAMPLES
    Copy GitHub assignees to Linear:
        $ issuesync assignees

    Preview priority changes without applying them:
        $ issuesync priorities --dry-run

    Use a different repository and team than configured:
        $ issuesync assignees --repo acme/widgets --team ENG

    Only treat labels starting with "priority" as priorities:
        $ issuesync priorities --label-prefix priority

    Generate shell completions:
        $ issuesync completions bash > ~/.local/share/bash-completion/completions/issuesync

CONFIGURATION
    issuesync reads configuration from:
      1. ~/.config/issuesync/config.toml (or $XDG_CONFIG_HOME/issuesync/config.toml)
      2. ./issuesync.toml
      3. Environment variables (ISSUESYNC_* prefix, sections split by "__")
      4. .env file in current directory

ENVIRONMENT VARIABLES
    ISSUESYNC_GITHUB__TOKEN      GitHub token (GITHUB_TOKEN also accepted)
    ISSUESYNC_GITHUB__OWNER      Repository owner
    ISSUESYNC_GITHUB__REPO       Repository name
    ISSUESYNC_LINEAR__API_KEY    Linear API key (LINEAR_API_KEY also accepted)
    ISSUESYNC_LINEAR__TEAM       Linear team id, key or name
    RUST_LOG                     Log filter when output is not a terminal

EXIT STATUS
    0 when the run completes, even if some updates failed; 1 on configuration
    or lookup errors; 130 when interrupted.
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set Linear assignees from GitHub assignees
    Assignees {
        #[command(flatten)]
        sync_opts: CommonSyncOptions,
    },
    /// Set Linear priorities from GitHub priority labels
    Priorities {
        /// Only labels starting with this prefix count as priority labels
        #[arg(short = 'p', long)]
        label_prefix: Option<String>,

        #[command(flatten)]
        sync_opts: CommonSyncOptions,
    },
    /// Show current GitHub rate limit status
    Limits {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// List Linear teams
    Teams {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
    /// Generate man page(s)
    Man {
        /// Output directory for man pages (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Options shared by the sync commands.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct CommonSyncOptions {
    /// Dry run - show what would be changed without updating Linear
    #[arg(short = 'n', long)]
    pub(crate) dry_run: bool,

    /// Linear team id, key or name (overrides config)
    #[arg(short, long)]
    pub(crate) team: Option<String>,

    /// GitHub repository as owner/name (overrides config)
    #[arg(short, long)]
    pub(crate) repo: Option<String>,

    /// Disable proactive rate limiting (may cause API throttling)
    #[arg(short = 'R', long)]
    pub(crate) no_rate_limit: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if Term::stderr().is_term() {
                eprintln!("Error: {e}");
            } else {
                tracing::error!("{e}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    shutdown::setup_shutdown_handler();

    // Structured logging only when not connected to a TTY
    if !Term::stdout().is_term() {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("issuesync=info,issuesync_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Completions { shell } => commands::meta::handle_completions(shell),
        Commands::Man { output } => commands::meta::handle_man(output),
        Commands::Assignees { sync_opts } => {
            let config = config::Config::load()?;
            commands::sync::handle_sync(TrackedField::Assignee, sync_opts, None, &config).await
        }
        Commands::Priorities {
            label_prefix,
            sync_opts,
        } => {
            let config = config::Config::load()?;
            commands::sync::handle_sync(TrackedField::Priority, sync_opts, label_prefix, &config)
                .await
        }
        Commands::Limits { output } => {
            let config = config::Config::load()?;
            commands::limits::handle_limits(output, &config).await
        }
        Commands::Teams { output } => {
            let config = config::Config::load()?;
            commands::teams::handle_teams(output, &config).await
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_assignees_with_overrides() {
        let cli = Cli::try_parse_from([
            "issuesync",
            "assignees",
            "--dry-run",
            "--team",
            "ENG",
            "--repo",
            "acme/widgets",
        ])
        .unwrap();
        match cli.command {
            Commands::Assignees { sync_opts } => {
                assert!(sync_opts.dry_run);
                assert_eq!(sync_opts.team.as_deref(), Some("ENG"));
                assert_eq!(sync_opts.repo.as_deref(), Some("acme/widgets"));
                assert!(!sync_opts.no_rate_limit);
            }
            _ => panic!("expected assignees"),
        }
    }

    #[test]
    fn parses_priorities_with_label_prefix() {
        let cli = Cli::try_parse_from(["issuesync", "priorities", "-p", "priority", "-n"]).unwrap();
        match cli.command {
            Commands::Priorities {
                label_prefix,
                sync_opts,
            } => {
                assert_eq!(label_prefix.as_deref(), Some("priority"));
                assert!(sync_opts.dry_run);
            }
            _ => panic!("expected priorities"),
        }
    }

    #[test]
    fn parses_output_format() {
        let cli = Cli::try_parse_from(["issuesync", "teams", "--output", "json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Teams {
                output: OutputFormat::Json
            }
        ));
    }

    #[test]
    fn rejects_label_prefix_on_assignees() {
        assert!(Cli::try_parse_from(["issuesync", "assignees", "--label-prefix", "p"]).is_err());
    }
}
