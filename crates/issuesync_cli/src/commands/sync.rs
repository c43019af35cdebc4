//! The `assignees` and `priorities` commands.
//!
//! Both run the same pipeline against a different tracked field: collect open
//! GitHub issues, match them to Linear issues by back-reference, then update
//! whatever differs.

use std::sync::Arc;

use console::{Term, style};
use issuesync::github::{GitHubGraphQlSource, GitHubIssueScanSource};
use issuesync::platform::FallbackSource;
use issuesync::sync::{SyncEngine, SyncOptions, SyncReport, TrackedField, UpdateIntent};

use crate::CommonSyncOptions;
use crate::commands::shared::{
    OutputFormat, display_final_rate_limit, github_client, linear_client, print_rows,
};
use crate::config::{Config, ResolvedConfig};
use crate::progress::ProgressReporter;

/// Handle `assignees` and `priorities`.
pub(crate) async fn handle_sync(
    field: TrackedField,
    sync_opts: CommonSyncOptions,
    label_prefix: Option<String>,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let resolved = config.validate(sync_opts.repo.as_deref(), sync_opts.team.as_deref())?;
    let options = build_options(field, &sync_opts, label_prefix, config, &resolved);

    let github = github_client(
        config,
        Some(&resolved.github_token),
        sync_opts.no_rate_limit,
    )?;
    let linear = linear_client(
        config,
        Some(&resolved.linear_api_key),
        sync_opts.no_rate_limit,
    )?;
    let source = FallbackSource::new(
        GitHubGraphQlSource::new(github.clone(), resolved.repo.clone()),
        GitHubIssueScanSource::new(github.clone(), resolved.repo.clone()),
    );

    let is_tty = Term::stdout().is_term();
    if !is_tty {
        tracing::info!(
            repo = %options.repo,
            team = %options.team,
            field = %field,
            dry_run = options.dry_run,
            "Starting sync"
        );
    }

    let reporter = Arc::new(ProgressReporter::new());
    let callback = reporter.as_callback();
    let result = SyncEngine::new(&source, &linear, &options)
        .with_progress(Some(&*callback))
        .run()
        .await;
    reporter.finish();
    let report = result?;

    if is_tty {
        print_report(&report)?;
    }
    display_final_rate_limit(&github, is_tty);

    Ok(())
}

fn build_options(
    field: TrackedField,
    sync_opts: &CommonSyncOptions,
    label_prefix: Option<String>,
    config: &Config,
    resolved: &ResolvedConfig,
) -> SyncOptions {
    let mut options = SyncOptions::new(resolved.repo.clone(), resolved.team.clone(), field);
    options.dry_run = sync_opts.dry_run || config.sync.dry_run;
    options.quota_low_water = config.sync.quota_low_water;
    options.overrides = config.overrides();
    if field == TrackedField::Priority {
        options.priority_label_prefix =
            label_prefix.or_else(|| config.sync.priority_label_prefix.clone());
    }
    options
}

#[derive(Debug, serde::Serialize, tabled::Tabled)]
struct IntentRow {
    #[tabled(rename = "Issue")]
    issue: String,
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "From")]
    old: String,
    #[tabled(rename = "To")]
    new: String,
    #[tabled(rename = "GitHub")]
    source: String,
}

impl From<&UpdateIntent> for IntentRow {
    fn from(intent: &UpdateIntent) -> Self {
        Self {
            issue: intent.issue_identifier.clone(),
            field: intent.change.field().to_string(),
            old: intent.change.old_value(),
            new: intent.change.new_value(),
            source: intent.source.to_string(),
        }
    }
}

#[derive(Debug, serde::Serialize, tabled::Tabled)]
struct SummaryRow {
    #[tabled(rename = "Stage")]
    stage: &'static str,
    #[tabled(rename = "Count")]
    count: usize,
}

fn summary_rows(report: &SyncReport) -> Vec<SummaryRow> {
    let mut rows = vec![
        SummaryRow {
            stage: "Collected",
            count: report.collected,
        },
        SummaryRow {
            stage: "Matched",
            count: report.matched,
        },
        SummaryRow {
            stage: "Unmatched",
            count: report.unmatched,
        },
        SummaryRow {
            stage: "Already in sync",
            count: report.skipped,
        },
    ];
    if report.dry_run {
        rows.push(SummaryRow {
            stage: "Would update",
            count: report.planned,
        });
    } else {
        rows.push(SummaryRow {
            stage: "Updated",
            count: report.updated,
        });
        rows.push(SummaryRow {
            stage: "Failed",
            count: report.failed,
        });
    }
    rows
}

fn print_report(report: &SyncReport) -> Result<(), Box<dyn std::error::Error>> {
    println!();
    if report.dry_run && !report.intents.is_empty() {
        println!("{}", style("Planned updates (dry run)").bold());
        let rows: Vec<IntentRow> = report.intents.iter().map(IntentRow::from).collect();
        print_rows(&rows, OutputFormat::Table)?;
        println!();
    }

    if !report.failures.is_empty() {
        println!("{}", style("Failed updates").red().bold());
        for failure in &report.failures {
            println!(
                "  {} {}: {}",
                failure.intent.issue_identifier,
                failure.intent.change.field(),
                failure.error
            );
        }
        println!();
    }

    print_rows(&summary_rows(report), OutputFormat::Table)?;

    if report.early_exit {
        println!(
            "\n{} Collection stopped early on low GitHub quota; rerun later for the rest.",
            style("!").yellow()
        );
    }
    Ok(())
}
