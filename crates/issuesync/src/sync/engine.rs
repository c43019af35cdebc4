//! Run orchestration.
//!
//! Stages run strictly in sequence: team lookup, collection, matching,
//! translation and planning, then execution. All updates are planned
//! before the first one is sent.

use thiserror::Error;

use crate::platform::{DestinationApi, PlatformError, SourceApi, Team};

use super::collector::SourceCollector;
use super::executor::UpdateExecutor;
use super::identity::{ActorDirectory, IdentityResolver, ResolutionCache};
use super::matcher::{CrossReferenceMatcher, MatchCache};
use super::planner::{MatchedPair, plan};
use super::progress::{ProgressCallback, SyncProgress, emit};
use super::translate::{TargetValue, translate};
use super::types::{SyncOptions, SyncReport, TrackedField};

/// Errors that end a run before any update is planned.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No destination team matches the configured identifier.
    #[error("Team not found: {0}")]
    TeamNotFound(String),

    /// The destination could not list teams.
    #[error("Destination error: {0}")]
    Destination(#[from] PlatformError),
}

/// Find a team by id, key or name.
pub fn find_team<'t>(teams: &'t [Team], identifier: &str) -> Option<&'t Team> {
    teams.iter().find(|team| team.is_identified_by(identifier))
}

/// One-way reconciliation of a tracked field.
pub struct SyncEngine<'a, S: SourceApi + ?Sized, D: DestinationApi + ?Sized> {
    source: &'a S,
    destination: &'a D,
    options: &'a SyncOptions,
    on_progress: Option<&'a ProgressCallback>,
}

impl<'a, S, D> SyncEngine<'a, S, D>
where
    S: SourceApi + ?Sized,
    D: DestinationApi + ?Sized,
{
    pub fn new(source: &'a S, destination: &'a D, options: &'a SyncOptions) -> Self {
        Self {
            source,
            destination,
            options,
            on_progress: None,
        }
    }

    #[must_use]
    pub fn with_progress(mut self, on_progress: Option<&'a ProgressCallback>) -> Self {
        self.on_progress = on_progress;
        self
    }

    /// Run with fresh caches.
    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        self.run_with_caches(ResolutionCache::new(), MatchCache::new())
            .await
    }

    /// Run with caller-supplied caches.
    pub async fn run_with_caches(
        &self,
        resolution_cache: ResolutionCache,
        match_cache: MatchCache,
    ) -> Result<SyncReport, SyncError> {
        let options = self.options;
        let on_progress = self.on_progress;

        let teams = self.destination.list_teams().await?;
        let team = find_team(&teams, &options.team)
            .ok_or_else(|| SyncError::TeamNotFound(options.team.clone()))?;
        tracing::debug!(team = %team.key, id = %team.id, "Resolved team");
        emit(
            on_progress,
            SyncProgress::TeamResolved {
                key: team.key.clone(),
                name: team.name.clone(),
            },
        );

        let mut report = SyncReport {
            dry_run: options.dry_run,
            ..SyncReport::default()
        };

        emit(
            on_progress,
            SyncProgress::CollectingIssues {
                repo: options.repo.full_name(),
                field: options.field,
            },
        );
        let collection = SourceCollector::new(self.source, options.field)
            .with_label_prefix(options.priority_label_prefix.clone())
            .with_low_water(options.quota_low_water)
            .collect_with_progress(on_progress)
            .await;
        report.collected = collection.issues.len();
        report.early_exit = collection.early_exit;
        emit(
            on_progress,
            SyncProgress::CollectionComplete {
                total: report.collected,
                early_exit: report.early_exit,
            },
        );

        let mut matcher = CrossReferenceMatcher::new(options.repo.clone(), &team.id, match_cache);
        let matches = matcher
            .match_issues(self.destination, &collection.issues, on_progress)
            .await;
        report.matched = matches.pair_count();
        report.unmatched = matches.unmatched.len() + matches.failed.len();

        let directory = match options.field {
            TrackedField::Assignee if !matches.matched.is_empty() => {
                match self.destination.list_actors().await {
                    Ok(actors) => ActorDirectory::new(actors),
                    Err(e) => {
                        tracing::warn!(error = %e, "Could not list destination users");
                        emit(
                            on_progress,
                            SyncProgress::Warning {
                                message: format!("Could not list destination users: {e}"),
                            },
                        );
                        ActorDirectory::default()
                    }
                }
            }
            _ => ActorDirectory::default(),
        };

        let mut resolver = IdentityResolver::new(&options.overrides, resolution_cache);
        let mut pairs = Vec::with_capacity(report.matched);
        for issue_match in &matches.matched {
            let target = translate(
                options.field,
                &issue_match.source,
                &mut resolver,
                self.source,
                &directory,
            )
            .await;
            if target == TargetValue::Assignee(None)
                && let Some(handle) = &issue_match.source.raw_field_value
            {
                emit(
                    on_progress,
                    SyncProgress::ActorUnresolved {
                        handle: handle.clone(),
                    },
                );
            }
            for destination in &issue_match.destinations {
                pairs.push(MatchedPair {
                    reference: &issue_match.reference,
                    destination,
                    target: target.clone(),
                });
            }
        }

        let intents = plan(&pairs);
        report.planned = intents.len();
        report.skipped = pairs.len() - intents.len();
        emit(
            on_progress,
            SyncProgress::PlanReady {
                count: intents.len(),
                dry_run: options.dry_run,
            },
        );

        if options.dry_run {
            for intent in &intents {
                tracing::info!(
                    issue = %intent.issue_identifier,
                    field = %intent.change.field(),
                    old = %intent.change.old_value(),
                    new = %intent.change.new_value(),
                    source = %intent.source,
                    "Would update"
                );
                emit(
                    on_progress,
                    SyncProgress::UpdateApplied {
                        identifier: intent.issue_identifier.clone(),
                        field: intent.change.field(),
                        old: intent.change.old_value(),
                        new: intent.change.new_value(),
                        dry_run: true,
                    },
                );
            }
        } else {
            let execution = UpdateExecutor::new(self.destination)
                .execute(&intents, on_progress)
                .await;
            report.updated = execution.applied;
            report.failed = execution.failed;
            report.failures = execution.failures;
        }
        report.intents = intents;

        emit(
            on_progress,
            SyncProgress::SyncComplete {
                updated: report.updated,
                failed: report.failed,
                skipped: report.skipped,
            },
        );
        Ok(report)
    }
}
