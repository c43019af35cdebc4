use issuesync::sync::SyncProgress;

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, event: SyncProgress) {
        match event {
            SyncProgress::TeamResolved { key, name } => {
                tracing::info!(team = %key, name = %name, "Resolved team");
            }

            SyncProgress::CollectingIssues { repo, field } => {
                tracing::info!(repo = %repo, field = %field, "Collecting open issues");
            }

            SyncProgress::FetchedPage {
                page,
                count,
                total_so_far,
            } => {
                tracing::debug!(page, count, total_so_far, "Fetched page");
            }

            SyncProgress::QuotaLow {
                remaining,
                low_water,
            } => {
                tracing::warn!(remaining, low_water, "Quota low, stopping collection early");
            }

            SyncProgress::CollectionFailed { error } => {
                tracing::error!(error = %error, "Collection failed");
            }

            SyncProgress::CollectionComplete { total, early_exit } => {
                tracing::info!(total, early_exit, "Collection complete");
            }

            SyncProgress::MatchingIssues { count } => {
                tracing::info!(count, "Matching issues");
            }

            SyncProgress::Matched {
                number,
                identifiers,
            } => {
                tracing::debug!(number, issues = %identifiers.join(", "), "Matched");
            }

            SyncProgress::Unmatched { number, title } => {
                tracing::debug!(number, title = %title, "No matching issue");
            }

            SyncProgress::MatchError { number, error } => {
                tracing::warn!(number, error = %error, "Match query failed");
            }

            SyncProgress::MatchingComplete { pairs, unmatched } => {
                tracing::info!(pairs, unmatched, "Matching complete");
            }

            SyncProgress::ActorUnresolved { handle } => {
                tracing::warn!(handle = %handle, "No Linear user for GitHub login");
            }

            SyncProgress::PlanReady { count, dry_run } => {
                tracing::info!(count, dry_run, "Planned updates");
            }

            SyncProgress::UpdateApplied {
                identifier,
                field,
                old,
                new,
                dry_run,
            } => {
                if dry_run {
                    tracing::debug!(issue = %identifier, field = %field, old = %old, new = %new, "Would update");
                } else {
                    tracing::debug!(issue = %identifier, field = %field, old = %old, new = %new, "Updated");
                }
            }

            SyncProgress::UpdateFailed {
                identifier,
                field,
                error,
            } => {
                tracing::debug!(issue = %identifier, field = %field, error = %error, "Update failed");
            }

            SyncProgress::SyncComplete {
                updated,
                failed,
                skipped,
            } => {
                tracing::info!(updated, failed, skipped, "Sync complete");
            }

            SyncProgress::Warning { message } => {
                tracing::warn!(message = %message, "Warning");
            }

            _ => {}
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}
