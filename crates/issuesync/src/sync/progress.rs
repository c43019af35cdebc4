//! Progress reporting types for sync runs.
//!
//! Every stage narrates through these events; the CLI turns them into a
//! spinner or log lines. Nothing in the library depends on a consumer
//! being attached.

use super::types::TrackedField;

/// Progress events emitted during a sync run.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum SyncProgress {
    /// The destination team was found.
    TeamResolved {
        /// Team key, e.g. `ENG`.
        key: String,
        /// Team display name.
        name: String,
    },

    /// Starting to collect open issues.
    CollectingIssues {
        /// `owner/repo` of the source repository.
        repo: String,
        /// Field being reconciled.
        field: TrackedField,
    },

    /// Fetched a page of source issues.
    FetchedPage {
        /// Page number (1-indexed).
        page: u32,
        /// Issues on this page that carry the tracked field.
        count: usize,
        /// Running total of collected issues.
        total_so_far: usize,
    },

    /// Remaining quota fell below the low-water mark.
    QuotaLow {
        /// Remaining requests as reported by the source.
        remaining: usize,
        /// Configured low-water mark.
        low_water: usize,
    },

    /// Collection failed; the run continues with nothing collected.
    CollectionFailed {
        /// Error message.
        error: String,
    },

    /// Finished collecting source issues.
    CollectionComplete {
        /// Number of issues collected.
        total: usize,
        /// Whether collection stopped on the quota low-water mark.
        early_exit: bool,
    },

    /// Starting to match source issues to destination issues.
    MatchingIssues {
        /// Number of source issues to match.
        count: usize,
    },

    /// A source issue matched one or more destination issues.
    Matched {
        /// Source issue number.
        number: u64,
        /// Destination identifiers, e.g. `ENG-12`.
        identifiers: Vec<String>,
    },

    /// No destination issue references a source issue.
    Unmatched {
        /// Source issue number.
        number: u64,
        /// Source issue title.
        title: String,
    },

    /// The destination query for a source issue failed.
    MatchError {
        /// Source issue number.
        number: u64,
        /// Error message.
        error: String,
    },

    /// Matching phase complete.
    MatchingComplete {
        /// Matched (source, destination) pairs.
        pairs: usize,
        /// Source issues with no match.
        unmatched: usize,
    },

    /// A source handle did not resolve to a destination actor.
    ActorUnresolved {
        /// Source login.
        handle: String,
    },

    /// Update intents are ready.
    PlanReady {
        /// Number of intents.
        count: usize,
        /// Whether this is a dry run.
        dry_run: bool,
    },

    /// Applied (or, in a dry run, would apply) one update.
    UpdateApplied {
        /// Destination identifier.
        identifier: String,
        /// Field that changed.
        field: TrackedField,
        /// Previous value.
        old: String,
        /// New value.
        new: String,
        /// Whether this is a dry run.
        dry_run: bool,
    },

    /// One update failed.
    UpdateFailed {
        /// Destination identifier.
        identifier: String,
        /// Field that was being changed.
        field: TrackedField,
        /// Error message.
        error: String,
    },

    /// Run complete.
    SyncComplete {
        /// Updates applied.
        updated: usize,
        /// Updates that failed.
        failed: usize,
        /// Matched pairs that needed nothing.
        skipped: usize,
    },

    /// Warning message (non-fatal).
    Warning {
        /// Warning message.
        message: String,
    },
}

/// Callback for progress updates during a sync run.
pub type ProgressCallback = Box<dyn Fn(SyncProgress) + Send + Sync>;

/// Emit a progress event if a callback is provided.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: SyncProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_emit_with_callback() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);

        let callback: ProgressCallback = Box::new(move |_event| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        emit(
            Some(&callback),
            SyncProgress::CollectionComplete {
                total: 10,
                early_exit: false,
            },
        );
        emit(
            Some(&callback),
            SyncProgress::MatchingComplete {
                pairs: 5,
                unmatched: 5,
            },
        );

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_emit_without_callback() {
        emit(
            None,
            SyncProgress::Warning {
                message: "ignored".to_string(),
            },
        );
    }

    #[test]
    fn test_sync_progress_debug() {
        let event = SyncProgress::UpdateFailed {
            identifier: "ENG-12".to_string(),
            field: TrackedField::Priority,
            error: "Network error".to_string(),
        };

        let debug_str = format!("{:?}", event);
        assert!(debug_str.contains("ENG-12"));
        assert!(debug_str.contains("Priority"));
    }
}
