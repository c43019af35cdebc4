//! Source issue collection.

use std::collections::HashSet;

use crate::platform::{RemoteIssue, SourceApi, short_error_message};

use super::progress::{ProgressCallback, SyncProgress, emit};
use super::translate::priority_from_label;
use super::types::{DEFAULT_QUOTA_LOW_WATER, SourceIssue, TrackedField};

/// Whether a label names a priority.
///
/// With a prefix, the lower-cased label must start with it. Without one, a
/// label qualifies when it starts with `p` and a digit or mentions
/// "priority".
pub fn is_priority_label(label: &str, prefix: Option<&str>) -> bool {
    let lower = label.trim().to_lowercase();
    match prefix.map(str::trim).filter(|p| !p.is_empty()) {
        Some(prefix) => lower.starts_with(&prefix.to_lowercase()),
        None => {
            let mut chars = lower.chars();
            let p_digit = chars.next() == Some('p') && chars.next().is_some_and(|c| c.is_ascii_digit());
            p_digit || lower.contains("priority")
        }
    }
}

/// The tracked field's raw value on a remote issue, if it has one.
///
/// In priority mode the first label that names a concrete level wins over
/// generic ones like `needs-priority`, which only count when nothing better
/// is present.
pub fn field_value(issue: &RemoteIssue, field: TrackedField, prefix: Option<&str>) -> Option<String> {
    match field {
        TrackedField::Assignee => issue.assignees.first().cloned(),
        TrackedField::Priority => {
            let mut candidates = issue
                .labels
                .iter()
                .filter(|label| is_priority_label(label, prefix));
            let first = candidates.clone().next();
            candidates
                .find(|label| priority_from_label(Some(label.as_str())) != 0)
                .or(first)
                .cloned()
        }
    }
}

/// What a collection pass produced.
#[derive(Debug, Default)]
pub struct Collection {
    pub issues: Vec<SourceIssue>,
    /// Pages requested.
    pub pages: u32,
    /// Stopped on the quota low-water mark.
    pub early_exit: bool,
    /// A transport or API error ended collection; `issues` is empty.
    pub failed: bool,
    pub pull_requests_skipped: usize,
    /// Issues without the tracked field.
    pub missing_field: usize,
    /// Issues seen on more than one page.
    pub duplicates: usize,
}

/// Collects open issues carrying the tracked field.
pub struct SourceCollector<'a, S: SourceApi + ?Sized> {
    source: &'a S,
    field: TrackedField,
    label_prefix: Option<String>,
    low_water: usize,
}

impl<'a, S: SourceApi + ?Sized> SourceCollector<'a, S> {
    pub fn new(source: &'a S, field: TrackedField) -> Self {
        Self {
            source,
            field,
            label_prefix: None,
            low_water: DEFAULT_QUOTA_LOW_WATER,
        }
    }

    #[must_use]
    pub fn with_label_prefix(mut self, prefix: Option<String>) -> Self {
        self.label_prefix = prefix;
        self
    }

    #[must_use]
    pub fn with_low_water(mut self, low_water: usize) -> Self {
        self.low_water = low_water;
        self
    }

    /// Collect every open issue with the tracked field.
    pub async fn collect(&self) -> Vec<SourceIssue> {
        self.collect_with_progress(None).await.issues
    }

    /// Collect page by page, stopping at the last page or when the remaining
    /// quota drops below the low-water mark.
    ///
    /// Errors are never propagated: a failed page yields an empty result.
    pub async fn collect_with_progress(&self, on_progress: Option<&ProgressCallback>) -> Collection {
        let mut collection = Collection::default();
        let mut seen = HashSet::new();
        let mut page = 1u32;

        loop {
            collection.pages = page;
            let result = match self.source.list_open_issues(page).await {
                Ok(result) => result,
                Err(e) => {
                    if e.is_rate_limited() {
                        tracing::warn!(page, error = %e, "Source quota exhausted, nothing to sync");
                    } else {
                        tracing::warn!(page, error = %e, "Collection failed, nothing to sync");
                    }
                    emit(
                        on_progress,
                        SyncProgress::CollectionFailed {
                            error: short_error_message(&e),
                        },
                    );
                    return Collection {
                        issues: Vec::new(),
                        failed: true,
                        ..collection
                    };
                }
            };

            if result.items.is_empty() {
                break;
            }

            let mut count = 0;
            for item in result.items {
                if item.is_pull_request {
                    collection.pull_requests_skipped += 1;
                    continue;
                }
                // Pages can overlap after a strategy switch
                if !seen.insert(item.number) {
                    collection.duplicates += 1;
                    continue;
                }
                let Some(value) = field_value(&item, self.field, self.label_prefix.as_deref()) else {
                    collection.missing_field += 1;
                    continue;
                };
                count += 1;
                collection.issues.push(SourceIssue {
                    number: item.number,
                    title: item.title,
                    raw_field_value: Some(value),
                    url: item.url,
                });
            }

            emit(
                on_progress,
                SyncProgress::FetchedPage {
                    page,
                    count,
                    total_so_far: collection.issues.len(),
                },
            );

            if !result.has_more {
                break;
            }

            if let Some(remaining) = self.source.quota_remaining()
                && remaining < self.low_water
            {
                tracing::warn!(
                    remaining,
                    low_water = self.low_water,
                    collected = collection.issues.len(),
                    "Source quota low, stopping collection early"
                );
                emit(
                    on_progress,
                    SyncProgress::QuotaLow {
                        remaining,
                        low_water: self.low_water,
                    },
                );
                collection.early_exit = true;
                break;
            }

            page += 1;
        }

        tracing::debug!(
            collected = collection.issues.len(),
            pages = collection.pages,
            pull_requests = collection.pull_requests_skipped,
            missing_field = collection.missing_field,
            "Collection complete"
        );
        collection
    }
}
