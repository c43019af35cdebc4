//! Apply update intents to the destination.

use serde::Serialize;

use crate::platform::{DestinationApi, short_error_message};

use super::progress::{ProgressCallback, SyncProgress, emit};
use super::types::{UpdateFailure, UpdateIntent};

/// Per-item outcome of an execution pass.
#[derive(Debug, Default, Serialize)]
pub struct ExecutionReport {
    pub applied: usize,
    pub failed: usize,
    pub failures: Vec<UpdateFailure>,
}

/// Applies intents one at a time, at most once each.
pub struct UpdateExecutor<'a, D: DestinationApi + ?Sized> {
    destination: &'a D,
}

impl<'a, D: DestinationApi + ?Sized> UpdateExecutor<'a, D> {
    pub fn new(destination: &'a D) -> Self {
        Self { destination }
    }

    /// Apply every intent. A failure is recorded and the batch continues.
    pub async fn execute(
        &self,
        intents: &[UpdateIntent],
        on_progress: Option<&ProgressCallback>,
    ) -> ExecutionReport {
        let mut report = ExecutionReport::default();

        for intent in intents {
            let field = intent.change.field();
            match self
                .destination
                .update_issue(&intent.issue_id, &intent.change.to_update())
                .await
            {
                Ok(()) => {
                    report.applied += 1;
                    tracing::info!(
                        issue = %intent.issue_identifier,
                        field = %field,
                        old = %intent.change.old_value(),
                        new = %intent.change.new_value(),
                        source = %intent.source,
                        "Updated"
                    );
                    emit(
                        on_progress,
                        SyncProgress::UpdateApplied {
                            identifier: intent.issue_identifier.clone(),
                            field,
                            old: intent.change.old_value(),
                            new: intent.change.new_value(),
                            dry_run: false,
                        },
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(
                        issue = %intent.issue_identifier,
                        id = %intent.issue_id,
                        field = %field,
                        old = %intent.change.old_value(),
                        new = %intent.change.new_value(),
                        source = %intent.source,
                        error = %e,
                        "Update failed"
                    );
                    emit(
                        on_progress,
                        SyncProgress::UpdateFailed {
                            identifier: intent.issue_identifier.clone(),
                            field,
                            error: short_error_message(&e),
                        },
                    );
                    report.failures.push(UpdateFailure {
                        intent: intent.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::platform::{
        DestinationActor, DestinationIssue, IssueFilter, IssueUpdate, PlatformError,
        RepoCoordinates, Result, Team,
    };
    use crate::sync::types::{BackReference, FieldChange};

    struct FlakyDestination {
        fail_ids: Vec<String>,
        updates: Mutex<Vec<(String, IssueUpdate)>>,
    }

    #[async_trait]
    impl DestinationApi for FlakyDestination {
        async fn list_teams(&self) -> Result<Vec<Team>> {
            Ok(Vec::new())
        }

        async fn list_actors(&self) -> Result<Vec<DestinationActor>> {
            Ok(Vec::new())
        }

        async fn find_issues(&self, _filter: &IssueFilter) -> Result<Vec<DestinationIssue>> {
            Ok(Vec::new())
        }

        async fn update_issue(&self, id: &str, update: &IssueUpdate) -> Result<()> {
            self.updates
                .lock()
                .unwrap()
                .push((id.to_string(), update.clone()));
            if self.fail_ids.iter().any(|f| f == id) {
                return Err(PlatformError::network("connection reset\n<html>502 Bad Gateway</html>"));
            }
            Ok(())
        }
    }

    fn intent(id: &str, new: i32) -> UpdateIntent {
        UpdateIntent {
            issue_id: id.to_string(),
            issue_identifier: format!("ENG-{id}"),
            source: BackReference::new(RepoCoordinates::new("owner", "repo"), 42),
            change: FieldChange::Priority { old: 0, new },
        }
    }

    #[tokio::test]
    async fn test_executor_isolates_failures() {
        let destination = FlakyDestination {
            fail_ids: vec!["2".to_string()],
            updates: Mutex::new(Vec::new()),
        };
        let intents = vec![intent("1", 1), intent("2", 2), intent("3", 3)];

        let report = UpdateExecutor::new(&destination)
            .execute(&intents, None)
            .await;

        assert_eq!(report.applied, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failures[0].intent.issue_id, "2");
        assert!(report.failures[0].error.contains("connection reset"));

        let attempted: Vec<String> = destination
            .updates
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect();
        assert_eq!(attempted, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_executor_sends_single_field_updates_without_retry() {
        let destination = FlakyDestination {
            fail_ids: vec!["1".to_string()],
            updates: Mutex::new(Vec::new()),
        };

        let report = UpdateExecutor::new(&destination)
            .execute(&[intent("1", 2)], None)
            .await;

        assert_eq!(report.failed, 1);
        let updates = destination.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].1.priority, Some(2));
        assert!(updates[0].1.assignee_id.is_none());
    }

    #[tokio::test]
    async fn test_failure_event_carries_first_line_only() {
        let destination = FlakyDestination {
            fail_ids: vec!["1".to_string()],
            updates: Mutex::new(Vec::new()),
        };
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let callback: ProgressCallback = Box::new(move |event| {
            if let SyncProgress::UpdateFailed { error, .. } = event {
                sink.lock().unwrap().push(error);
            }
        });

        let report = UpdateExecutor::new(&destination)
            .execute(&[intent("1", 2)], Some(&callback))
            .await;

        assert_eq!(
            events.lock().unwrap().as_slice(),
            ["Network error: connection reset"]
        );
        assert!(report.failures[0].error.contains("502 Bad Gateway"));
    }
}
