//! Diff matched pairs into update intents.

use crate::platform::DestinationIssue;

use super::translate::TargetValue;
use super::types::{BackReference, FieldChange, UpdateIntent};

/// One (source, destination) pair with the translated source value.
#[derive(Debug, Clone)]
pub struct MatchedPair<'a> {
    pub reference: &'a BackReference,
    pub destination: &'a DestinationIssue,
    pub target: TargetValue,
}

/// The change a pair needs, if any.
fn diff(destination: &DestinationIssue, target: &TargetValue) -> Option<FieldChange> {
    match target {
        TargetValue::Priority(new) if *new != destination.priority => Some(FieldChange::Priority {
            old: destination.priority,
            new: *new,
        }),
        TargetValue::Assignee(Some(new)) if destination.assignee_id.as_deref() != Some(new) => {
            Some(FieldChange::Assignee {
                old: destination.assignee_id.clone(),
                new: new.clone(),
            })
        }
        _ => None,
    }
}

/// Produce an intent for every pair whose destination value differs.
///
/// Intents come out in pair order. An unresolved assignee plans nothing.
pub fn plan(pairs: &[MatchedPair<'_>]) -> Vec<UpdateIntent> {
    pairs
        .iter()
        .filter_map(|pair| {
            diff(pair.destination, &pair.target).map(|change| UpdateIntent {
                issue_id: pair.destination.id.clone(),
                issue_identifier: pair.destination.identifier.clone(),
                source: pair.reference.clone(),
                change,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::RepoCoordinates;

    fn dest(id: &str, assignee: Option<&str>, priority: i32) -> DestinationIssue {
        DestinationIssue {
            id: id.to_string(),
            identifier: format!("ENG-{id}"),
            title: "Fix login bug".to_string(),
            description: "owner/repo/issues/42".to_string(),
            assignee_id: assignee.map(str::to_string),
            priority,
        }
    }

    fn reference() -> BackReference {
        BackReference::new(RepoCoordinates::new("owner", "repo"), 42)
    }

    /// Apply intents the way the destination would.
    fn apply(issues: &mut [DestinationIssue], intents: &[UpdateIntent]) {
        for intent in intents {
            let issue = issues.iter_mut().find(|i| i.id == intent.issue_id).unwrap();
            match &intent.change {
                FieldChange::Priority { new, .. } => issue.priority = *new,
                FieldChange::Assignee { new, .. } => issue.assignee_id = Some(new.clone()),
            }
        }
    }

    #[test]
    fn test_plan_emits_only_on_inequality() {
        let r = reference();
        let same = dest("1", None, 2);
        let differs = dest("2", None, 3);
        let pairs = vec![
            MatchedPair {
                reference: &r,
                destination: &same,
                target: TargetValue::Priority(2),
            },
            MatchedPair {
                reference: &r,
                destination: &differs,
                target: TargetValue::Priority(2),
            },
        ];

        let intents = plan(&pairs);
        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].issue_id, "2");
        assert_eq!(intents[0].change, FieldChange::Priority { old: 3, new: 2 });
        assert_eq!(intents[0].source.token(), "owner/repo/issues/42");
    }

    #[test]
    fn test_plan_priority_to_zero() {
        let r = reference();
        let issue = dest("1", None, 2);
        let intents = plan(&[MatchedPair {
            reference: &r,
            destination: &issue,
            target: TargetValue::Priority(0),
        }]);
        assert_eq!(intents[0].change, FieldChange::Priority { old: 2, new: 0 });
    }

    #[test]
    fn test_plan_assignee() {
        let r = reference();
        let unassigned = dest("1", None, 0);
        let correct = dest("2", Some("U1"), 0);
        let wrong = dest("3", Some("U9"), 0);
        let unresolved = dest("4", Some("U9"), 0);
        let pairs = vec![
            MatchedPair {
                reference: &r,
                destination: &unassigned,
                target: TargetValue::Assignee(Some("U1".to_string())),
            },
            MatchedPair {
                reference: &r,
                destination: &correct,
                target: TargetValue::Assignee(Some("U1".to_string())),
            },
            MatchedPair {
                reference: &r,
                destination: &wrong,
                target: TargetValue::Assignee(Some("U1".to_string())),
            },
            MatchedPair {
                reference: &r,
                destination: &unresolved,
                target: TargetValue::Assignee(None),
            },
        ];

        let intents = plan(&pairs);
        let ids: Vec<&str> = intents.iter().map(|i| i.issue_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert_eq!(
            intents[1].change,
            FieldChange::Assignee {
                old: Some("U9".to_string()),
                new: "U1".to_string()
            }
        );
    }

    #[test]
    fn test_plan_is_idempotent() {
        let r = reference();
        let mut issues = vec![dest("1", None, 0), dest("2", Some("U2"), 3)];

        let targets = [TargetValue::Priority(1), TargetValue::Priority(1)];
        let first = {
            let pairs: Vec<MatchedPair<'_>> = issues
                .iter()
                .zip(targets.iter())
                .map(|(d, t)| MatchedPair {
                    reference: &r,
                    destination: d,
                    target: t.clone(),
                })
                .collect();
            plan(&pairs)
        };
        assert_eq!(first.len(), 2);

        apply(&mut issues, &first);

        let pairs: Vec<MatchedPair<'_>> = issues
            .iter()
            .zip(targets.iter())
            .map(|(d, t)| MatchedPair {
                reference: &r,
                destination: d,
                target: t.clone(),
            })
            .collect();
        assert!(plan(&pairs).is_empty());
    }
}
