//! Shared sync types and constants.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::platform::{IssueUpdate, RepoCoordinates};

/// Default remaining-quota level below which collection stops early.
pub const DEFAULT_QUOTA_LOW_WATER: usize = 100;

/// Which destination field a run reconciles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackedField {
    Assignee,
    Priority,
}

impl TrackedField {
    pub fn as_str(self) -> &'static str {
        match self {
            TrackedField::Assignee => "assignee",
            TrackedField::Priority => "priority",
        }
    }
}

impl fmt::Display for TrackedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An open source issue carrying the tracked field's raw value.
///
/// `raw_field_value` is the assignee login in assignee mode and the priority
/// label in priority mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceIssue {
    pub number: u64,
    pub title: String,
    pub raw_field_value: Option<String>,
    pub url: String,
}

/// Pointer from a destination issue back to the source issue it mirrors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BackReference {
    pub repo: RepoCoordinates,
    pub number: u64,
}

impl BackReference {
    pub fn new(repo: RepoCoordinates, number: u64) -> Self {
        Self { repo, number }
    }

    /// The join token embedded in destination descriptions.
    pub fn token(&self) -> String {
        format!("{}/{}/issues/{}", self.repo.owner, self.repo.repo, self.number)
    }
}

impl fmt::Display for BackReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.repo, self.number)
    }
}

/// A single-field change with its before and after values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "field", rename_all = "lowercase")]
pub enum FieldChange {
    Assignee { old: Option<String>, new: String },
    Priority { old: i32, new: i32 },
}

impl FieldChange {
    pub fn field(&self) -> TrackedField {
        match self {
            FieldChange::Assignee { .. } => TrackedField::Assignee,
            FieldChange::Priority { .. } => TrackedField::Priority,
        }
    }

    pub fn old_value(&self) -> String {
        match self {
            FieldChange::Assignee { old, .. } => old.clone().unwrap_or_else(|| "none".to_string()),
            FieldChange::Priority { old, .. } => old.to_string(),
        }
    }

    pub fn new_value(&self) -> String {
        match self {
            FieldChange::Assignee { new, .. } => new.clone(),
            FieldChange::Priority { new, .. } => new.to_string(),
        }
    }

    /// The destination update that applies this change.
    pub fn to_update(&self) -> IssueUpdate {
        match self {
            FieldChange::Assignee { new, .. } => IssueUpdate {
                assignee_id: Some(new.clone()),
                priority: None,
            },
            FieldChange::Priority { new, .. } => IssueUpdate {
                assignee_id: None,
                priority: Some(*new),
            },
        }
    }
}

/// A planned update to one destination issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateIntent {
    pub issue_id: String,
    /// Human-readable key such as `ENG-12`.
    pub issue_identifier: String,
    pub source: BackReference,
    pub change: FieldChange,
}

/// An intent the destination refused or never received.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateFailure {
    pub intent: UpdateIntent,
    pub error: String,
}

/// Options for one reconciliation run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Source repository.
    pub repo: RepoCoordinates,
    /// Destination team id, key or name.
    pub team: String,
    /// Field being reconciled.
    pub field: TrackedField,
    /// Lower-cased prefix that marks priority labels.
    pub priority_label_prefix: Option<String>,
    /// Stop collecting when the source quota drops below this.
    pub quota_low_water: usize,
    /// Plan without applying.
    pub dry_run: bool,
    /// Source handle to destination display name or email.
    pub overrides: HashMap<String, String>,
}

impl SyncOptions {
    pub fn new(repo: RepoCoordinates, team: impl Into<String>, field: TrackedField) -> Self {
        Self {
            repo,
            team: team.into(),
            field,
            priority_label_prefix: None,
            quota_low_water: DEFAULT_QUOTA_LOW_WATER,
            dry_run: false,
            overrides: HashMap::new(),
        }
    }
}

/// Outcome of a reconciliation run.
#[derive(Debug, Default, Serialize)]
pub struct SyncReport {
    /// Source issues carrying the tracked field.
    pub collected: usize,
    /// Matched (source, destination) pairs.
    pub matched: usize,
    /// Source issues with no destination counterpart.
    pub unmatched: usize,
    /// Update intents produced by the planner.
    pub planned: usize,
    /// Intents applied.
    pub updated: usize,
    /// Matched pairs that needed no update or could not be translated.
    pub skipped: usize,
    /// Intents the destination did not accept.
    pub failed: usize,
    pub failures: Vec<UpdateFailure>,
    /// Collection stopped on the quota low-water mark.
    pub early_exit: bool,
    pub dry_run: bool,
    pub intents: Vec<UpdateIntent>,
}
