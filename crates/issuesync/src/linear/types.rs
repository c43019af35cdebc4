//! Linear GraphQL documents and wire types.

use serde::{Deserialize, Serialize};

use crate::graphql::Connection;
use crate::platform::{DestinationActor, DestinationIssue, IssueFilter, IssueUpdate, Team};

/// Public Linear GraphQL endpoint.
pub const LINEAR_API_URL: &str = "https://api.linear.app/graphql";

/// Page size for connection queries.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

pub const TEAMS_QUERY: &str = r#"
query Teams($first: Int!, $after: String) {
  teams(first: $first, after: $after) {
    nodes { id name key }
    pageInfo { hasNextPage endCursor }
  }
}
"#;

pub const USERS_QUERY: &str = r#"
query Users($first: Int!, $after: String) {
  users(first: $first, after: $after) {
    nodes { id name displayName email }
    pageInfo { hasNextPage endCursor }
  }
}
"#;

pub const ISSUES_QUERY: &str = r#"
query Issues($filter: IssueFilter, $first: Int!, $after: String) {
  issues(filter: $filter, first: $first, after: $after) {
    nodes { id identifier title description priority assignee { id } }
    pageInfo { hasNextPage endCursor }
  }
}
"#;

pub const ISSUE_UPDATE_MUTATION: &str = r#"
mutation IssueUpdate($id: String!, $input: IssueUpdateInput!) {
  issueUpdate(id: $id, input: $input) { success }
}
"#;

#[derive(Debug, Deserialize)]
pub struct TeamsData {
    pub teams: Connection<LinearTeam>,
}

#[derive(Debug, Deserialize)]
pub struct UsersData {
    pub users: Connection<LinearUser>,
}

#[derive(Debug, Deserialize)]
pub struct IssuesData {
    pub issues: Connection<LinearIssue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueUpdateData {
    pub issue_update: IssueUpdatePayload,
}

#[derive(Debug, Deserialize)]
pub struct IssueUpdatePayload {
    pub success: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinearTeam {
    pub id: String,
    pub name: String,
    pub key: String,
}

impl From<LinearTeam> for Team {
    fn from(team: LinearTeam) -> Self {
        Team {
            id: team.id,
            name: team.name,
            key: team.key,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinearUser {
    pub id: String,
    /// Full name.
    pub name: String,
    /// Short nickname; not used for matching.
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl From<LinearUser> for DestinationActor {
    fn from(user: LinearUser) -> Self {
        DestinationActor {
            id: user.id,
            display_name: user.name,
            email: user.email.filter(|e| !e.trim().is_empty()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinearIssue {
    pub id: String,
    pub identifier: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Linear types priority as a float; values are always 0-4.
    pub priority: f64,
    #[serde(default)]
    pub assignee: Option<LinearRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinearRef {
    pub id: String,
}

impl From<LinearIssue> for DestinationIssue {
    fn from(issue: LinearIssue) -> Self {
        DestinationIssue {
            id: issue.id,
            identifier: issue.identifier,
            title: issue.title,
            description: issue.description.unwrap_or_default(),
            assignee_id: issue.assignee.map(|a| a.id),
            priority: issue.priority.round() as i32,
        }
    }
}

/// Build the `IssueFilter` GraphQL input for a search.
pub fn issue_filter_json(filter: &IssueFilter) -> serde_json::Value {
    let mut value = serde_json::json!({
        "team": {"id": {"eq": filter.team_id}},
    });
    if let Some(title) = &filter.title_equals {
        value["title"] = serde_json::json!({"eq": title});
    }
    if let Some(fragment) = &filter.description_contains {
        value["description"] = serde_json::json!({"contains": fragment});
    }
    value
}

/// `IssueUpdateInput` with only the fields being changed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueUpdateInput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

impl<'a> From<&'a IssueUpdate> for IssueUpdateInput<'a> {
    fn from(update: &'a IssueUpdate) -> Self {
        Self {
            assignee_id: update.assignee_id.as_deref(),
            priority: update.priority,
        }
    }
}
