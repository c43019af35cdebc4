//! GitHub API data types.
//!
//! Only the fields the sync needs are declared, which keeps deserialization
//! resilient to API additions.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::graphql::Connection;
use crate::platform::RemoteIssue;

/// Default page size for issue listing (the API maximum).
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Issue as returned by `GET /repos/{owner}/{repo}/issues`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubIssue {
    pub number: u64,
    pub title: String,
    pub html_url: String,
    /// Present only when the "issue" is a pull request.
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
    #[serde(default)]
    pub assignee: Option<GitHubUserRef>,
    #[serde(default)]
    pub assignees: Vec<GitHubUserRef>,
    #[serde(default)]
    pub labels: Vec<GitHubLabel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubUserRef {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubLabel {
    pub name: String,
}

impl From<GitHubIssue> for RemoteIssue {
    fn from(issue: GitHubIssue) -> Self {
        let mut assignees: Vec<String> = issue.assignees.into_iter().map(|u| u.login).collect();
        if assignees.is_empty()
            && let Some(legacy) = issue.assignee
        {
            assignees.push(legacy.login);
        }
        RemoteIssue {
            number: issue.number,
            title: issue.title,
            url: issue.html_url,
            is_pull_request: issue.pull_request.is_some(),
            assignees,
            labels: issue.labels.into_iter().map(|l| l.name).collect(),
        }
    }
}

/// User profile as returned by `GET /users/{login}`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubUser {
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Body of `GET /rate_limit`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRateLimitResponse {
    pub resources: GitHubRateLimits,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRateLimits {
    pub core: RateLimitResource,
    #[serde(default)]
    pub search: Option<RateLimitResource>,
    #[serde(default)]
    pub graphql: Option<RateLimitResource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitResource {
    pub limit: usize,
    #[serde(default)]
    pub used: usize,
    pub remaining: usize,
    /// Reset time as a Unix timestamp.
    pub reset: i64,
}

impl RateLimitResource {
    pub fn reset_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.reset, 0).unwrap_or_else(Utc::now)
    }
}

/// GraphQL query for one page of open issues.
pub const OPEN_ISSUES_QUERY: &str = r#"
query OpenIssues($owner: String!, $name: String!, $first: Int!, $after: String) {
  repository(owner: $owner, name: $name) {
    issues(states: OPEN, first: $first, after: $after, orderBy: {field: CREATED_AT, direction: ASC}) {
      pageInfo { hasNextPage endCursor }
      nodes {
        number
        title
        url
        assignees(first: 10) { nodes { login } }
        labels(first: 20) { nodes { name } }
      }
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
pub struct OpenIssuesData {
    pub repository: Option<RepositoryIssues>,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryIssues {
    pub issues: Connection<GraphQlIssue>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlIssue {
    pub number: u64,
    pub title: String,
    pub url: String,
    pub assignees: Connection<GitHubUserRef>,
    pub labels: Connection<GitHubLabel>,
}

impl From<GraphQlIssue> for RemoteIssue {
    fn from(issue: GraphQlIssue) -> Self {
        RemoteIssue {
            number: issue.number,
            title: issue.title,
            url: issue.url,
            is_pull_request: false,
            assignees: issue.assignees.nodes.into_iter().map(|u| u.login).collect(),
            labels: issue.labels.nodes.into_iter().map(|l| l.name).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_issue_marks_pull_requests() {
        let issue: GitHubIssue = serde_json::from_value(serde_json::json!({
            "number": 7,
            "title": "Bump deps",
            "html_url": "https://github.com/acme/widgets/pull/7",
            "pull_request": {"url": "https://api.github.com/repos/acme/widgets/pulls/7"},
            "assignees": [],
            "labels": []
        }))
        .unwrap();
        let remote = RemoteIssue::from(issue);
        assert!(remote.is_pull_request);
    }

    #[test]
    fn rest_issue_falls_back_to_legacy_assignee() {
        let issue: GitHubIssue = serde_json::from_value(serde_json::json!({
            "number": 8,
            "title": "Crash",
            "html_url": "https://github.com/acme/widgets/issues/8",
            "assignee": {"login": "bob"},
            "labels": [{"name": "P2"}]
        }))
        .unwrap();
        let remote = RemoteIssue::from(issue);
        assert!(!remote.is_pull_request);
        assert_eq!(remote.assignees, vec!["bob".to_string()]);
        assert_eq!(remote.labels, vec!["P2".to_string()]);
    }

    #[test]
    fn graphql_issue_converts() {
        let issue: GraphQlIssue = serde_json::from_value(serde_json::json!({
            "number": 42,
            "title": "Fix login bug",
            "url": "https://github.com/acme/widgets/issues/42",
            "assignees": {"nodes": [{"login": "alice"}]},
            "labels": {"nodes": [{"name": "P1 - urgent"}, {"name": "bug"}]}
        }))
        .unwrap();
        let remote = RemoteIssue::from(issue);
        assert_eq!(remote.number, 42);
        assert_eq!(remote.assignees, vec!["alice".to_string()]);
        assert_eq!(remote.labels.len(), 2);
    }
}
