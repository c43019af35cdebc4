//! Linear GraphQL client.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::LinearError;
use super::types::{
    DEFAULT_PAGE_SIZE, ISSUE_UPDATE_MUTATION, ISSUES_QUERY, IssueUpdateData, IssueUpdateInput,
    IssuesData, LINEAR_API_URL, TEAMS_QUERY, TeamsData, USERS_QUERY, UsersData,
    issue_filter_json,
};
use crate::graphql::{Connection, GraphQlRequest, GraphQlResponse};
use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{HttpHeaders, HttpRequest, HttpTransport};
use crate::platform::{
    self, ApiRateLimiter, DestinationActor, DestinationApi, DestinationIssue, IssueFilter,
    IssueUpdate, Team,
};

/// Linear API client.
#[derive(Clone)]
pub struct LinearClient {
    transport: Arc<dyn HttpTransport>,
    endpoint: String,
    api_key: String,
    /// Optional rate limiter for pacing API requests.
    rate_limiter: Option<ApiRateLimiter>,
}

impl LinearClient {
    /// Create a client for the public Linear API backed by reqwest.
    pub fn new(api_key: &str, rate_limiter: Option<ApiRateLimiter>) -> Result<Self, LinearError> {
        let transport = ReqwestTransport::with_timeout(StdDuration::from_secs(30))
            .map_err(|e| LinearError::Config(e.to_string()))?;
        Ok(Self::new_with_transport(
            LINEAR_API_URL,
            api_key,
            rate_limiter,
            Arc::new(transport),
        ))
    }

    pub fn new_with_transport(
        endpoint: &str,
        api_key: &str,
        rate_limiter: Option<ApiRateLimiter>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            transport,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            rate_limiter,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Wait for rate limiter if one is configured.
    async fn wait_for_rate_limit(&self) {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }
    }

    fn headers(&self) -> HttpHeaders {
        vec![
            ("Authorization".to_string(), self.api_key.clone()),
            ("User-Agent".to_string(), "issuesync".to_string()),
        ]
    }

    /// Run a GraphQL document and return its `data`.
    pub async fn query<T: DeserializeOwned, V: Serialize>(
        &self,
        document: &str,
        variables: V,
    ) -> Result<T, LinearError> {
        self.wait_for_rate_limit().await;

        let body = GraphQlRequest::new(document, variables).to_body()?;
        let response = self
            .transport
            .send(HttpRequest::post_json(
                self.endpoint.as_str(),
                self.headers(),
                body,
            ))
            .await
            .map_err(|e| LinearError::Http(e.to_string()))?;

        match response.status {
            200..=299 => {}
            401 | 403 => return Err(LinearError::Auth(response.body_text())),
            400 => {
                // Validation failures come back as 400 with a GraphQL error body.
                if let Ok(envelope) =
                    serde_json::from_slice::<GraphQlResponse<serde_json::Value>>(&response.body)
                    && let Err(message) = envelope.into_result()
                {
                    return Err(LinearError::GraphQl(message));
                }
                return Err(LinearError::Api {
                    status: 400,
                    message: response.body_text(),
                });
            }
            status => {
                return Err(LinearError::Api {
                    status,
                    message: response.body_text(),
                });
            }
        }

        let envelope: GraphQlResponse<T> = serde_json::from_slice(&response.body)?;
        envelope.into_result().map_err(LinearError::GraphQl)
    }

    /// Follow a connection's cursor until exhausted.
    async fn paginate<D, N>(
        &self,
        document: &str,
        mut variables: serde_json::Value,
        connection: fn(D) -> Connection<N>,
    ) -> Result<Vec<N>, LinearError>
    where
        D: DeserializeOwned,
    {
        let mut nodes = Vec::new();
        let mut after: Option<String> = None;

        loop {
            variables["first"] = serde_json::json!(DEFAULT_PAGE_SIZE);
            variables["after"] = serde_json::json!(after);

            let data: D = self.query(document, &variables).await?;
            let page = connection(data);
            nodes.extend(page.nodes);

            match page.page_info.end_cursor {
                Some(cursor) if page.page_info.has_next_page => after = Some(cursor),
                _ => break,
            }
        }

        Ok(nodes)
    }

    pub async fn teams(&self) -> Result<Vec<Team>, LinearError> {
        let teams = self
            .paginate(TEAMS_QUERY, serde_json::json!({}), |d: TeamsData| d.teams)
            .await?;
        Ok(teams.into_iter().map(Team::from).collect())
    }

    pub async fn users(&self) -> Result<Vec<DestinationActor>, LinearError> {
        let users = self
            .paginate(USERS_QUERY, serde_json::json!({}), |d: UsersData| d.users)
            .await?;
        Ok(users.into_iter().map(DestinationActor::from).collect())
    }

    pub async fn issues(&self, filter: &IssueFilter) -> Result<Vec<DestinationIssue>, LinearError> {
        let variables = serde_json::json!({ "filter": issue_filter_json(filter) });
        let issues = self
            .paginate(ISSUES_QUERY, variables, |d: IssuesData| d.issues)
            .await?;
        Ok(issues.into_iter().map(DestinationIssue::from).collect())
    }

    /// Apply a partial update to one issue.
    pub async fn update_issue(&self, id: &str, update: &IssueUpdate) -> Result<(), LinearError> {
        if update.assignee_id.is_none() && update.priority.is_none() {
            tracing::debug!(issue = id, "Empty update, nothing sent");
            return Ok(());
        }

        let variables = serde_json::json!({
            "id": id,
            "input": IssueUpdateInput::from(update),
        });
        let data: IssueUpdateData = self.query(ISSUE_UPDATE_MUTATION, variables).await?;
        if !data.issue_update.success {
            return Err(LinearError::UpdateRejected(id.to_string()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for LinearClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinearClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DestinationApi for LinearClient {
    async fn list_teams(&self) -> platform::Result<Vec<Team>> {
        Ok(self.teams().await?)
    }

    async fn list_actors(&self) -> platform::Result<Vec<DestinationActor>> {
        Ok(self.users().await?)
    }

    async fn find_issues(&self, filter: &IssueFilter) -> platform::Result<Vec<DestinationIssue>> {
        Ok(self.issues(filter).await?)
    }

    async fn update_issue(&self, id: &str, update: &IssueUpdate) -> platform::Result<()> {
        Ok(LinearClient::update_issue(self, id, update).await?)
    }
}
