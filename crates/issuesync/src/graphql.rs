//! GraphQL request/response envelopes shared by the GitHub and Linear clients.

use serde::{Deserialize, Serialize};

/// A GraphQL request body.
#[derive(Debug, Serialize)]
pub struct GraphQlRequest<'a, V: Serialize> {
    pub query: &'a str,
    pub variables: V,
}

impl<'a, V: Serialize> GraphQlRequest<'a, V> {
    pub fn new(query: &'a str, variables: V) -> Self {
        Self { query, variables }
    }

    /// Serialize to a JSON body.
    pub fn to_body(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// A GraphQL response: data, errors, or both.
#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlErrorMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlErrorMessage {
    pub message: String,
}

impl<T> GraphQlResponse<T> {
    /// Collapse into data, treating any reported error as failure.
    ///
    /// Partial data alongside errors is discarded.
    pub fn into_result(self) -> Result<T, String> {
        if !self.errors.is_empty() {
            let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
            return Err(messages.join("; "));
        }
        self.data
            .ok_or_else(|| "response carried neither data nor errors".to_string())
    }
}

/// Relay-style page info.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// Relay-style connection with `nodes`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    pub nodes: Vec<T>,
    #[serde(default)]
    pub page_info: PageInfo,
}
