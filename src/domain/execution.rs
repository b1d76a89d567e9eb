use super::{HttpMethod, StringMap, Timestamp};
use serde::{Deserialize, Serialize};

/// Concrete request after templating, policy merge and URL construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: StringMap,
    pub query_params: StringMap,
    /// Body as transmitted; always `None` for GET, HEAD and OPTIONS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOutcome {
    pub success: bool,
    pub method: HttpMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_headers: Option<StringMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whole milliseconds.
    pub duration: u64,
    pub resolved_url: String,
    pub resolved_headers: StringMap,
    pub resolved_query_params: StringMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_body: Option<String>,
}

/// Identifies what triggered an execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContext {
    pub project_id: String,
    pub request_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_id: Option<String>,
    /// The request URL as stored, before templating.
    pub url: String,
}

/// Append-only record of one execution attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub project_id: String,
    pub request_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_id: Option<String>,
    pub method: HttpMethod,
    pub url: String,
    pub resolved_url: String,
    pub resolved_headers: StringMap,
    pub resolved_query_params: StringMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_headers: Option<StringMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration: u64,
    pub timestamp: Timestamp,
    pub created_at: Timestamp,
}

impl HistoryEntry {
    pub fn from_outcome(
        id: String,
        outcome: &ExecutionOutcome,
        context: &ExecutionContext,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            project_id: context.project_id.clone(),
            request_id: context.request_id.clone(),
            environment_id: context.environment_id.clone(),
            method: outcome.method,
            url: context.url.clone(),
            resolved_url: outcome.resolved_url.clone(),
            resolved_headers: outcome.resolved_headers.clone(),
            resolved_query_params: outcome.resolved_query_params.clone(),
            resolved_body: outcome.resolved_body.clone(),
            status: outcome.status,
            status_text: outcome.status_text.clone(),
            response_headers: outcome.response_headers.clone(),
            response_body: outcome.response_body.clone(),
            error: outcome.error.clone(),
            duration: outcome.duration,
            timestamp: now,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Share {
    pub id: String,
    pub project_id: String,
    pub history_id: String,
    pub share_token: String,
    pub is_public: bool,
    pub created_at: Timestamp,
}
