use crate::constants::{limits, network};
use crate::domain::{
    Environment, ExecutionOutcome, RequestDefinition, ResolvedRequest, StringMap, Tag,
};
use crate::errors::AppError;
use crate::services::logger::Logger;
use crate::utils::merge::{merge_headers, merge_params};
use crate::utils::redact::redact_headers;
use crate::utils::template::{resolve_optional_template, resolve_template, resolve_template_object};
use crate::utils::text::log_preview;
use crate::utils::url_builder::build_final_url;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

/// Templating, tag merge, URL construction and body gating, without any I/O.
pub fn resolve_request(
    definition: &RequestDefinition,
    tags: &[Tag],
    variables: &StringMap,
) -> ResolvedRequest {
    let url = resolve_template(&definition.url, variables);
    let request_headers = resolve_template_object(&definition.headers, variables);
    let request_params = resolve_template_object(&definition.query_params, variables);

    let tag_headers: Vec<StringMap> = tags
        .iter()
        .map(|tag| resolve_template_object(&tag.headers, variables))
        .collect();
    let tag_params: Vec<StringMap> = tags
        .iter()
        .map(|tag| resolve_template_object(&tag.query_params, variables))
        .collect();

    let headers = merge_headers(&tag_headers, &request_headers);
    let query_params = merge_params(&tag_params, &request_params);
    let url = build_final_url(&url, &query_params);

    let body = if definition.method.allows_body() {
        let resolved = resolve_optional_template(definition.body.as_deref(), variables);
        (!resolved.is_empty()).then_some(resolved)
    } else {
        None
    };

    ResolvedRequest {
        method: definition.method,
        url,
        headers,
        query_params,
        body,
    }
}

pub fn is_json_content_type(content_type: &str) -> bool {
    let lowered = content_type.to_ascii_lowercase();
    if lowered.contains("application/json") {
        return true;
    }
    lowered
        .split(';')
        .next()
        .map(|essence| essence.trim().ends_with("+json"))
        .unwrap_or(false)
}

/// Pretty-prints JSON with two-space indentation; anything unparseable is returned as-is.
pub fn format_json_body(raw: String) -> String {
    match serde_json::from_str::<Value>(&raw) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or(raw),
        Err(_) => raw,
    }
}

/// Lowercased names; repeated headers are joined with ", ".
fn collect_response_headers(headers: &HeaderMap) -> StringMap {
    let mut collected = StringMap::new();
    for (name, value) in headers {
        let text = String::from_utf8_lossy(value.as_bytes()).into_owned();
        match collected.get_mut(name.as_str()) {
            Some(existing) => {
                existing.push_str(", ");
                existing.push_str(&text);
            }
            None => {
                collected.insert(name.as_str().to_string(), text);
            }
        }
    }
    collected
}

struct CapturedResponse {
    status: u16,
    status_text: String,
    headers: StringMap,
    body: String,
}

pub struct HttpExecutor {
    client: Client,
    logger: Logger,
    timeout: Option<Duration>,
    user_agent: String,
}

impl HttpExecutor {
    pub fn new(
        logger: Logger,
        timeout: Option<Duration>,
        user_agent: impl Into<String>,
    ) -> Result<Self, AppError> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(network::MAX_REDIRECTS))
            .build()
            .map_err(|err| AppError::internal(format!("Failed to build HTTP client: {}", err)))?;
        Ok(Self {
            client,
            logger: logger.child("executor"),
            timeout,
            user_agent: user_agent.into(),
        })
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Runs one request end to end. Never fails: transport problems come back as
    /// an outcome with `success == false`.
    pub async fn execute(
        &self,
        definition: &RequestDefinition,
        tags: &[Tag],
        environment: Option<&Environment>,
    ) -> ExecutionOutcome {
        let started = Instant::now();
        let empty = StringMap::new();
        let variables = environment.map(|env| &env.variables).unwrap_or(&empty);
        let resolved = resolve_request(definition, tags, variables);

        self.logger.debug(
            "Dispatching request",
            Some(&json!({
                "method": resolved.method.as_str(),
                "url": log_preview(&resolved.url, limits::LOG_SUBSTRING_LENGTH),
                "headers": redact_headers(&resolved.headers),
                "has_body": resolved.body.is_some(),
            })),
        );

        let result = self.dispatch(&resolved).await;
        let duration = started.elapsed().as_millis() as u64;

        match result {
            Ok(response) => ExecutionOutcome {
                success: true,
                method: resolved.method,
                status: Some(response.status),
                status_text: Some(response.status_text),
                response_headers: Some(response.headers),
                response_body: Some(response.body),
                error: None,
                duration,
                resolved_url: resolved.url,
                resolved_headers: resolved.headers,
                resolved_query_params: resolved.query_params,
                resolved_body: resolved.body,
            },
            Err(message) => {
                self.logger.warn(
                    "Request failed",
                    Some(&json!({
                        "method": resolved.method.as_str(),
                        "url": log_preview(&resolved.url, limits::LOG_SUBSTRING_LENGTH),
                        "error": message,
                        "duration_ms": duration,
                    })),
                );
                ExecutionOutcome {
                    success: false,
                    method: definition.method,
                    status: None,
                    status_text: None,
                    response_headers: None,
                    response_body: None,
                    error: Some(message),
                    duration,
                    resolved_url: definition.url.clone(),
                    resolved_headers: definition.headers.clone(),
                    resolved_query_params: definition.query_params.clone(),
                    resolved_body: definition.body.clone(),
                }
            }
        }
    }

    async fn dispatch(&self, resolved: &ResolvedRequest) -> Result<CapturedResponse, String> {
        let headers = self.build_header_map(&resolved.headers)?;
        let mut req = self
            .client
            .request(resolved.method.to_reqwest(), resolved.url.as_str())
            .headers(headers);
        if let Some(body) = &resolved.body {
            req = req.body(body.clone());
        }
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        let response = req.send().await.map_err(|err| self.describe_error(err))?;
        let status = response.status();
        let headers = collect_response_headers(response.headers());
        let text = response
            .text()
            .await
            .map_err(|err| self.describe_error(err))?;

        let is_json = headers
            .get("content-type")
            .map(|value| is_json_content_type(value))
            .unwrap_or(false);
        let body = if is_json { format_json_body(text) } else { text };

        Ok(CapturedResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            headers,
            body,
        })
    }

    fn build_header_map(&self, headers: &StringMap) -> Result<HeaderMap, String> {
        let mut map = HeaderMap::new();
        for (key, value) in headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|_| format!("Invalid header name '{}'", key))?;
            let val = HeaderValue::from_str(value)
                .map_err(|_| format!("Invalid value for header '{}'", key))?;
            map.insert(name, val);
        }
        if !map.contains_key(USER_AGENT) && !self.user_agent.is_empty() {
            if let Ok(val) = HeaderValue::from_str(&self.user_agent) {
                map.insert(USER_AGENT, val);
            }
        }
        Ok(map)
    }

    fn describe_error(&self, err: reqwest::Error) -> String {
        if err.is_timeout() {
            return match self.timeout {
                Some(timeout) => format!("Request timed out after {} ms", timeout.as_millis()),
                None => "Request timed out".to_string(),
            };
        }
        if err.is_builder() {
            return format!("Invalid request: {}", err);
        }
        err.to_string()
    }
}
