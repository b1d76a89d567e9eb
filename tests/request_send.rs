use httpmock::prelude::*;
use reqlab::config::{AppConfig, StoreKind};
use reqlab::constants::network::USER_AGENT;
use reqlab::domain::{
    Environment, HistoryEntry, HttpMethod, Project, RequestDefinition, Share, Tag,
};
use reqlab::errors::{AppError, AppErrorKind};
use reqlab::stores::{MemoryStore, Store};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

mod common;
use common::{harness, harness_with};

#[tokio::test]
async fn error_status_is_a_successful_execution_and_is_recorded() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/missing");
            then.status(404)
                .header("content-type", "application/json")
                .body("{\"error\":\"not found\"}");
        })
        .await;

    let h = harness();
    let project_id = h.create_project("Demo").await;
    h.select_environment(&project_id, json!({"BASE": server.base_url()}))
        .await;
    let request_id = h
        .create_request(json!({
            "project_id": project_id,
            "name": "missing",
            "method": "GET",
            "url": "{{BASE}}/missing",
        }))
        .await;

    let sent = h.request(json!({"action": "send", "request_id": request_id})).await;
    mock.assert_async().await;

    let outcome = &sent["outcome"];
    assert_eq!(outcome["success"], true);
    assert_eq!(outcome["status"], 404);
    assert_eq!(outcome["statusText"], "Not Found");
    assert_eq!(outcome["responseBody"], "{\n  \"error\": \"not found\"\n}");
    assert_eq!(outcome["responseHeaders"]["content-type"], "application/json");
    assert!(sent["history_id"].is_string());

    let listed = h
        .request(json!({"action": "history_list", "project_id": project_id}))
        .await;
    let entries = listed["history"].as_array().expect("history array");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["status"], 404);
    assert_eq!(entries[0]["url"], "{{BASE}}/missing");
    assert_eq!(entries[0]["resolvedUrl"], format!("{}/missing", server.base_url()));
}

#[tokio::test]
async fn tags_environment_and_request_values_merge_on_the_wire() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/users")
                .query_param("page", "2")
                .query_param("lang", "en")
                .header("authorization", "Bearer abc")
                .header("x-team", "core")
                .body("{\"name\":\"ada\"}");
            then.status(201)
                .header("content-type", "text/plain")
                .body("created");
        })
        .await;

    let h = harness();
    let project_id = h.create_project("Demo").await;
    h.select_environment(
        &project_id,
        json!({"BASE": server.base_url(), "TOKEN": "abc", "TEAM": "core"}),
    )
    .await;
    let tag = h
        .workspace(json!({
            "action": "tag_create",
            "name": "team",
            "color": "green",
            "headers": {"Authorization": "Bearer tag", "X-Team": "{{TEAM}}"},
            "query_params": {"page": "1", "lang": "en"},
        }))
        .await;
    let request_id = h
        .create_request(json!({
            "project_id": project_id,
            "name": "create",
            "method": "POST",
            "url": "{{BASE}}/users",
            "headers": {"Authorization": "Bearer {{TOKEN}}"},
            "query_params": {"page": "2"},
            "body": "{\"name\":\"ada\"}",
            "tag_ids": [tag["tag"]["id"], "missing-tag"],
        }))
        .await;

    let sent = h.request(json!({"action": "send", "request_id": request_id})).await;
    mock.assert_async().await;

    let outcome = &sent["outcome"];
    assert_eq!(outcome["status"], 201);
    assert_eq!(outcome["responseBody"], "created");
    assert_eq!(
        outcome["resolvedUrl"],
        format!("{}/users?page=2&lang=en", server.base_url())
    );
    assert_eq!(outcome["resolvedHeaders"]["Authorization"], "Bearer abc");
    assert_eq!(outcome["resolvedBody"], "{\"name\":\"ada\"}");
}

#[tokio::test]
async fn invalid_json_body_is_returned_verbatim() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/broken");
            then.status(200)
                .header("content-type", "application/json; charset=utf-8")
                .body("{oops");
        })
        .await;

    let h = harness();
    let project_id = h.create_project("Demo").await;
    let request_id = h
        .create_request(json!({
            "project_id": project_id,
            "name": "broken",
            "url": server.url("/broken"),
        }))
        .await;

    let sent = h.request(json!({"action": "send", "request_id": request_id})).await;
    assert_eq!(sent["outcome"]["success"], true);
    assert_eq!(sent["outcome"]["responseBody"], "{oops");
}

#[tokio::test]
async fn default_user_agent_is_sent_unless_overridden() {
    let server = MockServer::start_async().await;
    let default_ua = server
        .mock_async(|when, then| {
            when.method(GET).path("/ua").header("user-agent", USER_AGENT);
            then.status(200);
        })
        .await;
    let custom_ua = server
        .mock_async(|when, then| {
            when.method(GET).path("/ua").header("user-agent", "probe/1");
            then.status(200);
        })
        .await;

    let h = harness();
    let project_id = h.create_project("Demo").await;
    let plain = h
        .create_request(json!({"project_id": project_id, "name": "plain", "url": server.url("/ua")}))
        .await;
    let custom = h
        .create_request(json!({
            "project_id": project_id,
            "name": "custom",
            "url": server.url("/ua"),
            "headers": {"User-Agent": "probe/1"},
        }))
        .await;

    h.request(json!({"action": "send", "request_id": plain})).await;
    h.request(json!({"action": "send", "request_id": custom})).await;
    default_ua.assert_async().await;
    custom_ua.assert_async().await;
}

#[tokio::test]
async fn unreachable_host_fails_and_still_records_history() {
    let h = harness();
    let project_id = h.create_project("Demo").await;
    h.select_environment(&project_id, json!({"HOST": "http://127.0.0.1:1"}))
        .await;
    let request_id = h
        .create_request(json!({
            "project_id": project_id,
            "name": "down",
            "url": "{{HOST}}/ping",
            "query_params": {"q": "1"},
        }))
        .await;

    let sent = h.request(json!({"action": "send", "request_id": request_id})).await;
    let outcome = &sent["outcome"];
    assert_eq!(outcome["success"], false);
    assert!(!outcome["error"].as_str().unwrap_or_default().is_empty());
    assert!(outcome.get("status").is_none());
    assert_eq!(outcome["resolvedUrl"], "{{HOST}}/ping");
    assert_eq!(outcome["resolvedQueryParams"]["q"], "1");

    let history_id = sent["history_id"].as_str().expect("history id");
    let entry = h
        .request(json!({"action": "history_get", "history_id": history_id}))
        .await;
    assert!(entry["history"]["error"].is_string());
    assert!(entry["history"].get("status").is_none());
}

#[tokio::test]
async fn slow_responses_hit_the_configured_timeout() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/slow");
            then.status(200).delay(Duration::from_millis(1_000));
        })
        .await;

    let config = AppConfig {
        store: StoreKind::Memory,
        request_timeout: Some(Duration::from_millis(100)),
        ..AppConfig::default()
    };
    let h = harness_with(config, Arc::new(MemoryStore::new()));
    let project_id = h.create_project("Demo").await;
    let request_id = h
        .create_request(json!({"project_id": project_id, "name": "slow", "url": server.url("/slow")}))
        .await;

    let sent = h.request(json!({"action": "send", "request_id": request_id})).await;
    assert_eq!(sent["outcome"]["success"], false);
    assert!(sent["outcome"]["error"]
        .as_str()
        .unwrap_or_default()
        .contains("timed out"));
}

#[tokio::test]
async fn preview_resolves_without_sending_and_flags_missing_variables() {
    let h = harness();
    let project_id = h.create_project("Demo").await;
    h.select_environment(&project_id, json!({"BASE": "https://api.example.com"}))
        .await;
    let request_id = h
        .create_request(json!({
            "project_id": project_id,
            "name": "preview",
            "method": "GET",
            "url": "{{BASE}}/items",
            "headers": {"X-Item": "{{ITEM_ID}}"},
            "query_params": {"empty": "", "q": "a b"},
        }))
        .await;

    let preview = h
        .request(json!({"action": "preview", "request_id": request_id}))
        .await;
    assert_eq!(preview["resolved"]["url"], "https://api.example.com/items?q=a+b");
    assert_eq!(preview["resolved"]["headers"]["X-Item"], "{{ITEM_ID}}");
    assert_eq!(preview["unresolved_variables"], json!(["ITEM_ID"]));

    let listed = h
        .request(json!({"action": "history_list", "project_id": project_id}))
        .await;
    assert_eq!(listed["history"], json!([]));
}

#[tokio::test]
async fn foreign_environment_is_rejected() {
    let h = harness();
    let own_project = h.create_project("A").await;
    let other_project = h.create_project("B").await;
    let foreign_env = h
        .select_environment(&other_project, json!({"BASE": "https://secret.b.example"}))
        .await;
    let request_id = h
        .create_request(json!({
            "project_id": own_project,
            "name": "scoped",
            "url": "{{BASE}}/x",
        }))
        .await;

    for action in ["preview", "send"] {
        let err = h
            .app
            .requests
            .handle_action(json!({
                "action": action,
                "request_id": request_id,
                "environment_id": foreign_env,
            }))
            .await
            .unwrap_err();
        assert_eq!(err.kind, AppErrorKind::InvalidParams, "{}", action);
    }

    let listed = h
        .request(json!({"action": "history_list", "project_id": own_project}))
        .await;
    assert_eq!(listed["history"], json!([]));
}

/// Delegates to a memory store but refuses every history write.
struct HistoryWriteFails {
    inner: MemoryStore,
}

impl Store for HistoryWriteFails {
    fn put_project(&self, project: &Project) -> Result<(), AppError> {
        self.inner.put_project(project)
    }
    fn get_project(&self, id: &str) -> Result<Option<Project>, AppError> {
        self.inner.get_project(id)
    }
    fn list_projects(&self) -> Result<Vec<Project>, AppError> {
        self.inner.list_projects()
    }
    fn delete_project(&self, id: &str) -> Result<bool, AppError> {
        self.inner.delete_project(id)
    }
    fn put_request(&self, request: &RequestDefinition) -> Result<(), AppError> {
        self.inner.put_request(request)
    }
    fn get_request(&self, id: &str) -> Result<Option<RequestDefinition>, AppError> {
        self.inner.get_request(id)
    }
    fn list_requests(&self, project_id: &str) -> Result<Vec<RequestDefinition>, AppError> {
        self.inner.list_requests(project_id)
    }
    fn delete_request(&self, id: &str) -> Result<bool, AppError> {
        self.inner.delete_request(id)
    }
    fn put_tag(&self, tag: &Tag) -> Result<(), AppError> {
        self.inner.put_tag(tag)
    }
    fn get_tag(&self, id: &str) -> Result<Option<Tag>, AppError> {
        self.inner.get_tag(id)
    }
    fn list_tags(&self) -> Result<Vec<Tag>, AppError> {
        self.inner.list_tags()
    }
    fn delete_tag(&self, id: &str) -> Result<bool, AppError> {
        self.inner.delete_tag(id)
    }
    fn put_environment(&self, environment: &Environment) -> Result<(), AppError> {
        self.inner.put_environment(environment)
    }
    fn get_environment(&self, id: &str) -> Result<Option<Environment>, AppError> {
        self.inner.get_environment(id)
    }
    fn list_environments(&self, project_id: &str) -> Result<Vec<Environment>, AppError> {
        self.inner.list_environments(project_id)
    }
    fn delete_environment(&self, id: &str) -> Result<bool, AppError> {
        self.inner.delete_environment(id)
    }
    fn insert_history(&self, _entry: &HistoryEntry) -> Result<(), AppError> {
        Err(AppError::storage("disk full"))
    }
    fn get_history(&self, id: &str) -> Result<Option<HistoryEntry>, AppError> {
        self.inner.get_history(id)
    }
    fn list_history(&self, project_id: &str, limit: usize) -> Result<Vec<HistoryEntry>, AppError> {
        self.inner.list_history(project_id, limit)
    }
    fn delete_history(&self, id: &str) -> Result<bool, AppError> {
        self.inner.delete_history(id)
    }
    fn insert_share(&self, share: &Share) -> Result<(), AppError> {
        self.inner.insert_share(share)
    }
    fn get_share_by_token(&self, token: &str) -> Result<Option<Share>, AppError> {
        self.inner.get_share_by_token(token)
    }
    fn list_shares(&self, project_id: &str) -> Result<Vec<Share>, AppError> {
        self.inner.list_shares(project_id)
    }
    fn delete_share(&self, id: &str) -> Result<bool, AppError> {
        self.inner.delete_share(id)
    }
}

#[tokio::test]
async fn history_write_failure_keeps_the_outcome() {
    let config = AppConfig {
        store: StoreKind::Memory,
        ..AppConfig::default()
    };
    let store = Arc::new(HistoryWriteFails {
        inner: MemoryStore::new(),
    });
    let h = harness_with(config, store);
    let project_id = h.create_project("Demo").await;
    let request_id = h
        .create_request(json!({
            "project_id": project_id,
            "name": "down",
            "url": "http://127.0.0.1:1/ping",
        }))
        .await;

    let sent = h.request(json!({"action": "send", "request_id": request_id})).await;
    assert_eq!(sent["success"], true);
    assert_eq!(sent["outcome"]["success"], false);
    assert!(sent["outcome"]["error"].is_string());
    assert_eq!(sent["history_error"], "disk full");
    assert!(sent.get("history_id").is_none());
}

#[tokio::test]
async fn options_request_never_transmits_its_stored_body() {
    let server = MockServer::start_async().await;
    let with_body = server
        .mock_async(|when, then| {
            when.method(OPTIONS).path("/opts").body_contains("secret");
            then.status(500);
        })
        .await;
    let any = server
        .mock_async(|when, then| {
            when.method(OPTIONS).path("/opts");
            then.status(204);
        })
        .await;

    let h = harness();
    let project_id = h.create_project("Demo").await;
    let mut definition =
        RequestDefinition::new(project_id, "options", HttpMethod::Options, server.url("/opts"));
    definition.body = Some("secret".to_string());
    h.app.store.put_request(&definition).expect("store request");

    let sent = h
        .request(json!({"action": "send", "request_id": definition.id}))
        .await;
    assert_eq!(sent["outcome"]["status"], 204);
    assert!(sent["outcome"].get("resolvedBody").is_none());
    any.assert_async().await;
    assert_eq!(with_body.hits_async().await, 0);
}
