#![allow(dead_code)]

use once_cell::sync::Lazy;
use reqlab::app::App;
use reqlab::config::{AppConfig, StoreKind};
use reqlab::services::clock::FixedClock;
use reqlab::services::token::TokenGenerator;
use reqlab::stores::{MemoryStore, Store};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

pub static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Deterministic share tokens: tok-1, tok-2, ...
#[derive(Default)]
pub struct SequentialTokens {
    next: AtomicU64,
}

impl TokenGenerator for SequentialTokens {
    fn generate(&self) -> String {
        format!("tok-{}", self.next.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

pub struct Harness {
    pub app: App,
    pub clock: FixedClock,
}

pub fn harness_with(config: AppConfig, store: Arc<dyn Store>) -> Harness {
    let clock = FixedClock::new(1_700_000_000_000);
    let app = App::with_services(
        config,
        store,
        Arc::new(clock.clone()),
        Arc::new(SequentialTokens::default()),
    )
    .expect("app wiring");
    Harness { app, clock }
}

pub fn harness() -> Harness {
    let config = AppConfig {
        store: StoreKind::Memory,
        ..AppConfig::default()
    };
    harness_with(config, Arc::new(MemoryStore::new()))
}

impl Harness {
    pub async fn workspace(&self, args: Value) -> Value {
        self.app
            .workspace
            .handle_action(args)
            .await
            .expect("workspace action")
    }

    pub async fn request(&self, args: Value) -> Value {
        self.app
            .requests
            .handle_action(args)
            .await
            .expect("request action")
    }

    pub async fn create_project(&self, name: &str) -> String {
        let created = self
            .workspace(serde_json::json!({"action": "project_create", "name": name}))
            .await;
        created["project"]["id"].as_str().expect("project id").to_string()
    }

    /// Creates an environment and selects it for the project.
    pub async fn select_environment(&self, project_id: &str, variables: Value) -> String {
        let created = self
            .workspace(serde_json::json!({
                "action": "environment_create",
                "project_id": project_id,
                "name": "test",
                "variables": variables,
            }))
            .await;
        let env_id = created["environment"]["id"]
            .as_str()
            .expect("environment id")
            .to_string();
        self.workspace(serde_json::json!({
            "action": "project_select_environment",
            "project_id": project_id,
            "environment_id": env_id,
        }))
        .await;
        env_id
    }

    pub async fn create_request(&self, args: Value) -> String {
        let mut args = args;
        args["action"] = Value::String("request_create".to_string());
        let created = self.workspace(args).await;
        created["request"]["id"].as_str().expect("request id").to_string()
    }
}
