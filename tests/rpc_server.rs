use reqlab::app::App;
use reqlab::config::{AppConfig, StoreKind};
use reqlab::rpc::server::RpcServer;
use serde_json::{json, Value};

mod common;
use common::{harness, ENV_LOCK};

async fn call(server: &RpcServer, line: &str) -> Value {
    let response = server.handle_line(line).await.expect("response");
    serde_json::to_value(&response).expect("serialize")
}

#[tokio::test]
async fn workspace_and_request_methods_round_trip() {
    let server = RpcServer::new(harness().app);

    let created = call(
        &server,
        r#"{"jsonrpc":"2.0","id":1,"method":"workspace","params":{"action":"project_create","name":"Demo"}}"#,
    )
    .await;
    assert_eq!(created["id"], 1);
    let project_id = created["result"]["project"]["id"].as_str().expect("id").to_string();

    let listed = call(
        &server,
        &json!({
            "jsonrpc": "2.0",
            "id": "h",
            "method": "request",
            "params": {"action": "history_list", "project_id": project_id}
        })
        .to_string(),
    )
    .await;
    assert_eq!(listed["result"]["history"], json!([]));
}

#[tokio::test]
async fn protocol_errors_map_to_json_rpc_codes() {
    let server = RpcServer::new(harness().app);

    let parse = call(&server, "{not json").await;
    assert_eq!(parse["error"]["code"], -32700);
    assert_eq!(parse["id"], Value::Null);

    let unknown = call(&server, r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#).await;
    assert_eq!(unknown["error"]["code"], -32601);

    let invalid = call(
        &server,
        r#"{"jsonrpc":"2.0","id":3,"method":"workspace","params":{"action":"tag_create","name":"t","headers":{"X":1}}}"#,
    )
    .await;
    assert_eq!(invalid["error"]["code"], -32602);
    assert_eq!(invalid["error"]["data"]["kind"], "invalid_params");

    let missing = call(
        &server,
        r#"{"jsonrpc":"2.0","id":4,"method":"request","params":{"action":"history_get","history_id":"nope"}}"#,
    )
    .await;
    assert_eq!(missing["error"]["code"], -32600);
    assert_eq!(missing["error"]["data"]["kind"], "not_found");
}

#[tokio::test]
async fn notifications_and_blank_lines_get_no_response() {
    let server = RpcServer::new(harness().app);
    assert!(server.handle_line("   ").await.is_none());
    assert!(server
        .handle_line(r#"{"jsonrpc":"2.0","method":"ping"}"#)
        .await
        .is_none());
}

#[tokio::test]
async fn sqlite_app_uses_data_dir_from_env() {
    let _guard = ENV_LOCK.lock().await;
    let dir = tempfile::tempdir().expect("tempdir");

    let prev_data_dir = std::env::var("REQLAB_DATA_DIR").ok();
    let prev_db_path = std::env::var("REQLAB_DB_PATH").ok();
    let prev_store = std::env::var("REQLAB_STORE").ok();
    std::env::set_var("REQLAB_DATA_DIR", dir.path());
    std::env::remove_var("REQLAB_DB_PATH");
    std::env::set_var("REQLAB_STORE", "sqlite");

    let config = AppConfig::from_env();
    assert_eq!(config.store, StoreKind::Sqlite);
    assert_eq!(config.db_path, dir.path().join("reqlab.db"));

    let app = App::initialize(config).expect("initialize");
    app.workspace
        .handle_action(json!({"action": "project_create", "name": "Persisted"}))
        .await
        .expect("create");
    assert!(dir.path().join("reqlab.db").exists());

    match prev_data_dir {
        Some(value) => std::env::set_var("REQLAB_DATA_DIR", value),
        None => std::env::remove_var("REQLAB_DATA_DIR"),
    }
    match prev_db_path {
        Some(value) => std::env::set_var("REQLAB_DB_PATH", value),
        None => std::env::remove_var("REQLAB_DB_PATH"),
    }
    match prev_store {
        Some(value) => std::env::set_var("REQLAB_STORE", value),
        None => std::env::remove_var("REQLAB_STORE"),
    }
}
