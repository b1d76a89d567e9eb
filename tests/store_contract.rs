use reqlab::domain::{
    Environment, ExecutionContext, ExecutionOutcome, HistoryEntry, HttpMethod, Project,
    RequestDefinition, Share, StringMap, Tag, TagColor,
};
use reqlab::errors::AppErrorKind;
use reqlab::stores::{MemoryStore, SqliteStore, Store};

fn project(id: &str, created_at: i64) -> Project {
    Project {
        id: id.to_string(),
        name: format!("project {}", id),
        selected_environment_id: None,
        created_at,
        updated_at: created_at,
    }
}

fn request(id: &str, project_id: &str, tag_ids: &[&str]) -> RequestDefinition {
    let mut request = RequestDefinition::new(project_id, id, HttpMethod::Post, "{{BASE}}/x");
    request.id = id.to_string();
    request.headers.insert("Z-Last".to_string(), "1".to_string());
    request.headers.insert("A-First".to_string(), "2".to_string());
    request.body = Some("{}".to_string());
    request.tag_ids = tag_ids.iter().map(|t| t.to_string()).collect();
    request
}

fn environment(id: &str, project_id: &str) -> Environment {
    let mut variables = StringMap::new();
    variables.insert("BASE".to_string(), "https://x.test".to_string());
    Environment {
        id: id.to_string(),
        project_id: project_id.to_string(),
        name: id.to_string(),
        variables,
        created_at: 0,
        updated_at: 0,
    }
}

fn history(id: &str, project_id: &str, request_id: &str, timestamp: i64) -> HistoryEntry {
    let outcome = ExecutionOutcome {
        success: false,
        method: HttpMethod::Post,
        status: None,
        status_text: None,
        response_headers: None,
        response_body: None,
        error: Some("connection refused".to_string()),
        duration: 4,
        resolved_url: "{{BASE}}/x".to_string(),
        resolved_headers: StringMap::new(),
        resolved_query_params: StringMap::new(),
        resolved_body: Some("{}".to_string()),
    };
    let context = ExecutionContext {
        project_id: project_id.to_string(),
        request_id: request_id.to_string(),
        environment_id: None,
        url: "{{BASE}}/x".to_string(),
    };
    HistoryEntry::from_outcome(id.to_string(), &outcome, &context, timestamp)
}

fn share(id: &str, project_id: &str, history_id: &str) -> Share {
    Share {
        id: id.to_string(),
        project_id: project_id.to_string(),
        history_id: history_id.to_string(),
        share_token: format!("token-{}", id),
        is_public: true,
        created_at: 10,
    }
}

fn roundtrips_and_orders(store: &dyn Store) {
    store.put_project(&project("p1", 1)).expect("put p1");
    store.put_project(&project("p2", 2)).expect("put p2");
    let ids: Vec<String> = store
        .list_projects()
        .expect("list")
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec!["p2", "p1"]);

    store.put_request(&request("r1", "p1", &[])).expect("put request");
    let loaded = store.get_request("r1").expect("get").expect("exists");
    let keys: Vec<&str> = loaded.headers.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["Z-Last", "A-First"]);
    assert_eq!(loaded.method, HttpMethod::Post);
    assert_eq!(loaded.body.as_deref(), Some("{}"));

    let err = {
        let entry = history("h1", "p1", "r1", 5);
        store.insert_history(&entry).expect("insert");
        store.insert_history(&entry).unwrap_err()
    };
    assert_eq!(err.kind, AppErrorKind::Conflict);

    store.insert_history(&history("h2", "p1", "r1", 9)).expect("insert");
    let listed = store.list_history("p1", 50).expect("list history");
    assert_eq!(listed[0].id, "h2");
    assert_eq!(listed[1].error.as_deref(), Some("connection refused"));
    assert!(listed[1].status.is_none());
    assert_eq!(store.list_history("p1", 1).expect("limited").len(), 1);
}

fn cascades(store: &dyn Store) {
    store.put_project(&project("p1", 1)).expect("put project");
    let mut tag = Tag::new("auth", TagColor::Red);
    tag.id = "t1".to_string();
    store.put_tag(&tag).expect("put tag");
    store.put_request(&request("r1", "p1", &["t1", "t2"])).expect("put r1");
    store.put_request(&request("r2", "p1", &[])).expect("put r2");
    store.put_environment(&environment("e1", "p1")).expect("put env");

    let mut selected = project("p1", 1);
    selected.selected_environment_id = Some("e1".to_string());
    store.put_project(&selected).expect("select env");

    store.insert_history(&history("h1", "p1", "r1", 5)).expect("h1");
    store.insert_history(&history("h2", "p1", "r2", 6)).expect("h2");
    store.insert_share(&share("s1", "p1", "h1")).expect("s1");
    store.insert_share(&share("s2", "p1", "h2")).expect("s2");

    assert!(store.delete_tag("t1").expect("delete tag"));
    let r1 = store.get_request("r1").expect("get").expect("exists");
    assert_eq!(r1.tag_ids, vec!["t2".to_string()]);

    assert!(store.delete_environment("e1").expect("delete env"));
    let p1 = store.get_project("p1").expect("get").expect("exists");
    assert!(p1.selected_environment_id.is_none());

    assert!(store.delete_request("r1").expect("delete request"));
    assert!(store.get_history("h1").expect("get").is_none());
    assert!(store.get_share_by_token("token-s1").expect("get").is_none());
    assert!(store.get_history("h2").expect("get").is_some());

    assert!(store.delete_project("p1").expect("delete project"));
    assert!(store.get_request("r2").expect("get").is_none());
    assert!(store.list_history("p1", 50).expect("list").is_empty());
    assert!(store.list_shares("p1").expect("list").is_empty());
    assert!(!store.delete_project("p1").expect("delete again"));
}

#[test]
fn memory_store_roundtrips_and_orders() {
    roundtrips_and_orders(&MemoryStore::new());
}

#[test]
fn memory_store_cascades() {
    cascades(&MemoryStore::new());
}

#[test]
fn sqlite_store_roundtrips_and_orders() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SqliteStore::open(&dir.path().join("nested").join("reqlab.db")).expect("open");
    roundtrips_and_orders(&store);
}

#[test]
fn sqlite_store_cascades() {
    let store = SqliteStore::open_in_memory().expect("open");
    cascades(&store);
}

#[test]
fn sqlite_store_persists_across_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("reqlab.db");
    {
        let store = SqliteStore::open(&path).expect("open");
        store.put_project(&project("p1", 1)).expect("put");
        store.insert_share(&share("s1", "p1", "h1")).expect("share");
    }
    let reopened = SqliteStore::open(&path).expect("reopen");
    assert_eq!(reopened.list_projects().expect("list").len(), 1);
    let found = reopened
        .get_share_by_token("token-s1")
        .expect("lookup")
        .expect("exists");
    assert!(found.is_public);
}
