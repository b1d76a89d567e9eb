use crate::domain::{
    Environment, ExecutionContext, HistoryEntry, RequestDefinition, Share, StringMap,
};
use crate::errors::AppError;
use crate::services::executor::{resolve_request, HttpExecutor};
use crate::services::history::HistoryRecorder;
use crate::services::logger::Logger;
use crate::services::policy::TagPolicyLoader;
use crate::services::share::ShareService;
use crate::services::validation::Validation;
use crate::stores::Store;
use crate::utils::actions::unknown_action_error;
use crate::utils::template::unresolved_variables;
use serde_json::{json, Value};
use std::sync::Arc;

const REQUEST_ACTIONS: &[&str] = &[
    "send",
    "preview",
    "history_list",
    "history_get",
    "history_delete",
    "share_create",
    "share_get",
    "share_list",
    "share_delete",
];

/// Sending requests and everything that hangs off a send: history and shares.
#[derive(Clone)]
pub struct RequestManager {
    logger: Logger,
    validation: Validation,
    store: Arc<dyn Store>,
    tags: TagPolicyLoader,
    executor: Arc<HttpExecutor>,
    history: HistoryRecorder,
    shares: ShareService,
}

fn share_view(share: Share, entry: Option<HistoryEntry>) -> Value {
    json!({"share": share, "history": entry})
}

impl RequestManager {
    pub fn new(
        logger: Logger,
        validation: Validation,
        store: Arc<dyn Store>,
        tags: TagPolicyLoader,
        executor: Arc<HttpExecutor>,
        history: HistoryRecorder,
        shares: ShareService,
    ) -> Self {
        Self {
            logger: logger.child("request"),
            validation,
            store,
            tags,
            executor,
            history,
            shares,
        }
    }

    pub async fn handle_action(&self, args: Value) -> Result<Value, AppError> {
        let action = args.get("action");
        match action.and_then(|v| v.as_str()).unwrap_or("") {
            "send" => self.send(&args).await,
            "preview" => self.preview(&args).await,
            "history_list" => {
                let project_id = self.required_id(&args, "project_id")?;
                let limit = self.validation.ensure_optional_limit(args.get("limit"), "limit")?;
                let entries = self.history.list(&project_id, limit)?;
                Ok(json!({"success": true, "history": entries}))
            }
            "history_get" => {
                let history_id = self.required_id(&args, "history_id")?;
                let entry = self.require_history(&history_id)?;
                Ok(json!({"success": true, "history": entry}))
            }
            "history_delete" => {
                let history_id = self.required_id(&args, "history_id")?;
                let deleted = self.history.delete(&history_id)?;
                Ok(json!({"success": true, "deleted": deleted}))
            }
            "share_create" => {
                let history_id = self.required_id(&args, "history_id")?;
                let entry = self.require_history(&history_id)?;
                let project_id = self
                    .validation
                    .ensure_optional_string(args.get("project_id"), "project_id", true)?
                    .unwrap_or(entry.project_id);
                let is_public = self
                    .validation
                    .ensure_optional_bool(args.get("is_public"), "is_public")?
                    .unwrap_or(false);
                let share = self.shares.create(&project_id, &history_id, is_public)?;
                self.logger.info(
                    "Share created",
                    Some(&json!({"share_id": share.id, "history_id": history_id})),
                );
                Ok(json!({"success": true, "share": share}))
            }
            "share_get" => {
                let token = self.required_id(&args, "token")?;
                let (share, entry) = self
                    .shares
                    .get_by_token(&token)?
                    .ok_or_else(|| AppError::not_found("Share not found"))?;
                let mut view = share_view(share, entry);
                view["success"] = Value::Bool(true);
                Ok(view)
            }
            "share_list" => {
                let project_id = self.required_id(&args, "project_id")?;
                let shares: Vec<Value> = self
                    .shares
                    .list(&project_id)?
                    .into_iter()
                    .map(|(share, entry)| share_view(share, entry))
                    .collect();
                Ok(json!({"success": true, "shares": shares}))
            }
            "share_delete" => {
                let share_id = self.required_id(&args, "share_id")?;
                let deleted = self.shares.delete(&share_id)?;
                Ok(json!({"success": true, "deleted": deleted}))
            }
            _ => Err(unknown_action_error("request", action, REQUEST_ACTIONS)),
        }
    }

    fn required_id(&self, args: &Value, key: &str) -> Result<String, AppError> {
        self.validation
            .ensure_string(args.get(key).unwrap_or(&Value::Null), key, true)
    }

    fn require_history(&self, history_id: &str) -> Result<HistoryEntry, AppError> {
        self.history
            .get(history_id)?
            .ok_or_else(|| AppError::not_found(format!("History entry '{}' not found", history_id)))
    }

    fn require_request(&self, args: &Value) -> Result<RequestDefinition, AppError> {
        let request_id = self.required_id(args, "request_id")?;
        self.store
            .get_request(&request_id)?
            .ok_or_else(|| AppError::not_found(format!("Request '{}' not found", request_id)))
    }

    /// An explicit `environment_id` wins; otherwise the project's selection applies.
    fn resolve_environment(
        &self,
        args: &Value,
        request: &RequestDefinition,
    ) -> Result<Option<Environment>, AppError> {
        let explicit =
            self.validation
                .ensure_optional_string(args.get("environment_id"), "environment_id", true)?;
        if let Some(id) = explicit {
            let environment = self
                .store
                .get_environment(&id)?
                .ok_or_else(|| AppError::not_found(format!("Environment '{}' not found", id)))?;
            if environment.project_id != request.project_id {
                return Err(AppError::invalid_params(format!(
                    "Environment '{}' belongs to another project",
                    id
                )));
            }
            return Ok(Some(environment));
        }
        let selected = self
            .store
            .get_project(&request.project_id)?
            .and_then(|project| project.selected_environment_id);
        match selected {
            Some(id) => self.store.get_environment(&id),
            None => Ok(None),
        }
    }

    async fn send(&self, args: &Value) -> Result<Value, AppError> {
        let request = self.require_request(args)?;
        let environment = self.resolve_environment(args, &request)?;
        let tags = self.tags.load(&request.tag_ids).await?;

        let outcome = self
            .executor
            .execute(&request, &tags, environment.as_ref())
            .await;

        let context = ExecutionContext {
            project_id: request.project_id.clone(),
            request_id: request.id.clone(),
            environment_id: environment.as_ref().map(|env| env.id.clone()),
            url: request.url.clone(),
        };
        let mut response = json!({"success": true, "outcome": outcome});
        match self.history.record(&outcome, &context) {
            Ok(history_id) => response["history_id"] = Value::String(history_id),
            Err(err) => response["history_error"] = Value::String(err.message),
        }
        Ok(response)
    }

    async fn preview(&self, args: &Value) -> Result<Value, AppError> {
        let request = self.require_request(args)?;
        let environment = self.resolve_environment(args, &request)?;
        let tags = self.tags.load(&request.tag_ids).await?;

        let empty = StringMap::new();
        let variables = environment.as_ref().map(|env| &env.variables).unwrap_or(&empty);
        let resolved = resolve_request(&request, &tags, variables);

        let mut texts: Vec<&str> = vec![request.url.as_str()];
        texts.extend(request.headers.values().map(String::as_str));
        texts.extend(request.query_params.values().map(String::as_str));
        if request.method.allows_body() {
            texts.extend(request.body.as_deref());
        }
        for tag in &tags {
            texts.extend(tag.headers.values().map(String::as_str));
            texts.extend(tag.query_params.values().map(String::as_str));
        }
        let mut unresolved: Vec<String> = Vec::new();
        for name in texts
            .into_iter()
            .flat_map(|text| unresolved_variables(text, variables))
        {
            if !unresolved.contains(&name) {
                unresolved.push(name);
            }
        }

        Ok(json!({
            "success": true,
            "resolved": resolved,
            "environment_id": environment.map(|env| env.id),
            "unresolved_variables": unresolved,
        }))
    }
}
