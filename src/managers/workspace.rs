use crate::domain::{Environment, Project, RequestDefinition, Tag, TagColor};
use crate::errors::AppError;
use crate::services::clock::Clock;
use crate::services::logger::Logger;
use crate::services::validation::Validation;
use crate::stores::Store;
use crate::utils::actions::unknown_action_error;
use serde_json::{json, Value};
use std::sync::Arc;

const WORKSPACE_ACTIONS: &[&str] = &[
    "project_create",
    "project_update",
    "project_get",
    "project_list",
    "project_delete",
    "project_select_environment",
    "request_create",
    "request_update",
    "request_get",
    "request_list",
    "request_delete",
    "tag_create",
    "tag_update",
    "tag_get",
    "tag_list",
    "tag_delete",
    "environment_create",
    "environment_update",
    "environment_get",
    "environment_list",
    "environment_delete",
];

/// CRUD over projects, requests, tags and environments.
#[derive(Clone)]
pub struct WorkspaceManager {
    logger: Logger,
    validation: Validation,
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

fn arg<'a>(args: &'a Value, key: &str) -> &'a Value {
    args.get(key).unwrap_or(&Value::Null)
}

impl WorkspaceManager {
    pub fn new(
        logger: Logger,
        validation: Validation,
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            logger: logger.child("workspace"),
            validation,
            store,
            clock,
        }
    }

    pub async fn handle_action(&self, args: Value) -> Result<Value, AppError> {
        let action = args.get("action");
        match action.and_then(|v| v.as_str()).unwrap_or("") {
            "project_create" => self.project_create(&args),
            "project_update" => self.project_update(&args),
            "project_get" => {
                let project = self.require_project(&args, "project_id")?;
                Ok(json!({"success": true, "project": project}))
            }
            "project_list" => {
                let projects = self.store.list_projects()?;
                Ok(json!({"success": true, "projects": projects}))
            }
            "project_delete" => {
                let id = self.validation.ensure_string(arg(&args, "project_id"), "project_id", true)?;
                let deleted = self.store.delete_project(&id)?;
                self.logger
                    .info("Project deleted", Some(&json!({"project_id": id, "deleted": deleted})));
                Ok(json!({"success": true, "deleted": deleted}))
            }
            "project_select_environment" => self.project_select_environment(&args),
            "request_create" => self.request_create(&args),
            "request_update" => self.request_update(&args),
            "request_get" => {
                let request = self.require_request(&args)?;
                Ok(json!({"success": true, "request": request}))
            }
            "request_list" => {
                let project = self.require_project(&args, "project_id")?;
                let requests = self.store.list_requests(&project.id)?;
                Ok(json!({"success": true, "requests": requests}))
            }
            "request_delete" => {
                let id = self.validation.ensure_string(arg(&args, "request_id"), "request_id", true)?;
                let deleted = self.store.delete_request(&id)?;
                Ok(json!({"success": true, "deleted": deleted}))
            }
            "tag_create" => self.tag_create(&args),
            "tag_update" => self.tag_update(&args),
            "tag_get" => {
                let tag = self.require_tag(&args)?;
                Ok(json!({"success": true, "tag": tag}))
            }
            "tag_list" => {
                let tags = self.store.list_tags()?;
                Ok(json!({"success": true, "tags": tags}))
            }
            "tag_delete" => {
                let id = self.validation.ensure_string(arg(&args, "tag_id"), "tag_id", true)?;
                let deleted = self.store.delete_tag(&id)?;
                Ok(json!({"success": true, "deleted": deleted}))
            }
            "environment_create" => self.environment_create(&args),
            "environment_update" => self.environment_update(&args),
            "environment_get" => {
                let environment = self.require_environment(&args)?;
                Ok(json!({"success": true, "environment": environment}))
            }
            "environment_list" => {
                let project = self.require_project(&args, "project_id")?;
                let environments = self.store.list_environments(&project.id)?;
                Ok(json!({"success": true, "environments": environments}))
            }
            "environment_delete" => {
                let id = self
                    .validation
                    .ensure_string(arg(&args, "environment_id"), "environment_id", true)?;
                let deleted = self.store.delete_environment(&id)?;
                Ok(json!({"success": true, "deleted": deleted}))
            }
            _ => Err(unknown_action_error("workspace", action, WORKSPACE_ACTIONS)),
        }
    }

    fn require_project(&self, args: &Value, key: &str) -> Result<Project, AppError> {
        let id = self.validation.ensure_string(arg(args, key), key, true)?;
        self.store
            .get_project(&id)?
            .ok_or_else(|| AppError::not_found(format!("Project '{}' not found", id)))
    }

    fn require_request(&self, args: &Value) -> Result<RequestDefinition, AppError> {
        let id = self.validation.ensure_string(arg(args, "request_id"), "request_id", true)?;
        self.store
            .get_request(&id)?
            .ok_or_else(|| AppError::not_found(format!("Request '{}' not found", id)))
    }

    fn require_tag(&self, args: &Value) -> Result<Tag, AppError> {
        let id = self.validation.ensure_string(arg(args, "tag_id"), "tag_id", true)?;
        self.store
            .get_tag(&id)?
            .ok_or_else(|| AppError::not_found(format!("Tag '{}' not found", id)))
    }

    fn require_environment(&self, args: &Value) -> Result<Environment, AppError> {
        let id = self
            .validation
            .ensure_string(arg(args, "environment_id"), "environment_id", true)?;
        self.store
            .get_environment(&id)?
            .ok_or_else(|| AppError::not_found(format!("Environment '{}' not found", id)))
    }

    fn project_create(&self, args: &Value) -> Result<Value, AppError> {
        let name = self.validation.ensure_name(arg(args, "name"), "Project name")?;
        let now = self.clock.now_ms();
        let project = Project {
            id: crate::domain::new_id(),
            name,
            selected_environment_id: None,
            created_at: now,
            updated_at: now,
        };
        self.store.put_project(&project)?;
        self.logger
            .info("Project created", Some(&json!({"project_id": project.id})));
        Ok(json!({"success": true, "project": project}))
    }

    fn project_update(&self, args: &Value) -> Result<Value, AppError> {
        let mut project = self.require_project(args, "project_id")?;
        if let Some(value) = args.get("name").filter(|v| !v.is_null()) {
            project.name = self.validation.ensure_name(value, "Project name")?;
        }
        project.updated_at = self.clock.now_ms();
        self.store.put_project(&project)?;
        Ok(json!({"success": true, "project": project}))
    }

    /// A null or missing `environment_id` clears the selection.
    fn project_select_environment(&self, args: &Value) -> Result<Value, AppError> {
        let mut project = self.require_project(args, "project_id")?;
        let environment_id =
            self.validation
                .ensure_optional_string(args.get("environment_id"), "environment_id", true)?;
        if let Some(id) = &environment_id {
            let environment = self
                .store
                .get_environment(id)?
                .ok_or_else(|| AppError::not_found(format!("Environment '{}' not found", id)))?;
            if environment.project_id != project.id {
                return Err(AppError::invalid_params(format!(
                    "Environment '{}' belongs to another project",
                    id
                )));
            }
        }
        project.selected_environment_id = environment_id;
        project.updated_at = self.clock.now_ms();
        self.store.put_project(&project)?;
        Ok(json!({"success": true, "project": project}))
    }

    fn request_create(&self, args: &Value) -> Result<Value, AppError> {
        let project = self.require_project(args, "project_id")?;
        let name = self.validation.ensure_name(arg(args, "name"), "Request name")?;
        let method = match args.get("method").filter(|v| !v.is_null()) {
            Some(value) => self.validation.ensure_method(value)?,
            None => crate::domain::HttpMethod::Get,
        };
        let url = self
            .validation
            .ensure_optional_text(args.get("url"), "url")?
            .unwrap_or_default();

        let mut request = RequestDefinition::new(project.id, name, method, url);
        request.headers = self.validation.ensure_string_map(args.get("headers"), "headers")?;
        request.query_params = self
            .validation
            .ensure_string_map(args.get("query_params"), "query_params")?;
        request.tag_ids = self.validation.ensure_id_list(args.get("tag_ids"), "tag_ids")?;
        if method.allows_body() {
            request.body = self.validation.ensure_optional_text(args.get("body"), "body")?;
        }
        let now = self.clock.now_ms();
        request.created_at = now;
        request.updated_at = now;
        self.store.put_request(&request)?;
        Ok(json!({"success": true, "request": request}))
    }

    fn request_update(&self, args: &Value) -> Result<Value, AppError> {
        let mut request = self.require_request(args)?;
        if let Some(value) = args.get("name").filter(|v| !v.is_null()) {
            request.name = self.validation.ensure_name(value, "Request name")?;
        }
        if let Some(url) = self.validation.ensure_optional_text(args.get("url"), "url")? {
            request.url = url;
        }
        if let Some(headers) = self
            .validation
            .ensure_optional_string_map(args.get("headers"), "headers")?
        {
            request.headers = headers;
        }
        if let Some(params) = self
            .validation
            .ensure_optional_string_map(args.get("query_params"), "query_params")?
        {
            request.query_params = params;
        }
        if args.get("tag_ids").map(|v| !v.is_null()).unwrap_or(false) {
            request.tag_ids = self.validation.ensure_id_list(args.get("tag_ids"), "tag_ids")?;
        }
        if let Some(body) = self.validation.ensure_optional_text(args.get("body"), "body")? {
            request.body = Some(body);
        }
        if let Some(value) = args.get("method").filter(|v| !v.is_null()) {
            let method = self.validation.ensure_method(value)?;
            request.set_method(method);
        } else if !request.method.allows_body() {
            request.body = None;
        }
        request.updated_at = self.clock.now_ms();
        self.store.put_request(&request)?;
        Ok(json!({"success": true, "request": request}))
    }

    fn tag_create(&self, args: &Value) -> Result<Value, AppError> {
        let name = self.validation.ensure_name(arg(args, "name"), "Tag name")?;
        let color = match args.get("color").filter(|v| !v.is_null()) {
            Some(value) => self.validation.ensure_color(value)?,
            None => TagColor::Blue,
        };
        let mut tag = Tag::new(name, color);
        tag.icon = self.validation.ensure_optional_string(args.get("icon"), "icon", true)?;
        tag.description = self
            .validation
            .ensure_optional_text(args.get("description"), "description")?;
        tag.headers = self.validation.ensure_string_map(args.get("headers"), "headers")?;
        tag.query_params = self
            .validation
            .ensure_string_map(args.get("query_params"), "query_params")?;
        let now = self.clock.now_ms();
        tag.created_at = now;
        tag.updated_at = now;
        self.store.put_tag(&tag)?;
        Ok(json!({"success": true, "tag": tag}))
    }

    fn tag_update(&self, args: &Value) -> Result<Value, AppError> {
        let mut tag = self.require_tag(args)?;
        if let Some(value) = args.get("name").filter(|v| !v.is_null()) {
            tag.name = self.validation.ensure_name(value, "Tag name")?;
        }
        if let Some(value) = args.get("color").filter(|v| !v.is_null()) {
            tag.color = self.validation.ensure_color(value)?;
        }
        if let Some(icon) = self.validation.ensure_optional_string(args.get("icon"), "icon", true)? {
            tag.icon = Some(icon);
        }
        if let Some(description) = self
            .validation
            .ensure_optional_text(args.get("description"), "description")?
        {
            tag.description = Some(description);
        }
        if let Some(headers) = self
            .validation
            .ensure_optional_string_map(args.get("headers"), "headers")?
        {
            tag.headers = headers;
        }
        if let Some(params) = self
            .validation
            .ensure_optional_string_map(args.get("query_params"), "query_params")?
        {
            tag.query_params = params;
        }
        tag.updated_at = self.clock.now_ms();
        self.store.put_tag(&tag)?;
        Ok(json!({"success": true, "tag": tag}))
    }

    fn environment_create(&self, args: &Value) -> Result<Value, AppError> {
        let project = self.require_project(args, "project_id")?;
        let name = self.validation.ensure_name(arg(args, "name"), "Environment name")?;
        let now = self.clock.now_ms();
        let environment = Environment {
            id: crate::domain::new_id(),
            project_id: project.id,
            name,
            variables: self
                .validation
                .ensure_string_map(args.get("variables"), "variables")?,
            created_at: now,
            updated_at: now,
        };
        self.store.put_environment(&environment)?;
        Ok(json!({"success": true, "environment": environment}))
    }

    fn environment_update(&self, args: &Value) -> Result<Value, AppError> {
        let mut environment = self.require_environment(args)?;
        if let Some(value) = args.get("name").filter(|v| !v.is_null()) {
            environment.name = self.validation.ensure_name(value, "Environment name")?;
        }
        if let Some(variables) = self
            .validation
            .ensure_optional_string_map(args.get("variables"), "variables")?
        {
            environment.variables = variables;
        }
        environment.updated_at = self.clock.now_ms();
        self.store.put_environment(&environment)?;
        Ok(json!({"success": true, "environment": environment}))
    }
}
