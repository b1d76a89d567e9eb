//! Persistence collaborator. Every implementation owns the cascade rules:
//! deleting a request removes its history, deleting a project removes its
//! requests, environments, history and shares, deleting a history entry removes
//! its shares, deleting a tag detaches it from every request, and deleting an
//! environment unselects it wherever it was selected.

mod memory_store;
mod sqlite_store;

pub use memory_store::MemoryStore;
pub use sqlite_store::SqliteStore;

use crate::domain::{Environment, HistoryEntry, Project, RequestDefinition, Share, Tag};
use crate::errors::AppError;

pub trait Store: Send + Sync {
    fn put_project(&self, project: &Project) -> Result<(), AppError>;
    fn get_project(&self, id: &str) -> Result<Option<Project>, AppError>;
    /// Newest first.
    fn list_projects(&self) -> Result<Vec<Project>, AppError>;
    fn delete_project(&self, id: &str) -> Result<bool, AppError>;

    fn put_request(&self, request: &RequestDefinition) -> Result<(), AppError>;
    fn get_request(&self, id: &str) -> Result<Option<RequestDefinition>, AppError>;
    fn list_requests(&self, project_id: &str) -> Result<Vec<RequestDefinition>, AppError>;
    fn delete_request(&self, id: &str) -> Result<bool, AppError>;

    fn put_tag(&self, tag: &Tag) -> Result<(), AppError>;
    fn get_tag(&self, id: &str) -> Result<Option<Tag>, AppError>;
    fn list_tags(&self) -> Result<Vec<Tag>, AppError>;
    fn delete_tag(&self, id: &str) -> Result<bool, AppError>;

    fn put_environment(&self, environment: &Environment) -> Result<(), AppError>;
    fn get_environment(&self, id: &str) -> Result<Option<Environment>, AppError>;
    fn list_environments(&self, project_id: &str) -> Result<Vec<Environment>, AppError>;
    fn delete_environment(&self, id: &str) -> Result<bool, AppError>;

    /// History is append-only; inserting an existing id is a conflict.
    fn insert_history(&self, entry: &HistoryEntry) -> Result<(), AppError>;
    fn get_history(&self, id: &str) -> Result<Option<HistoryEntry>, AppError>;
    /// Newest first, at most `limit` entries.
    fn list_history(&self, project_id: &str, limit: usize) -> Result<Vec<HistoryEntry>, AppError>;
    fn delete_history(&self, id: &str) -> Result<bool, AppError>;

    fn insert_share(&self, share: &Share) -> Result<(), AppError>;
    fn get_share_by_token(&self, token: &str) -> Result<Option<Share>, AppError>;
    fn list_shares(&self, project_id: &str) -> Result<Vec<Share>, AppError>;
    fn delete_share(&self, id: &str) -> Result<bool, AppError>;
}
