use super::Store;
use crate::domain::{Environment, HistoryEntry, Project, RequestDefinition, Share, Tag, Timestamp};
use crate::errors::AppError;
use indexmap::IndexMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Tables {
    projects: IndexMap<String, Project>,
    requests: IndexMap<String, RequestDefinition>,
    tags: IndexMap<String, Tag>,
    environments: IndexMap<String, Environment>,
    history: IndexMap<String, HistoryEntry>,
    shares: IndexMap<String, Share>,
}

impl Tables {
    fn remove_history_where<F>(&mut self, predicate: F)
    where
        F: Fn(&HistoryEntry) -> bool,
    {
        let doomed: Vec<String> = self
            .history
            .values()
            .filter(|entry| predicate(entry))
            .map(|entry| entry.id.clone())
            .collect();
        for id in &doomed {
            self.history.shift_remove(id);
        }
        self.shares.retain(|_, share| !doomed.contains(&share.history_id));
    }
}

/// In-process store; insertion order breaks ties between equal timestamps.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

fn newest_first<T: Clone>(items: impl Iterator<Item = T>, created_at: impl Fn(&T) -> Timestamp) -> Vec<T> {
    let mut out: Vec<T> = items.collect();
    out.reverse();
    out.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
    out
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, AppError> {
        self.tables
            .read()
            .map_err(|_| AppError::storage("Memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, AppError> {
        self.tables
            .write()
            .map_err(|_| AppError::storage("Memory store lock poisoned"))
    }
}

impl Store for MemoryStore {
    fn put_project(&self, project: &Project) -> Result<(), AppError> {
        self.write()?
            .projects
            .insert(project.id.clone(), project.clone());
        Ok(())
    }

    fn get_project(&self, id: &str) -> Result<Option<Project>, AppError> {
        Ok(self.read()?.projects.get(id).cloned())
    }

    fn list_projects(&self) -> Result<Vec<Project>, AppError> {
        let tables = self.read()?;
        Ok(newest_first(tables.projects.values().cloned(), |p| p.created_at))
    }

    fn delete_project(&self, id: &str) -> Result<bool, AppError> {
        let mut tables = self.write()?;
        if tables.projects.shift_remove(id).is_none() {
            return Ok(false);
        }
        tables.requests.retain(|_, request| request.project_id != id);
        tables.environments.retain(|_, env| env.project_id != id);
        tables.remove_history_where(|entry| entry.project_id == id);
        tables.shares.retain(|_, share| share.project_id != id);
        Ok(true)
    }

    fn put_request(&self, request: &RequestDefinition) -> Result<(), AppError> {
        self.write()?
            .requests
            .insert(request.id.clone(), request.clone());
        Ok(())
    }

    fn get_request(&self, id: &str) -> Result<Option<RequestDefinition>, AppError> {
        Ok(self.read()?.requests.get(id).cloned())
    }

    fn list_requests(&self, project_id: &str) -> Result<Vec<RequestDefinition>, AppError> {
        let tables = self.read()?;
        Ok(newest_first(
            tables
                .requests
                .values()
                .filter(|r| r.project_id == project_id)
                .cloned(),
            |r| r.created_at,
        ))
    }

    fn delete_request(&self, id: &str) -> Result<bool, AppError> {
        let mut tables = self.write()?;
        if tables.requests.shift_remove(id).is_none() {
            return Ok(false);
        }
        tables.remove_history_where(|entry| entry.request_id == id);
        Ok(true)
    }

    fn put_tag(&self, tag: &Tag) -> Result<(), AppError> {
        self.write()?.tags.insert(tag.id.clone(), tag.clone());
        Ok(())
    }

    fn get_tag(&self, id: &str) -> Result<Option<Tag>, AppError> {
        Ok(self.read()?.tags.get(id).cloned())
    }

    fn list_tags(&self) -> Result<Vec<Tag>, AppError> {
        let tables = self.read()?;
        Ok(newest_first(tables.tags.values().cloned(), |t| t.created_at))
    }

    fn delete_tag(&self, id: &str) -> Result<bool, AppError> {
        let mut tables = self.write()?;
        if tables.tags.shift_remove(id).is_none() {
            return Ok(false);
        }
        for request in tables.requests.values_mut() {
            request.tag_ids.retain(|tag_id| tag_id != id);
        }
        Ok(true)
    }

    fn put_environment(&self, environment: &Environment) -> Result<(), AppError> {
        self.write()?
            .environments
            .insert(environment.id.clone(), environment.clone());
        Ok(())
    }

    fn get_environment(&self, id: &str) -> Result<Option<Environment>, AppError> {
        Ok(self.read()?.environments.get(id).cloned())
    }

    fn list_environments(&self, project_id: &str) -> Result<Vec<Environment>, AppError> {
        let tables = self.read()?;
        Ok(newest_first(
            tables
                .environments
                .values()
                .filter(|e| e.project_id == project_id)
                .cloned(),
            |e| e.created_at,
        ))
    }

    fn delete_environment(&self, id: &str) -> Result<bool, AppError> {
        let mut tables = self.write()?;
        if tables.environments.shift_remove(id).is_none() {
            return Ok(false);
        }
        for project in tables.projects.values_mut() {
            if project.selected_environment_id.as_deref() == Some(id) {
                project.selected_environment_id = None;
            }
        }
        Ok(true)
    }

    fn insert_history(&self, entry: &HistoryEntry) -> Result<(), AppError> {
        let mut tables = self.write()?;
        if tables.history.contains_key(&entry.id) {
            return Err(AppError::conflict(format!(
                "History entry '{}' already exists",
                entry.id
            )));
        }
        tables.history.insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    fn get_history(&self, id: &str) -> Result<Option<HistoryEntry>, AppError> {
        Ok(self.read()?.history.get(id).cloned())
    }

    fn list_history(&self, project_id: &str, limit: usize) -> Result<Vec<HistoryEntry>, AppError> {
        let tables = self.read()?;
        let mut entries = newest_first(
            tables
                .history
                .values()
                .filter(|h| h.project_id == project_id)
                .cloned(),
            |h| h.timestamp,
        );
        entries.truncate(limit);
        Ok(entries)
    }

    fn delete_history(&self, id: &str) -> Result<bool, AppError> {
        let mut tables = self.write()?;
        let existed = tables.history.contains_key(id);
        tables.remove_history_where(|entry| entry.id == id);
        Ok(existed)
    }

    fn insert_share(&self, share: &Share) -> Result<(), AppError> {
        let mut tables = self.write()?;
        if tables
            .shares
            .values()
            .any(|existing| existing.share_token == share.share_token)
        {
            return Err(AppError::conflict("Share token already in use"));
        }
        tables.shares.insert(share.id.clone(), share.clone());
        Ok(())
    }

    fn get_share_by_token(&self, token: &str) -> Result<Option<Share>, AppError> {
        Ok(self
            .read()?
            .shares
            .values()
            .find(|share| share.share_token == token)
            .cloned())
    }

    fn list_shares(&self, project_id: &str) -> Result<Vec<Share>, AppError> {
        let tables = self.read()?;
        Ok(newest_first(
            tables
                .shares
                .values()
                .filter(|s| s.project_id == project_id)
                .cloned(),
            |s| s.created_at,
        ))
    }

    fn delete_share(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.write()?.shares.shift_remove(id).is_some())
    }
}
