use crate::domain::{new_id, HistoryEntry, Share};
use crate::errors::AppError;
use crate::services::clock::Clock;
use crate::services::token::TokenGenerator;
use crate::stores::Store;
use std::sync::Arc;

/// Share links pointing at recorded history entries.
#[derive(Clone)]
pub struct ShareService {
    store: Arc<dyn Store>,
    tokens: Arc<dyn TokenGenerator>,
    clock: Arc<dyn Clock>,
}

impl ShareService {
    pub fn new(store: Arc<dyn Store>, tokens: Arc<dyn TokenGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            tokens,
            clock,
        }
    }

    pub fn create(&self, project_id: &str, history_id: &str, is_public: bool) -> Result<Share, AppError> {
        let entry = self.store.get_history(history_id)?.ok_or_else(|| {
            AppError::not_found(format!("History entry '{}' not found", history_id))
        })?;
        if entry.project_id != project_id {
            return Err(AppError::invalid_params(format!(
                "History entry '{}' does not belong to project '{}'",
                history_id, project_id
            )));
        }
        let share = Share {
            id: new_id(),
            project_id: project_id.to_string(),
            history_id: history_id.to_string(),
            share_token: self.tokens.generate(),
            is_public,
            created_at: self.clock.now_ms(),
        };
        self.store.insert_share(&share)?;
        Ok(share)
    }

    pub fn get_by_token(&self, token: &str) -> Result<Option<(Share, Option<HistoryEntry>)>, AppError> {
        match self.store.get_share_by_token(token)? {
            Some(share) => {
                let entry = self.store.get_history(&share.history_id)?;
                Ok(Some((share, entry)))
            }
            None => Ok(None),
        }
    }

    /// Newest first, each paired with the entry it points at.
    pub fn list(&self, project_id: &str) -> Result<Vec<(Share, Option<HistoryEntry>)>, AppError> {
        self.store
            .list_shares(project_id)?
            .into_iter()
            .map(|share| {
                let entry = self.store.get_history(&share.history_id)?;
                Ok((share, entry))
            })
            .collect()
    }

    pub fn delete(&self, share_id: &str) -> Result<bool, AppError> {
        self.store.delete_share(share_id)
    }
}
