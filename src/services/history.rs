use crate::constants::history::MAX_LIMIT;
use crate::domain::{new_id, ExecutionContext, ExecutionOutcome, HistoryEntry};
use crate::errors::AppError;
use crate::services::clock::Clock;
use crate::services::logger::Logger;
use crate::stores::Store;
use serde_json::json;
use std::sync::Arc;

/// Append-only log of execution attempts.
#[derive(Clone)]
pub struct HistoryRecorder {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    logger: Logger,
    default_limit: usize,
}

impl HistoryRecorder {
    pub fn new(
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        logger: Logger,
        default_limit: usize,
    ) -> Self {
        Self {
            store,
            clock,
            logger: logger.child("history"),
            default_limit: default_limit.clamp(1, MAX_LIMIT),
        }
    }

    /// Persists one entry and returns its id. A failure is logged and returned,
    /// but callers must not let it replace the outcome they already hold.
    pub fn record(
        &self,
        outcome: &ExecutionOutcome,
        context: &ExecutionContext,
    ) -> Result<String, AppError> {
        let entry = HistoryEntry::from_outcome(new_id(), outcome, context, self.clock.now_ms());
        match self.store.insert_history(&entry) {
            Ok(()) => {
                self.logger.debug(
                    "History entry recorded",
                    Some(&json!({
                        "history_id": entry.id,
                        "request_id": entry.request_id,
                        "success": outcome.success,
                    })),
                );
                Ok(entry.id)
            }
            Err(err) => {
                self.logger.error(
                    "Failed to persist history entry",
                    Some(&json!({
                        "project_id": context.project_id,
                        "request_id": context.request_id,
                        "error": err.message,
                    })),
                );
                Err(err)
            }
        }
    }

    /// Newest first. `None` uses the configured default; any limit is clamped to `1..=500`.
    pub fn list(&self, project_id: &str, limit: Option<usize>) -> Result<Vec<HistoryEntry>, AppError> {
        let limit = limit.unwrap_or(self.default_limit).clamp(1, MAX_LIMIT);
        self.store.list_history(project_id, limit)
    }

    pub fn get(&self, history_id: &str) -> Result<Option<HistoryEntry>, AppError> {
        self.store.get_history(history_id)
    }

    /// Removing an absent entry is not an error.
    pub fn delete(&self, history_id: &str) -> Result<bool, AppError> {
        self.store.delete_history(history_id)
    }
}
