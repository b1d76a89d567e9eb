use crate::config::{AppConfig, StoreKind};
use crate::errors::AppError;
use crate::managers::request::RequestManager;
use crate::managers::workspace::WorkspaceManager;
use crate::services::clock::{Clock, SystemClock};
use crate::services::executor::HttpExecutor;
use crate::services::history::HistoryRecorder;
use crate::services::logger::Logger;
use crate::services::policy::{StoreTagSource, TagPolicyLoader};
use crate::services::share::ShareService;
use crate::services::token::{OsTokenGenerator, TokenGenerator};
use crate::services::validation::Validation;
use crate::stores::{MemoryStore, SqliteStore, Store};
use serde_json::json;
use std::sync::Arc;

pub struct App {
    pub config: AppConfig,
    pub logger: Logger,
    pub store: Arc<dyn Store>,
    pub workspace: Arc<WorkspaceManager>,
    pub requests: Arc<RequestManager>,
}

impl App {
    pub fn initialize(config: AppConfig) -> Result<Self, AppError> {
        let store: Arc<dyn Store> = match config.store {
            StoreKind::Sqlite => Arc::new(SqliteStore::open(&config.db_path)?),
            StoreKind::Memory => Arc::new(MemoryStore::new()),
        };
        Self::with_services(config, store, Arc::new(SystemClock), Arc::new(OsTokenGenerator))
    }

    /// Wires managers over caller-provided collaborators.
    pub fn with_services(
        config: AppConfig,
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        tokens: Arc<dyn TokenGenerator>,
    ) -> Result<Self, AppError> {
        let logger = Logger::new("reqlab", config.log_level);
        for warning in &config.warnings {
            logger.warn(warning, None);
        }
        let validation = Validation::new();

        let executor = Arc::new(HttpExecutor::new(
            logger.clone(),
            config.request_timeout,
            config.user_agent.clone(),
        )?);
        let tags = TagPolicyLoader::new(Arc::new(StoreTagSource::new(store.clone())), logger.clone());
        let history = HistoryRecorder::new(
            store.clone(),
            clock.clone(),
            logger.clone(),
            config.history_limit,
        );
        let shares = ShareService::new(store.clone(), tokens, clock.clone());

        let workspace = Arc::new(WorkspaceManager::new(
            logger.clone(),
            validation.clone(),
            store.clone(),
            clock,
        ));
        let requests = Arc::new(RequestManager::new(
            logger.clone(),
            validation,
            store.clone(),
            tags,
            executor,
            history,
            shares,
        ));

        logger.info(
            "Initialized",
            Some(&json!({
                "store": match config.store {
                    StoreKind::Sqlite => "sqlite",
                    StoreKind::Memory => "memory",
                },
                "db_path": config.db_path.display().to_string(),
                "timeout_ms": config.request_timeout.map(|t| t.as_millis() as u64),
            })),
        );

        Ok(Self {
            config,
            logger,
            store,
            workspace,
            requests,
        })
    }
}
