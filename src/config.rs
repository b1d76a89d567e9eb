use crate::constants::{history, network};
use crate::services::logger::LogLevel;
use crate::utils::paths::{resolve_data_dir, resolve_db_path};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub store: StoreKind,
    /// `None` leaves the transport default in place.
    pub request_timeout: Option<Duration>,
    pub history_limit: usize,
    pub user_agent: String,
    pub log_level: LogLevel,
    /// Problems found while reading the environment, reported once logging is up.
    pub warnings: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            db_path: PathBuf::from(crate::constants::storage::DB_FILE_NAME),
            store: StoreKind::Memory,
            request_timeout: Some(Duration::from_millis(network::TIMEOUT_REQUEST_MS)),
            history_limit: history::DEFAULT_LIMIT,
            user_agent: network::USER_AGENT.to_string(),
            log_level: LogLevel::Info,
            warnings: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut config = Self::from_lookup(|key| std::env::var(key).ok());
        config.data_dir = resolve_data_dir();
        config.db_path = resolve_db_path();
        config
    }

    /// Everything except filesystem locations, read through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig {
            store: StoreKind::Sqlite,
            ..AppConfig::default()
        };
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(raw) = read("REQLAB_STORE") {
            match raw.to_lowercase().as_str() {
                "sqlite" => config.store = StoreKind::Sqlite,
                "memory" => config.store = StoreKind::Memory,
                _ => config
                    .warnings
                    .push(format!("REQLAB_STORE={} is not sqlite|memory; using sqlite", raw)),
            }
        }

        if let Some(raw) = read("REQLAB_REQUEST_TIMEOUT_MS") {
            match raw.parse::<u64>() {
                Ok(0) => config.request_timeout = None,
                Ok(ms) => config.request_timeout = Some(Duration::from_millis(ms)),
                Err(_) => config.warnings.push(format!(
                    "REQLAB_REQUEST_TIMEOUT_MS={} is not a number; using {}",
                    raw,
                    network::TIMEOUT_REQUEST_MS
                )),
            }
        }

        if let Some(raw) = read("REQLAB_HISTORY_LIMIT") {
            match raw.parse::<usize>() {
                Ok(limit) if (1..=history::MAX_LIMIT).contains(&limit) => {
                    config.history_limit = limit
                }
                _ => config.warnings.push(format!(
                    "REQLAB_HISTORY_LIMIT={} must be within 1..={}; using {}",
                    raw,
                    history::MAX_LIMIT,
                    history::DEFAULT_LIMIT
                )),
            }
        }

        if let Some(raw) = read("REQLAB_USER_AGENT") {
            config.user_agent = raw;
        }

        if let Some(raw) = read("REQLAB_LOG_LEVEL") {
            match LogLevel::parse(&raw) {
                Some(level) => config.log_level = level,
                None => config
                    .warnings
                    .push(format!("REQLAB_LOG_LEVEL={} is unknown; using info", raw)),
            }
        }

        config
    }
}
