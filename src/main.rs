use clap::{Parser, ValueEnum};
use reqlab::config::{AppConfig, StoreKind};
use reqlab::services::logger::LogLevel;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StoreArg {
    Sqlite,
    Memory,
}

/// JSON-RPC request workbench over stdio.
#[derive(Debug, Parser)]
#[command(name = "reqlab", version)]
struct Cli {
    /// Persistence backend (overrides REQLAB_STORE).
    #[arg(long, value_enum)]
    store: Option<StoreArg>,
    /// SQLite database file (overrides REQLAB_DB_PATH).
    #[arg(long)]
    db: Option<PathBuf>,
    /// Per-request timeout in milliseconds, 0 disables it.
    #[arg(long)]
    timeout_ms: Option<u64>,
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn apply(self, config: &mut AppConfig) {
        if let Some(store) = self.store {
            config.store = match store {
                StoreArg::Sqlite => StoreKind::Sqlite,
                StoreArg::Memory => StoreKind::Memory,
            };
        }
        if let Some(db) = self.db {
            config.db_path = db;
        }
        if let Some(ms) = self.timeout_ms {
            config.request_timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }
        if let Some(raw) = self.log_level {
            match LogLevel::parse(&raw) {
                Some(level) => config.log_level = level,
                None => config
                    .warnings
                    .push(format!("--log-level {} is unknown; ignoring", raw)),
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let mut config = AppConfig::from_env();
    Cli::parse().apply(&mut config);
    if let Err(err) = reqlab::rpc::server::run_stdio(config).await {
        eprintln!("reqlab: {}", err);
        std::process::exit(1);
    }
}
