use crate::constants::storage::{APP_DIR_NAME, DB_FILE_NAME};
use std::env;
use std::path::{Path, PathBuf};

fn normalize_env_path(value: Option<String>) -> Option<PathBuf> {
    let raw = value?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lowered = trimmed.to_lowercase();
    if lowered == "undefined" || lowered == "null" {
        return None;
    }
    Some(PathBuf::from(trimmed))
}

fn resolve_xdg_state_dir() -> Option<PathBuf> {
    if let Some(path) = normalize_env_path(env::var("XDG_STATE_HOME").ok()) {
        return Some(path);
    }
    env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".local").join("state"))
}

pub fn resolve_data_dir() -> PathBuf {
    if let Some(path) = normalize_env_path(env::var("REQLAB_DATA_DIR").ok()) {
        return path;
    }
    if let Some(path) = resolve_xdg_state_dir() {
        return path.join(APP_DIR_NAME);
    }
    env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(format!(".{}", APP_DIR_NAME))
}

pub fn resolve_db_path() -> PathBuf {
    if let Some(path) = normalize_env_path(env::var("REQLAB_DB_PATH").ok()) {
        return path;
    }
    resolve_data_dir().join(DB_FILE_NAME)
}

pub fn ensure_dir_for_file(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
