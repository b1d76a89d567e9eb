use super::Store;
use crate::domain::{Environment, HistoryEntry, Project, RequestDefinition, Share, Tag};
use crate::errors::AppError;
use crate::utils::paths::ensure_dir_for_file;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS projects (
  id TEXT PRIMARY KEY,
  name TEXT NOT NULL,
  selected_environment_id TEXT,
  created_at INTEGER NOT NULL,
  updated_at INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS requests (
  id TEXT PRIMARY KEY,
  project_id TEXT NOT NULL,
  name TEXT NOT NULL,
  method TEXT NOT NULL,
  url TEXT NOT NULL,
  headers TEXT NOT NULL,
  query_params TEXT NOT NULL,
  body TEXT,
  tag_ids TEXT NOT NULL,
  created_at INTEGER NOT NULL,
  updated_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS requests_by_project ON requests(project_id);
CREATE TABLE IF NOT EXISTS tags (
  id TEXT PRIMARY KEY,
  name TEXT NOT NULL,
  color TEXT NOT NULL,
  icon TEXT,
  description TEXT,
  headers TEXT NOT NULL,
  query_params TEXT NOT NULL,
  created_at INTEGER NOT NULL,
  updated_at INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS environments (
  id TEXT PRIMARY KEY,
  project_id TEXT NOT NULL,
  name TEXT NOT NULL,
  variables TEXT NOT NULL,
  created_at INTEGER NOT NULL,
  updated_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS environments_by_project ON environments(project_id);
CREATE TABLE IF NOT EXISTS history (
  id TEXT PRIMARY KEY,
  project_id TEXT NOT NULL,
  request_id TEXT NOT NULL,
  environment_id TEXT,
  method TEXT NOT NULL,
  url TEXT NOT NULL,
  resolved_url TEXT NOT NULL,
  resolved_headers TEXT NOT NULL,
  resolved_query_params TEXT NOT NULL,
  resolved_body TEXT,
  status INTEGER,
  status_text TEXT,
  response_headers TEXT,
  response_body TEXT,
  error TEXT,
  duration INTEGER NOT NULL,
  timestamp INTEGER NOT NULL,
  created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS history_by_project ON history(project_id, timestamp);
CREATE INDEX IF NOT EXISTS history_by_request ON history(request_id);
CREATE TABLE IF NOT EXISTS shares (
  id TEXT PRIMARY KEY,
  project_id TEXT NOT NULL,
  history_id TEXT NOT NULL,
  share_token TEXT NOT NULL UNIQUE,
  is_public INTEGER NOT NULL,
  created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS shares_by_history ON shares(history_id);
";

const HISTORY_COLUMNS: &str = "id, project_id, request_id, environment_id, method, url, \
    resolved_url, resolved_headers, resolved_query_params, resolved_body, status, status_text, \
    response_headers, response_body, error, duration, timestamp, created_at";

/// SQLite-backed store. String maps are kept as JSON text in insertion order.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

fn to_json<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string(value).map_err(AppError::from)
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|err| conversion_error(idx, err))
}

fn optional_json_column<T: DeserializeOwned>(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|text| serde_json::from_str(&text).map_err(|err| conversion_error(idx, err)))
        .transpose()
}

fn parsed_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = AppError>,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|err| conversion_error(idx, err))
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        selected_environment_id: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn request_from_row(row: &Row<'_>) -> rusqlite::Result<RequestDefinition> {
    Ok(RequestDefinition {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        method: parsed_column(row, 3)?,
        url: row.get(4)?,
        headers: json_column(row, 5)?,
        query_params: json_column(row, 6)?,
        body: row.get(7)?,
        tag_ids: json_column(row, 8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn tag_from_row(row: &Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
        color: parsed_column(row, 2)?,
        icon: row.get(3)?,
        description: row.get(4)?,
        headers: json_column(row, 5)?,
        query_params: json_column(row, 6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn environment_from_row(row: &Row<'_>) -> rusqlite::Result<Environment> {
    Ok(Environment {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        variables: json_column(row, 3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn history_from_row(row: &Row<'_>) -> rusqlite::Result<HistoryEntry> {
    let status: Option<i64> = row.get(10)?;
    let duration: i64 = row.get(15)?;
    Ok(HistoryEntry {
        id: row.get(0)?,
        project_id: row.get(1)?,
        request_id: row.get(2)?,
        environment_id: row.get(3)?,
        method: parsed_column(row, 4)?,
        url: row.get(5)?,
        resolved_url: row.get(6)?,
        resolved_headers: json_column(row, 7)?,
        resolved_query_params: json_column(row, 8)?,
        resolved_body: row.get(9)?,
        status: status.map(|code| code as u16),
        status_text: row.get(11)?,
        response_headers: optional_json_column(row, 12)?,
        response_body: row.get(13)?,
        error: row.get(14)?,
        duration: duration.max(0) as u64,
        timestamp: row.get(16)?,
        created_at: row.get(17)?,
    })
}

fn share_from_row(row: &Row<'_>) -> rusqlite::Result<Share> {
    Ok(Share {
        id: row.get(0)?,
        project_id: row.get(1)?,
        history_id: row.get(2)?,
        share_token: row.get(3)?,
        is_public: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn delete_history_rows(conn: &Connection, filter_column: &str, value: &str) -> rusqlite::Result<usize> {
    conn.execute(
        &format!(
            "DELETE FROM shares WHERE history_id IN (SELECT id FROM history WHERE {} = ?1)",
            filter_column
        ),
        params![value],
    )?;
    conn.execute(
        &format!("DELETE FROM history WHERE {} = ?1", filter_column),
        params![value],
    )
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, AppError> {
        ensure_dir_for_file(path).map_err(|err| {
            AppError::storage(format!("Failed to create data directory: {}", err))
        })?;
        let conn = Connection::open(path)
            .map_err(|err| AppError::storage(format!("Failed to open SQLite: {}", err)))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|err| AppError::storage(format!("Failed to set SQLite journal mode: {}", err)))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, AppError> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, AppError> {
        conn.execute_batch(SCHEMA)
            .map_err(|err| AppError::storage(format!("Failed to initialize SQLite schema: {}", err)))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, AppError> {
        self.conn
            .lock()
            .map_err(|_| AppError::storage("SQLite connection lock poisoned"))
    }
}

impl Store for SqliteStore {
    fn put_project(&self, project: &Project) -> Result<(), AppError> {
        self.lock()?.execute(
            "INSERT INTO projects (id, name, selected_environment_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
               name = excluded.name,
               selected_environment_id = excluded.selected_environment_id,
               updated_at = excluded.updated_at",
            params![
                project.id,
                project.name,
                project.selected_environment_id,
                project.created_at,
                project.updated_at
            ],
        )?;
        Ok(())
    }

    fn get_project(&self, id: &str) -> Result<Option<Project>, AppError> {
        Ok(self
            .lock()?
            .query_row(
                "SELECT id, name, selected_environment_id, created_at, updated_at
                 FROM projects WHERE id = ?1",
                params![id],
                project_from_row,
            )
            .optional()?)
    }

    fn list_projects(&self) -> Result<Vec<Project>, AppError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, selected_environment_id, created_at, updated_at
             FROM projects ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt.query_map([], project_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn delete_project(&self, id: &str) -> Result<bool, AppError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let removed = tx.execute("DELETE FROM projects WHERE id = ?1", params![id])?;
        if removed > 0 {
            tx.execute("DELETE FROM requests WHERE project_id = ?1", params![id])?;
            tx.execute("DELETE FROM environments WHERE project_id = ?1", params![id])?;
            delete_history_rows(&tx, "project_id", id)?;
            tx.execute("DELETE FROM shares WHERE project_id = ?1", params![id])?;
        }
        tx.commit()?;
        Ok(removed > 0)
    }

    fn put_request(&self, request: &RequestDefinition) -> Result<(), AppError> {
        let headers = to_json(&request.headers)?;
        let query_params = to_json(&request.query_params)?;
        let tag_ids = to_json(&request.tag_ids)?;
        self.lock()?.execute(
            "INSERT INTO requests (id, project_id, name, method, url, headers, query_params, body,
               tag_ids, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(id) DO UPDATE SET
               name = excluded.name,
               method = excluded.method,
               url = excluded.url,
               headers = excluded.headers,
               query_params = excluded.query_params,
               body = excluded.body,
               tag_ids = excluded.tag_ids,
               updated_at = excluded.updated_at",
            params![
                request.id,
                request.project_id,
                request.name,
                request.method.as_str(),
                request.url,
                headers,
                query_params,
                request.body,
                tag_ids,
                request.created_at,
                request.updated_at
            ],
        )?;
        Ok(())
    }

    fn get_request(&self, id: &str) -> Result<Option<RequestDefinition>, AppError> {
        Ok(self
            .lock()?
            .query_row(
                "SELECT id, project_id, name, method, url, headers, query_params, body, tag_ids,
                   created_at, updated_at
                 FROM requests WHERE id = ?1",
                params![id],
                request_from_row,
            )
            .optional()?)
    }

    fn list_requests(&self, project_id: &str) -> Result<Vec<RequestDefinition>, AppError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, project_id, name, method, url, headers, query_params, body, tag_ids,
               created_at, updated_at
             FROM requests WHERE project_id = ?1 ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt.query_map(params![project_id], request_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn delete_request(&self, id: &str) -> Result<bool, AppError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let removed = tx.execute("DELETE FROM requests WHERE id = ?1", params![id])?;
        if removed > 0 {
            delete_history_rows(&tx, "request_id", id)?;
        }
        tx.commit()?;
        Ok(removed > 0)
    }

    fn put_tag(&self, tag: &Tag) -> Result<(), AppError> {
        let headers = to_json(&tag.headers)?;
        let query_params = to_json(&tag.query_params)?;
        self.lock()?.execute(
            "INSERT INTO tags (id, name, color, icon, description, headers, query_params,
               created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
               name = excluded.name,
               color = excluded.color,
               icon = excluded.icon,
               description = excluded.description,
               headers = excluded.headers,
               query_params = excluded.query_params,
               updated_at = excluded.updated_at",
            params![
                tag.id,
                tag.name,
                tag.color.as_str(),
                tag.icon,
                tag.description,
                headers,
                query_params,
                tag.created_at,
                tag.updated_at
            ],
        )?;
        Ok(())
    }

    fn get_tag(&self, id: &str) -> Result<Option<Tag>, AppError> {
        Ok(self
            .lock()?
            .query_row(
                "SELECT id, name, color, icon, description, headers, query_params, created_at,
                   updated_at
                 FROM tags WHERE id = ?1",
                params![id],
                tag_from_row,
            )
            .optional()?)
    }

    fn list_tags(&self) -> Result<Vec<Tag>, AppError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, color, icon, description, headers, query_params, created_at,
               updated_at
             FROM tags ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt.query_map([], tag_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn delete_tag(&self, id: &str) -> Result<bool, AppError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let removed = tx.execute("DELETE FROM tags WHERE id = ?1", params![id])?;
        if removed > 0 {
            let attached: Vec<(String, Vec<String>)> = {
                let mut stmt = tx.prepare("SELECT id, tag_ids FROM requests")?;
                let rows = stmt.query_map([], |row| Ok((row.get(0)?, json_column(row, 1)?)))?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            };
            for (request_id, tag_ids) in attached {
                if !tag_ids.iter().any(|tag_id| tag_id == id) {
                    continue;
                }
                let remaining: Vec<&String> = tag_ids.iter().filter(|tag_id| *tag_id != id).collect();
                tx.execute(
                    "UPDATE requests SET tag_ids = ?1 WHERE id = ?2",
                    params![to_json(&remaining)?, request_id],
                )?;
            }
        }
        tx.commit()?;
        Ok(removed > 0)
    }

    fn put_environment(&self, environment: &Environment) -> Result<(), AppError> {
        let variables = to_json(&environment.variables)?;
        self.lock()?.execute(
            "INSERT INTO environments (id, project_id, name, variables, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
               name = excluded.name,
               variables = excluded.variables,
               updated_at = excluded.updated_at",
            params![
                environment.id,
                environment.project_id,
                environment.name,
                variables,
                environment.created_at,
                environment.updated_at
            ],
        )?;
        Ok(())
    }

    fn get_environment(&self, id: &str) -> Result<Option<Environment>, AppError> {
        Ok(self
            .lock()?
            .query_row(
                "SELECT id, project_id, name, variables, created_at, updated_at
                 FROM environments WHERE id = ?1",
                params![id],
                environment_from_row,
            )
            .optional()?)
    }

    fn list_environments(&self, project_id: &str) -> Result<Vec<Environment>, AppError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, project_id, name, variables, created_at, updated_at
             FROM environments WHERE project_id = ?1 ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt.query_map(params![project_id], environment_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn delete_environment(&self, id: &str) -> Result<bool, AppError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let removed = tx.execute("DELETE FROM environments WHERE id = ?1", params![id])?;
        if removed > 0 {
            tx.execute(
                "UPDATE projects SET selected_environment_id = NULL
                 WHERE selected_environment_id = ?1",
                params![id],
            )?;
        }
        tx.commit()?;
        Ok(removed > 0)
    }

    fn insert_history(&self, entry: &HistoryEntry) -> Result<(), AppError> {
        let resolved_headers = to_json(&entry.resolved_headers)?;
        let resolved_query_params = to_json(&entry.resolved_query_params)?;
        let response_headers = entry
            .response_headers
            .as_ref()
            .map(to_json)
            .transpose()?;
        let result = self.lock()?.execute(
            &format!(
                "INSERT INTO history ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                   ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
                HISTORY_COLUMNS
            ),
            params![
                entry.id,
                entry.project_id,
                entry.request_id,
                entry.environment_id,
                entry.method.as_str(),
                entry.url,
                entry.resolved_url,
                resolved_headers,
                resolved_query_params,
                entry.resolved_body,
                entry.status.map(i64::from),
                entry.status_text,
                response_headers,
                entry.response_body,
                entry.error,
                entry.duration.min(i64::MAX as u64) as i64,
                entry.timestamp,
                entry.created_at
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(AppError::conflict(format!(
                    "History entry '{}' already exists",
                    entry.id
                )))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn get_history(&self, id: &str) -> Result<Option<HistoryEntry>, AppError> {
        Ok(self
            .lock()?
            .query_row(
                &format!("SELECT {} FROM history WHERE id = ?1", HISTORY_COLUMNS),
                params![id],
                history_from_row,
            )
            .optional()?)
    }

    fn list_history(&self, project_id: &str, limit: usize) -> Result<Vec<HistoryEntry>, AppError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM history WHERE project_id = ?1
             ORDER BY timestamp DESC, rowid DESC LIMIT ?2",
            HISTORY_COLUMNS
        ))?;
        let rows = stmt.query_map(params![project_id, limit as i64], history_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn delete_history(&self, id: &str) -> Result<bool, AppError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let removed = delete_history_rows(&tx, "id", id)?;
        tx.commit()?;
        Ok(removed > 0)
    }

    fn insert_share(&self, share: &Share) -> Result<(), AppError> {
        let result = self.lock()?.execute(
            "INSERT INTO shares (id, project_id, history_id, share_token, is_public, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                share.id,
                share.project_id,
                share.history_id,
                share.share_token,
                share.is_public,
                share.created_at
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(AppError::conflict("Share token already in use"))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn get_share_by_token(&self, token: &str) -> Result<Option<Share>, AppError> {
        Ok(self
            .lock()?
            .query_row(
                "SELECT id, project_id, history_id, share_token, is_public, created_at
                 FROM shares WHERE share_token = ?1",
                params![token],
                share_from_row,
            )
            .optional()?)
    }

    fn list_shares(&self, project_id: &str) -> Result<Vec<Share>, AppError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, project_id, history_id, share_token, is_public, created_at
             FROM shares WHERE project_id = ?1 ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt.query_map(params![project_id], share_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn delete_share(&self, id: &str) -> Result<bool, AppError> {
        let removed = self
            .lock()?
            .execute("DELETE FROM shares WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }
}
