//! SQLite persistence for the versioned application record.
//!
//! The persisted part of the state is stored as one JSON document under a
//! fixed key:
//!
//! ```json
//! { "version": 1, "state": { "tasks": [], "settings": {}, "stats": {}, "achievements": [], "costume": null } }
//! ```
//!
//! Older versions are brought forward by a chain of pure upgrade steps.

use crate::ledger::ensure_canonical_achievements;
use crate::models::{default_achievements, AppData, UserStats};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Key the record is stored under.
pub const STORAGE_KEY: &str = "figurine-focus-storage";
/// Version written by this build.
pub const CURRENT_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to create database directory")]
    DirectoryCreation,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MigrationError {
    #[error("unsupported storage version {0}")]
    UnsupportedVersion(u32),
    #[error("malformed storage record: {0}")]
    Malformed(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    version: u32,
    state: Value,
}

/// Brings a stored `state` written at `version` up to the current layout.
pub fn migrate(version: u32, state: Value) -> Result<AppData, MigrationError> {
    if version > CURRENT_VERSION {
        return Err(MigrationError::UnsupportedVersion(version));
    }

    let mut version = version;
    let mut state = state;
    while version < CURRENT_VERSION {
        state = match version {
            0 => upgrade_v0(state)?,
            other => return Err(MigrationError::UnsupportedVersion(other)),
        };
        version += 1;
    }

    let mut data: AppData =
        serde_json::from_value(state).map_err(|e| MigrationError::Malformed(e.to_string()))?;
    data.achievements = ensure_canonical_achievements(data.achievements);
    data.settings = data.settings.normalized();
    Ok(data)
}

/// Version 0 records predate statistics and achievements.
fn upgrade_v0(state: Value) -> Result<Value, MigrationError> {
    let Value::Object(mut map) = state else {
        return Err(MigrationError::Malformed("expected an object".to_string()));
    };
    let stats = serde_json::to_value(UserStats::default())
        .map_err(|e| MigrationError::Malformed(e.to_string()))?;
    let achievements = serde_json::to_value(default_achievements())
        .map_err(|e| MigrationError::Malformed(e.to_string()))?;
    map.insert("stats".to_string(), stats);
    map.insert("achievements".to_string(), achievements);
    Ok(Value::Object(map))
}

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens the database at the default per-user location.
    pub fn new() -> Result<Self, DatabaseError> {
        Self::open(&Self::db_path())
    }

    /// Opens (creating if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|_| DatabaseError::DirectoryCreation)?;
            }
        }

        let conn = Connection::open(path)?;
        Self::initialize_tables(&conn)?;
        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing).
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_tables(&conn)?;
        Ok(Self { conn })
    }

    fn initialize_tables(conn: &Connection) -> Result<(), DatabaseError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
        "#,
        )?;
        Ok(())
    }

    fn db_path() -> PathBuf {
        ProjectDirs::from("com", "figurine", "FigurineFocus")
            .map(|dirs| dirs.data_dir().join("figurine-focus.db"))
            .unwrap_or_else(|| PathBuf::from("figurine-focus.db"))
    }

    pub(crate) fn load_raw(&self) -> Result<Option<String>, DatabaseError> {
        let raw = self
            .conn
            .query_row(
                "SELECT value FROM storage WHERE key = ?1",
                [STORAGE_KEY],
                |row| row.get(0),
            )
            .optional()?;
        Ok(raw)
    }

    /// Loads the stored record.
    ///
    /// A missing, corrupt or unrecognised record yields the default state;
    /// only SQLite failures are returned as errors.
    pub fn load_data(&self) -> Result<AppData, DatabaseError> {
        let Some(raw) = self.load_raw()? else {
            return Ok(AppData::default());
        };

        let envelope: Envelope = match serde_json::from_str(&raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                log::warn!("stored record is not readable, starting fresh: {}", e);
                return Ok(AppData::default());
            }
        };

        match migrate(envelope.version, envelope.state) {
            Ok(data) => Ok(data),
            Err(e) => {
                log::warn!("could not migrate stored record, starting fresh: {}", e);
                Ok(AppData::default())
            }
        }
    }

    /// Saves the record at the current version.
    pub fn save_data(&self, data: &AppData) -> Result<(), DatabaseError> {
        let envelope = Envelope {
            version: CURRENT_VERSION,
            state: serde_json::to_value(data)?,
        };
        let json = serde_json::to_string(&envelope)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO storage (key, value) VALUES (?1, ?2)",
            params![STORAGE_KEY, json],
        )?;
        Ok(())
    }

    /// Deletes the stored record.
    pub fn clear(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute("DELETE FROM storage WHERE key = ?1", [STORAGE_KEY])?;
        Ok(())
    }

    #[cfg(test)]
    fn put_raw(&self, value: &str) {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO storage (key, value) VALUES (?1, ?2)",
                params![STORAGE_KEY, value],
            )
            .unwrap();
    }
}
