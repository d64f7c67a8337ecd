//! Snapshot storage trait with in-memory and SQLite implementations.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::model::AppData;

/// Trait for fallback snapshot backends.
///
/// A backend holds at most one snapshot and always replaces it whole.
pub trait SnapshotStorage: Send + Sync {
  /// The last confirmed-good snapshot, if one was ever stored.
  fn get(&self) -> Result<Option<AppData>>;

  /// Replace the snapshot with `data`.
  fn set(&self, data: &AppData) -> Result<()>;
}

/// Process-lifetime storage; the default.
#[derive(Default)]
pub struct MemoryStorage {
  snapshot: Mutex<Option<AppData>>,
}

impl SnapshotStorage for MemoryStorage {
  fn get(&self) -> Result<Option<AppData>> {
    let guard = self
      .snapshot
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(guard.clone())
  }

  fn set(&self, data: &AppData) -> Result<()> {
    let mut guard = self
      .snapshot
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    *guard = Some(data.clone());
    Ok(())
  }
}

/// Durable variant: one fixed-key row in SQLite, surviving restarts.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

/// The aggregate is stored under a single fixed key.
const SNAPSHOT_KEY: &str = "appdata";

/// Schema for the snapshot table.
const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS snapshot (
    key TEXT PRIMARY KEY,
    data BLOB NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

impl SqliteStorage {
  /// Open or create the snapshot database at the default location.
  pub fn open() -> Result<Self> {
    let path = Self::default_path()?;
    Self::open_at(&path)
  }

  /// Open or create the snapshot database at an explicit path.
  pub fn open_at(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    Self::from_connection(conn)
  }

  /// In-memory database, used by tests.
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory cache database: {}", e))?;

    Self::from_connection(conn)
  }

  fn from_connection(conn: Connection) -> Result<Self> {
    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  /// Get the default database path.
  fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("prodlog").join("cache.db"))
  }
}

impl SnapshotStorage for SqliteStorage {
  fn get(&self) -> Result<Option<AppData>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT data FROM snapshot WHERE key = ?")
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let row: Option<Vec<u8>> = stmt.query_row(params![SNAPSHOT_KEY], |row| row.get(0)).ok();

    match row {
      Some(blob) => {
        let snapshot: AppData = serde_json::from_slice(&blob)
          .map_err(|e| eyre!("Failed to deserialize snapshot: {}", e))?;
        Ok(Some(snapshot))
      }
      None => Ok(None),
    }
  }

  fn set(&self, data: &AppData) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let blob =
      serde_json::to_vec(data).map_err(|e| eyre!("Failed to serialize snapshot: {}", e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO snapshot (key, data, cached_at) VALUES (?, ?, datetime('now'))",
        params![SNAPSHOT_KEY, blob],
      )
      .map_err(|e| eyre!("Failed to store snapshot: {}", e))?;

    Ok(())
  }
}
