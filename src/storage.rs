// 💾 Local Persistence - Key-value blobs over SQLite
//
// Best-effort durability: three independent string blobs (records,
// reclaim pool, theme preference), read once at startup and written after
// every mutating store operation. A missing or corrupt blob degrades to
// the empty/default value; the in-memory store stays authoritative when a
// save fails.

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::path::Path;

use crate::member::Member;
use crate::store::MemberStore;

/// Blob keys.
pub const STUDENTS_KEY: &str = "students";
pub const POOL_KEY: &str = "deleted_control_numbers";
pub const THEME_KEY: &str = "theme";

// ============================================================================
// THEME PREFERENCE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Anything other than "dark" reads as the light default.
    pub fn parse(value: &str) -> Theme {
        if value == "dark" {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    pub fn toggled(&self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

// ============================================================================
// STORAGE
// ============================================================================

pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Open (or create) the database file and prepare the kv table.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        // WAL for crash recovery, as elsewhere in this family of tools
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Self::setup(&conn)?;
        Ok(Storage { conn })
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::setup(&conn)?;
        Ok(Storage { conn })
    }

    fn setup(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let mut statement = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let mut rows = statement.query(params![key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    // ========================================================================
    // STORE BLOBS
    // ========================================================================

    /// Load the persisted store state. Missing or unparseable blobs fall
    /// back to empty; this never fails.
    pub fn load_store(&self) -> MemberStore {
        let members: Vec<Member> = self
            .get(STUDENTS_KEY)
            .ok()
            .flatten()
            .and_then(|blob| serde_json::from_str(&blob).ok())
            .unwrap_or_default();

        let pool: Vec<String> = self
            .get(POOL_KEY)
            .ok()
            .flatten()
            .and_then(|blob| serde_json::from_str(&blob).ok())
            .unwrap_or_default();

        let mut store = MemberStore::new();
        store.replace_state(members, pool);
        store
    }

    /// Persist both store blobs.
    pub fn save_store(&self, store: &MemberStore) -> Result<()> {
        let members = serde_json::to_string(store.members())
            .context("Failed to serialize member records")?;
        let pool = serde_json::to_string(store.reclaimed_numbers())
            .context("Failed to serialize reclaim pool")?;

        self.put(STUDENTS_KEY, &members)?;
        self.put(POOL_KEY, &pool)?;
        Ok(())
    }

    // ========================================================================
    // THEME BLOB
    // ========================================================================

    pub fn load_theme(&self) -> Theme {
        self.get(THEME_KEY)
            .ok()
            .flatten()
            .map(|value| Theme::parse(&value))
            .unwrap_or_default()
    }

    pub fn save_theme(&self, theme: Theme) -> Result<()> {
        self.put(THEME_KEY, theme.as_str())
    }
}

// ============================================================================
// TESTS
// ============================================================================
