//! Lightweight persisted preferences and the domain memory side-table.
//!
//! Captured exchanges are never written here; only user settings survive a
//! session.

use crate::models::UrlDisplayMode;
use anyhow::{anyhow, Context};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Most domains remembered at once
pub const MAX_REMEMBERED_DOMAINS: usize = 20;
/// Remembered domains older than this are dropped at load time
pub const DOMAIN_RETENTION_DAYS: i64 = 7;
/// Narrowest details panel width that will be restored
pub const MIN_DETAILS_PANEL_WIDTH: u32 = 300;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

const KEY_CLEAR_ON_NAVIGATE: &str = "clear_on_navigate";
const KEY_URL_DISPLAY_MODE: &str = "url_display_mode";
const KEY_DETAILS_PANEL_WIDTH: &str = "details_panel_width";

/// User preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub clear_on_navigate: bool,
    pub url_display_mode: UrlDisplayMode,
    details_panel_width: Option<u32>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            clear_on_navigate: true,
            url_display_mode: UrlDisplayMode::default(),
            details_panel_width: None,
        }
    }
}

impl Preferences {
    pub fn details_panel_width(&self) -> Option<u32> {
        self.details_panel_width
    }

    /// Widths narrower than the minimum are ignored
    pub fn set_details_panel_width(&mut self, width: u32) -> bool {
        if width >= MIN_DETAILS_PANEL_WIDTH {
            self.details_panel_width = Some(width);
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainMemoryEntry {
    pub domain: String,
    /// ms since epoch
    pub last_seen: i64,
}

/// Recently used domain filters, independent of buffer contents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainMemory {
    entries: Vec<DomainMemoryEntry>,
}

impl DomainMemory {
    pub fn from_entries(entries: Vec<DomainMemoryEntry>) -> Self {
        let mut memory = Self { entries: Vec::new() };
        for entry in entries {
            memory.remember(&entry.domain, entry.last_seen);
        }
        memory
    }

    /// Record use of `domain`, evicting the stalest entry past the cap
    pub fn remember(&mut self, domain: &str, now_ms: i64) {
        match self.entries.iter_mut().find(|e| e.domain == domain) {
            Some(entry) => entry.last_seen = entry.last_seen.max(now_ms),
            None => self.entries.push(DomainMemoryEntry {
                domain: domain.to_string(),
                last_seen: now_ms,
            }),
        }
        while self.entries.len() > MAX_REMEMBERED_DOMAINS {
            let oldest = self
                .entries
                .iter()
                .enumerate()
                .min_by_key(|(_, e)| e.last_seen)
                .map(|(idx, _)| idx);
            match oldest {
                Some(idx) => {
                    self.entries.remove(idx);
                }
                None => break,
            }
        }
    }

    /// Drop entries not seen within the retention window
    pub fn prune(&mut self, now_ms: i64) -> usize {
        let cutoff = now_ms - DOMAIN_RETENTION_DAYS * DAY_MS;
        let before = self.entries.len();
        self.entries.retain(|e| e.last_seen >= cutoff);
        before - self.entries.len()
    }

    pub fn contains(&self, domain: &str) -> bool {
        self.entries.iter().any(|e| e.domain == domain)
    }

    /// Domains, most recently seen first
    pub fn domains(&self) -> Vec<String> {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        entries.into_iter().map(|e| e.domain).collect()
    }

    pub fn entries(&self) -> &[DomainMemoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// SQLite-backed key/value preference store
pub struct PreferenceStore {
    db: Arc<Mutex<Connection>>,
    db_path: PathBuf,
}

fn lock(db: &Mutex<Connection>) -> anyhow::Result<std::sync::MutexGuard<'_, Connection>> {
    db.lock().map_err(|e| anyhow!("db mutex poisoned: {}", e))
}

impl PreferenceStore {
    pub fn open(base_path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let dir = base_path.as_ref();
        if !dir.exists() {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating storage directory {:?}", dir))?;
        }
        let db_path = dir.join("echo_preferences.sqlite");
        let conn = Connection::open(&db_path)
            .with_context(|| format!("opening database at {:?}", db_path))?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS preferences (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS domain_memory (
                domain TEXT PRIMARY KEY,
                last_seen INTEGER NOT NULL
            );
            ",
        )?;
        tracing::debug!("Preference store opened at {:?}", db_path);

        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
            db_path,
        })
    }

    pub async fn load_preferences(&self) -> anyhow::Result<Preferences> {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || -> anyhow::Result<Preferences> {
            let conn = lock(&db)?;
            let mut prefs = Preferences::default();
            if let Some(value) = read_value::<bool>(&conn, KEY_CLEAR_ON_NAVIGATE)? {
                prefs.clear_on_navigate = value;
            }
            if let Some(value) = read_value::<UrlDisplayMode>(&conn, KEY_URL_DISPLAY_MODE)? {
                prefs.url_display_mode = value;
            }
            if let Some(width) = read_value::<u32>(&conn, KEY_DETAILS_PANEL_WIDTH)? {
                if !prefs.set_details_panel_width(width) {
                    tracing::debug!("Ignoring stored panel width {}", width);
                }
            }
            Ok(prefs)
        })
        .await?
    }

    pub async fn save_preferences(&self, prefs: &Preferences) -> anyhow::Result<()> {
        let db = Arc::clone(&self.db);
        let prefs = prefs.clone();
        tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            let mut conn = lock(&db)?;
            let tx = conn.transaction()?;
            write_value(&tx, KEY_CLEAR_ON_NAVIGATE, &prefs.clear_on_navigate)?;
            write_value(&tx, KEY_URL_DISPLAY_MODE, &prefs.url_display_mode)?;
            match prefs.details_panel_width {
                Some(width) => write_value(&tx, KEY_DETAILS_PANEL_WIDTH, &width)?,
                None => {
                    tx.execute(
                        "DELETE FROM preferences WHERE key = ?1",
                        params![KEY_DETAILS_PANEL_WIDTH],
                    )?;
                }
            }
            tx.commit().context("saving preferences")
        })
        .await?
    }

    /// Load remembered domains, pruning stale entries from disk as well
    pub async fn load_domain_memory(&self, now_ms: i64) -> anyhow::Result<DomainMemory> {
        let db = Arc::clone(&self.db);
        let cutoff = now_ms - DOMAIN_RETENTION_DAYS * DAY_MS;
        let (memory, pruned) =
            tokio::task::spawn_blocking(move || -> anyhow::Result<(DomainMemory, usize)> {
                let conn = lock(&db)?;
                let pruned = conn.execute(
                    "DELETE FROM domain_memory WHERE last_seen < ?1",
                    params![cutoff],
                )?;
                let mut stmt = conn.prepare(
                    "SELECT domain, last_seen FROM domain_memory ORDER BY last_seen DESC",
                )?;
                let mut rows = stmt.query([])?;
                let mut entries = Vec::new();
                while let Some(row) = rows.next()? {
                    entries.push(DomainMemoryEntry {
                        domain: row.get(0)?,
                        last_seen: row.get(1)?,
                    });
                }
                Ok((DomainMemory::from_entries(entries), pruned))
            })
            .await??;

        if pruned > 0 {
            tracing::info!(
                "Pruned {} remembered domains older than {} days",
                pruned,
                DOMAIN_RETENTION_DAYS
            );
        }
        Ok(memory)
    }

    /// Replace the stored table with `memory`
    pub async fn save_domain_memory(&self, memory: &DomainMemory) -> anyhow::Result<()> {
        let db = Arc::clone(&self.db);
        let entries = memory.entries().to_vec();
        tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            let mut conn = lock(&db)?;
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM domain_memory", [])?;
            for entry in &entries {
                tx.execute(
                    "INSERT INTO domain_memory (domain, last_seen) VALUES (?1, ?2)",
                    params![entry.domain, entry.last_seen],
                )?;
            }
            tx.commit().context("saving domain memory")
        })
        .await?
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

fn read_value<T: for<'de> Deserialize<'de>>(
    conn: &Connection,
    key: &str,
) -> anyhow::Result<Option<T>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value FROM preferences WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;
    match raw {
        Some(raw) => match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                tracing::warn!("Ignoring unreadable preference {}: {}", key, err);
                Ok(None)
            }
        },
        None => Ok(None),
    }
}

fn write_value<T: Serialize>(conn: &Connection, key: &str, value: &T) -> anyhow::Result<()> {
    let raw = serde_json::to_string(value)?;
    conn.execute(
        "INSERT OR REPLACE INTO preferences (key, value) VALUES (?1, ?2)",
        params![key, raw],
    )
    .with_context(|| format!("writing preference {key}"))?;
    Ok(())
}
