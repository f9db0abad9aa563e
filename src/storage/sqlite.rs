//! SQLite item store.
//!
//! One connection guarded by a mutex; every operation runs on the blocking
//! pool and holds the lock for exactly one statement batch or transaction,
//! so readers interleave between upserts and never see a half-written item.
//!
//! Schema versions are tracked through `PRAGMA user_version`.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::{AppError, Result};
use crate::models::{Item, ItemPage, ItemSummary, NewItem};
use crate::storage::{ItemStore, UpsertOutcome};

struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("migrations/0001_init.sql"),
}];

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed item store.
#[derive(Clone)]
pub struct SqliteItemStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteItemStore {
    /// Open (or create) a database file and apply pending migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut conn = Connection::open(path)?;
        let mode: String = conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
        log::debug!("Opened {} (journal_mode={})", path.display(), mode);

        bootstrap(&mut conn)?;
        Ok(Self::from_connection(conn))
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        bootstrap(&mut conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| AppError::storage("connection mutex poisoned"))?;
            f(&mut guard)
        })
        .await?
    }
}

fn bootstrap(conn: &mut Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_migrations(conn)
}

fn apply_migrations(conn: &mut Connection) -> Result<()> {
    let current: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let latest = MIGRATIONS.last().map_or(0, |m| m.version);

    if current > latest {
        return Err(AppError::storage(format!(
            "database schema version {current} is newer than supported {latest}"
        )));
    }
    if current == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    tx.commit()?;

    log::info!("Applied schema migrations {} -> {}", current, latest);
    Ok(())
}

fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn upsert_item(conn: &mut Connection, item: &NewItem) -> Result<UpsertOutcome> {
    let tx = conn.transaction()?;

    let exists = tx
        .query_row(
            "SELECT 1 FROM posts WHERE post_id = ?1",
            params![item.id],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    if exists.is_some() {
        return Ok(UpsertOutcome::AlreadyPresent);
    }

    let now = timestamp(Utc::now());
    tx.execute(
        "INSERT INTO posts (post_id, title, description, user_nick, signature, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        params![
            item.id,
            item.title,
            item.description,
            item.user_nick,
            item.signature,
            now
        ],
    )?;

    let mut images_stored = 0;
    let mut images_skipped = 0;
    {
        let mut stmt = tx.prepare_cached(
            "INSERT OR IGNORE INTO images (post_id, url, created_at) VALUES (?1, ?2, ?3)",
        )?;
        for url in &item.images {
            if stmt.execute(params![item.id, url, now])? == 1 {
                images_stored += 1;
            } else {
                log::debug!("Image already stored, skipping for post {}: {}", item.id, url);
                images_skipped += 1;
            }
        }
    }

    tx.commit()?;
    Ok(UpsertOutcome::Inserted {
        images_stored,
        images_skipped,
    })
}

fn list_page(conn: &Connection, page: u32, page_size: u32) -> Result<ItemPage> {
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
    let offset = i64::from(page - 1) * i64::from(page_size);

    let mut stmt = conn.prepare_cached(
        "SELECT p.post_id, p.title, p.description, p.user_nick, p.signature, p.created_at,
                COUNT(i.id) AS image_count
         FROM posts p
         LEFT JOIN images i ON i.post_id = p.post_id
         GROUP BY p.post_id
         ORDER BY p.created_at DESC, p.rowid DESC
         LIMIT ?1 OFFSET ?2",
    )?;
    let items = stmt
        .query_map(params![i64::from(page_size), offset], |row| {
            Ok(ItemSummary {
                id: row.get(0)?,
                title: row.get(1)?,
                description: row.get(2)?,
                user_nick: row.get(3)?,
                signature: row.get(4)?,
                created_at: parse_timestamp(row, 5)?,
                image_count: row.get::<_, i64>(6)? as usize,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(ItemPage {
        items,
        total: total as usize,
        page,
        page_size,
    })
}

fn load_item(conn: &Connection, id: &str) -> Result<Option<Item>> {
    let item = conn
        .query_row(
            "SELECT post_id, title, description, user_nick, signature, created_at, updated_at
             FROM posts WHERE post_id = ?1",
            params![id],
            |row| {
                Ok(Item {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    description: row.get(2)?,
                    user_nick: row.get(3)?,
                    signature: row.get(4)?,
                    created_at: parse_timestamp(row, 5)?,
                    updated_at: parse_timestamp(row, 6)?,
                    images: Vec::new(),
                })
            },
        )
        .optional()?;

    let Some(mut item) = item else {
        return Ok(None);
    };

    let mut stmt = conn.prepare_cached("SELECT url FROM images WHERE post_id = ?1 ORDER BY id")?;
    item.images = stmt
        .query_map(params![id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;

    Ok(Some(item))
}

#[async_trait]
impl ItemStore for SqliteItemStore {
    async fn existing_ids(&self) -> Result<HashSet<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached("SELECT post_id FROM posts")?;
            let ids = stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<HashSet<String>>>()?;
            Ok(ids)
        })
        .await
    }

    async fn upsert(&self, item: &NewItem) -> Result<UpsertOutcome> {
        let item = item.clone();
        self.with_conn(move |conn| upsert_item(conn, &item)).await
    }

    async fn list_items(&self, page: u32, page_size: u32) -> Result<ItemPage> {
        if page == 0 || page_size == 0 {
            return Err(AppError::validation(
                "page and page_size must both be at least 1",
            ));
        }
        self.with_conn(move |conn| list_page(conn, page, page_size))
            .await
    }

    async fn get_item(&self, id: &str) -> Result<Option<Item>> {
        let id = id.to_string();
        self.with_conn(move |conn| load_item(conn, &id)).await
    }

    async fn count(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let total: i64 = conn.query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
            Ok(total as usize)
        })
        .await
    }
}
