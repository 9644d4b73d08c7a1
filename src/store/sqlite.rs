//! SQLite catalog.
//!
//! One `music` table holds every item record; tags are a JSON array column
//! matched through `json_each`. The saved queue lives in two small side
//! tables.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use tracing::debug;

use crate::error::Result;
use crate::media::{ItemRecord, ReadyState};

use super::MusicStore;
use super::query::{Condition, Order, Predicate, escape_like};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS music (
        id TEXT PRIMARY KEY,
        type TEXT NOT NULL,
        title TEXT NOT NULL DEFAULT '',
        artist TEXT,
        album TEXT,
        path TEXT,
        url TEXT,
        tags TEXT NOT NULL DEFAULT '[]',
        keywords TEXT NOT NULL DEFAULT '',
        duration REAL NOT NULL DEFAULT 0,
        ready TEXT NOT NULL DEFAULT 'pending',
        version INTEGER NOT NULL DEFAULT 0
    );
    CREATE INDEX IF NOT EXISTS idx_music_path ON music (path);
    CREATE INDEX IF NOT EXISTS idx_music_type ON music (type);
    CREATE TABLE IF NOT EXISTS queue (
        position INTEGER PRIMARY KEY,
        id TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS queue_state (
        key TEXT PRIMARY KEY,
        value INTEGER
    );
";

const COLUMNS: &str =
    "id, type, title, artist, album, path, url, tags, keywords, duration, ready, version";

const TAG_CLAUSE: &str = "EXISTS (SELECT 1 FROM json_each(music.tags) WHERE json_each.value = ?)";

#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

/// Record plus its still-encoded tag column.
fn read_row(row: &Row<'_>) -> rusqlite::Result<(ItemRecord, String)> {
    let ready: String = row.get(10)?;
    let version: i64 = row.get(11)?;
    let record = ItemRecord {
        id: row.get(0)?,
        item_type: row.get(1)?,
        title: row.get(2)?,
        artist: row.get(3)?,
        album: row.get(4)?,
        path: row.get(5)?,
        url: row.get(6)?,
        tags: Vec::new(),
        keywords: row.get(8)?,
        duration: row.get(9)?,
        ready: ReadyState::parse_lossy(&ready),
        version: version.max(0) as u64,
    };
    Ok((record, row.get(7)?))
}

/// Translate a LIKE pattern to GLOB so matching is case-sensitive.
fn like_to_glob(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => out.push('*'),
            '_' => out.push('?'),
            '\\' => match chars.next() {
                Some(literal) => push_glob_literal(&mut out, literal),
                None => out.push('\\'),
            },
            c => push_glob_literal(&mut out, c),
        }
    }
    out
}

fn push_glob_literal(out: &mut String, c: char) {
    match c {
        '*' => out.push_str("[*]"),
        '?' => out.push_str("[?]"),
        '[' => out.push_str("[[]"),
        c => out.push(c),
    }
}

/// `WHERE ... ORDER BY ... LIMIT ...` tail plus its positional parameters.
fn render(condition: &Condition) -> (String, Vec<String>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<String> = Vec::new();

    for predicate in condition.predicates() {
        match predicate {
            Predicate::Equal(field, value) => {
                clauses.push(format!("{} = ?", field.column()));
                values.push(value.clone());
            }
            Predicate::Like {
                field,
                pattern,
                case_sensitive: false,
            } => {
                clauses.push(format!("{} LIKE ? ESCAPE '\\'", field.column()));
                values.push(pattern.clone());
            }
            Predicate::Like {
                field,
                pattern,
                case_sensitive: true,
            } => {
                clauses.push(format!("{} GLOB ?", field.column()));
                values.push(like_to_glob(pattern));
            }
            Predicate::Tags(tags) => {
                for tag in tags {
                    clauses.push(TAG_CLAUSE.to_string());
                    values.push(tag.clone());
                }
            }
        }
    }

    let mut sql = String::new();
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    match condition.ordering() {
        Some((field, Order::Asc)) => {
            sql.push_str(&format!(" ORDER BY {} ASC, rowid ASC", field.column()))
        }
        Some((field, Order::Desc)) => {
            sql.push_str(&format!(" ORDER BY {} DESC, rowid ASC", field.column()))
        }
        None => sql.push_str(" ORDER BY rowid ASC"),
    }
    if let Some(n) = condition.max_rows() {
        sql.push_str(&format!(" LIMIT {n}"));
    }
    (sql, values)
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn select(&self, tail: &str, values: &[String]) -> Result<Vec<ItemRecord>> {
        let conn = self.conn();
        let sql = format!("SELECT {COLUMNS} FROM music{tail}");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), read_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(mut record, tags)| -> Result<ItemRecord> {
                record.tags = serde_json::from_str(&tags)?;
                Ok(record)
            })
            .collect()
    }
}

impl MusicStore for SqliteStore {
    fn query(&self, condition: &Condition) -> Result<Vec<ItemRecord>> {
        let (tail, values) = render(condition);
        self.select(&tail, &values)
    }

    fn query_by_tags(&self, tags: &[String]) -> Result<Vec<ItemRecord>> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }
        self.query(&Condition::new().and_tags(tags.iter().cloned()))
    }

    fn query_by_keywords(&self, words: &[String]) -> Result<Vec<ItemRecord>> {
        let words: Vec<String> = words
            .iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        if words.is_empty() {
            return Ok(Vec::new());
        }

        let clauses = vec!["keywords LIKE ? ESCAPE '\\'"; words.len()].join(" AND ");
        let values: Vec<String> = words
            .iter()
            .map(|w| format!("%{}%", escape_like(w)))
            .collect();
        self.select(
            &format!(" WHERE {clauses} ORDER BY title COLLATE NOCASE ASC, rowid ASC"),
            &values,
        )
    }

    fn fetch(&self, id: &str) -> Result<Option<ItemRecord>> {
        Ok(self
            .select(" WHERE id = ?", &[id.to_string()])?
            .into_iter()
            .next())
    }

    fn save(&self, record: &ItemRecord) -> Result<()> {
        let tags = serde_json::to_string(&record.tags)?;
        let conn = self.conn();
        conn.execute(
            "INSERT INTO music (id, type, title, artist, album, path, url, tags, keywords, duration, ready, version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT(id) DO UPDATE SET
                 type = excluded.type,
                 title = excluded.title,
                 artist = excluded.artist,
                 album = excluded.album,
                 path = excluded.path,
                 url = excluded.url,
                 tags = excluded.tags,
                 keywords = excluded.keywords,
                 duration = excluded.duration,
                 ready = excluded.ready,
                 version = excluded.version",
            params![
                record.id,
                record.item_type,
                record.title,
                record.artist,
                record.album,
                record.path,
                record.url,
                tags,
                record.keywords,
                record.duration,
                record.ready.as_str(),
                record.version as i64,
            ],
        )?;
        debug!("store: saved {} (version {})", record.id, record.version);
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.conn()
            .execute("DELETE FROM music WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn save_queue(&self, ids: &[String], current: Option<usize>) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM queue", [])?;
        for (position, id) in ids.iter().enumerate() {
            tx.execute(
                "INSERT INTO queue (position, id) VALUES (?1, ?2)",
                params![position as i64, id],
            )?;
        }
        tx.execute(
            "INSERT INTO queue_state (key, value) VALUES ('current', ?1)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![current.map(|c| c as i64)],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn load_queue(&self) -> Result<(Vec<String>, Option<usize>)> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id FROM queue ORDER BY position ASC")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let current: Option<i64> = conn
            .query_row(
                "SELECT value FROM queue_state WHERE key = 'current'",
                [],
                |row| row.get::<_, Option<i64>>(0),
            )
            .optional()?
            .flatten();

        let current = current
            .and_then(|c| usize::try_from(c).ok())
            .filter(|&c| c < ids.len());
        Ok((ids, current))
    }
}
