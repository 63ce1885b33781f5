use anyhow::{Context, Result};
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{named_params, Connection, OptionalExtension};
use serde_json::Value;

use crate::config::AppConfig;
use crate::error::StoreError;
use crate::store::{lookup, merge_into, Document, DocumentStore, WriteMode};

const SCHEMA_VERSION: &str = "1";

/// SQLite-backed [`DocumentStore`]. Each document is one JSON row keyed by
/// `(collection, id)`.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn initialize(config: &AppConfig) -> Result<Self> {
        let conn = Connection::open(config.db_path()).with_context(|| {
            format!("Failed to open database at {}", config.db_path().display())
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("Failed to configure SQLite WAL mode")?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.apply_migrations()
            .context("Failed to apply database migrations")?;
        Ok(db)
    }

    pub fn count(&self, collection: &str) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = :collection",
            named_params![":collection": collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn apply_migrations(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS meta (key TEXT PRIMARY KEY, value TEXT);
             CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (collection, id)
             );
             CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);
            ",
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO meta (key, value) VALUES ('schema_version', :version)",
            named_params![":version": SCHEMA_VERSION],
        )?;
        Ok(())
    }
}

impl DocumentStore for Database {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let conn = self.conn.lock();
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM documents WHERE collection = :collection AND id = :id",
                named_params![":collection": collection, ":id": id],
                |row| row.get(0),
            )
            .optional()?;
        body.map(|raw| parse_body(collection, id, &raw)).transpose()
    }

    fn set(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
        mode: WriteMode,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let existing = match mode {
            WriteMode::Merge => tx
                .query_row(
                    "SELECT body FROM documents WHERE collection = :collection AND id = :id",
                    named_params![":collection": collection, ":id": id],
                    |row| row.get::<_, String>(0),
                )
                .optional()?
                .map(|raw| parse_body(collection, id, &raw))
                .transpose()?,
            WriteMode::Replace => None,
        };

        let document = merge_into(existing, fields, mode);
        let body = serde_json::to_string(&document)?;
        tx.execute(
            "INSERT OR REPLACE INTO documents (collection, id, body, updated_at)
             VALUES (:collection, :id, :body, :updated_at)",
            named_params![
                ":collection": collection,
                ":id": id,
                ":body": body,
                ":updated_at": Utc::now().to_rfc3339(),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let conn = self.conn.lock();
        let affected = conn.execute(
            "DELETE FROM documents WHERE collection = :collection AND id = :id",
            named_params![":collection": collection, ":id": id],
        )?;
        Ok(affected > 0)
    }

    fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<(String, Document)>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, body FROM documents WHERE collection = :collection ORDER BY id",
        )?;
        let mut rows = stmt.query(named_params![":collection": collection])?;
        let mut matches = Vec::new();
        while let Some(row) = rows.next()? {
            let id: String = row.get(0)?;
            let raw: String = row.get(1)?;
            let document = parse_body(collection, &id, &raw)?;
            if lookup(&document, field) == Some(value) {
                matches.push((id, document));
            }
        }
        Ok(matches)
    }
}

fn parse_body(collection: &str, id: &str, raw: &str) -> Result<Document, StoreError> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(document) => Ok(document),
        other => Err(StoreError::Corrupt {
            collection: collection.to_string(),
            id: id.to_string(),
            reason: format!("expected a JSON object, found {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
