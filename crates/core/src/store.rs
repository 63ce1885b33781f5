//! Keyed document store: whole documents addressed by `(collection, id)`,
//! written either wholesale or as a merge of selected fields.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde_json::Value;
use ulid::Ulid;

use crate::error::StoreError;

pub type Document = serde_json::Map<String, Value>;

pub const HOMES: &str = "homes";
pub const USERS: &str = "users";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Overwrite the document with exactly the given fields.
    Replace,
    /// Update only the given fields, creating the document if missing.
    Merge,
}

pub trait DocumentStore: Send + Sync {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Keys containing `.` address nested fields, e.g. `todos.kitchen`.
    fn set(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
        mode: WriteMode,
    ) -> Result<(), StoreError>;

    fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError>;

    fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<(String, Document)>, StoreError>;

    fn new_id(&self) -> String {
        Ulid::new().to_string()
    }
}

/// Apply `fields` onto `target`, expanding dotted keys into nested objects.
pub fn apply_fields(target: &mut Document, fields: Document) {
    for (key, value) in fields {
        let mut segments: Vec<&str> = key.split('.').collect();
        let Some(last) = segments.pop() else {
            continue;
        };

        let mut cursor = &mut *target;
        for segment in segments {
            let slot = cursor
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Document::new()));
            if !slot.is_object() {
                *slot = Value::Object(Document::new());
            }
            cursor = match slot {
                Value::Object(map) => map,
                _ => unreachable!("slot was just made an object"),
            };
        }
        cursor.insert(last.to_string(), value);
    }
}

/// Resolve a dotted path inside a document.
pub fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = document.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

pub(crate) fn merge_into(
    existing: Option<Document>,
    fields: Document,
    mode: WriteMode,
) -> Document {
    let mut document = match mode {
        WriteMode::Merge => existing.unwrap_or_default(),
        WriteMode::Replace => Document::new(),
    };
    apply_fields(&mut document, fields);
    document
}

/// Process-local store, used by tests and as a scratch backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, BTreeMap<String, Document>>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail as if the backend were unreachable.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes are disabled".into()));
        }
        Ok(())
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.lock();
        Ok(collections
            .get(collection)
            .and_then(|documents| documents.get(id))
            .cloned())
    }

    fn set(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
        mode: WriteMode,
    ) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut collections = self.collections.lock();
        let documents = collections.entry(collection.to_string()).or_default();
        let merged = merge_into(documents.remove(id), fields, mode);
        documents.insert(id.to_string(), merged);
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        self.check_writable()?;
        let mut collections = self.collections.lock();
        Ok(collections
            .get_mut(collection)
            .and_then(|documents| documents.remove(id))
            .is_some())
    }

    fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<(String, Document)>, StoreError> {
        let collections = self.collections.lock();
        Ok(collections
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|(_, document)| lookup(document, field) == Some(value))
                    .map(|(id, document)| (id.clone(), document.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }
}
