//! Aggregate ⇄ document mapping. Collection-valued fields are always read
//! and written wholesale.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::StoreError;
use crate::model::{ChecklistItem, Home, Task, UserProfile};
use crate::store::{Document, DocumentStore, WriteMode, HOMES, USERS};

fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(document) => Ok(document),
        _ => Err(StoreError::Unavailable(
            "aggregate did not serialize to an object".into(),
        )),
    }
}

fn from_document<T: DeserializeOwned>(
    collection: &str,
    id: &str,
    document: Document,
) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(document)).map_err(|err| StoreError::Corrupt {
        collection: collection.to_string(),
        id: id.to_string(),
        reason: err.to_string(),
    })
}

fn single_field<T: Serialize>(key: &str, value: &T) -> Result<Document, StoreError> {
    let mut fields = Document::new();
    fields.insert(key.to_string(), serde_json::to_value(value)?);
    Ok(fields)
}

#[derive(Clone)]
pub struct HomeRepository {
    store: Arc<dyn DocumentStore>,
}

impl HomeRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Store a new home under a freshly assigned id.
    pub fn insert(&self, home: &Home) -> Result<String, StoreError> {
        let id = self.store.new_id();
        self.store
            .set(HOMES, &id, to_document(home)?, WriteMode::Replace)?;
        Ok(id)
    }

    pub fn get(&self, id: &str) -> Result<Option<Home>, StoreError> {
        self.store
            .get(HOMES, id)?
            .map(|document| from_document(HOMES, id, document))
            .transpose()
    }

    pub fn find_by_code(&self, join_code: &str) -> Result<Option<(String, Home)>, StoreError> {
        let matches = self
            .store
            .find_by_field(HOMES, "joinCode", &Value::String(join_code.to_string()))?;
        match matches.into_iter().next() {
            Some((id, document)) => {
                let home = from_document(HOMES, &id, document)?;
                Ok(Some((id, home)))
            }
            None => Ok(None),
        }
    }

    pub fn write_area_tasks(&self, id: &str, area: &str, tasks: &[Task]) -> Result<(), StoreError> {
        let fields = single_field(&format!("todos.{area}"), &tasks)?;
        self.store.set(HOMES, id, fields, WriteMode::Merge)
    }

    pub fn write_groceries(&self, id: &str, groceries: &[ChecklistItem]) -> Result<(), StoreError> {
        let fields = single_field("groceries", &groceries)?;
        self.store.set(HOMES, id, fields, WriteMode::Merge)
    }

    pub fn write_selected_areas(&self, id: &str, areas: &[String]) -> Result<(), StoreError> {
        let fields = single_field("selectedAreas", &areas)?;
        self.store.set(HOMES, id, fields, WriteMode::Merge)
    }

    pub fn write_members(&self, id: &str, members: &[String]) -> Result<(), StoreError> {
        let fields = single_field("members", &members)?;
        self.store.set(HOMES, id, fields, WriteMode::Merge)
    }

    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.store.delete(HOMES, id)
    }
}

#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn DocumentStore>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn get(&self, uid: &str) -> Result<Option<UserProfile>, StoreError> {
        self.store
            .get(USERS, uid)?
            .map(|document| from_document(USERS, uid, document))
            .transpose()
    }

    pub fn create(&self, profile: &UserProfile) -> Result<(), StoreError> {
        self.store
            .set(USERS, &profile.uid, to_document(profile)?, WriteMode::Replace)
    }

    pub fn set_home_id(&self, uid: &str, home_id: Option<&str>) -> Result<(), StoreError> {
        let fields = single_field("homeId", &home_id)?;
        self.store.set(USERS, uid, fields, WriteMode::Merge)
    }

    pub fn set_profile_image(&self, uid: &str, url: &str) -> Result<(), StoreError> {
        let fields = single_field("profileImage", &url)?;
        self.store.set(USERS, uid, fields, WriteMode::Merge)
    }

    pub fn write_my_tasks(&self, uid: &str, tasks: &[Task]) -> Result<(), StoreError> {
        let fields = single_field("myTasks", &tasks)?;
        self.store.set(USERS, uid, fields, WriteMode::Merge)
    }

    pub fn write_wishlist(&self, uid: &str, wishlist: &[ChecklistItem]) -> Result<(), StoreError> {
        let fields = single_field("wishlist", &wishlist)?;
        self.store.set(USERS, uid, fields, WriteMode::Merge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn repos() -> (Arc<MemoryStore>, HomeRepository, UserRepository) {
        let store = Arc::new(MemoryStore::new());
        let homes = HomeRepository::new(store.clone());
        let users = UserRepository::new(store.clone());
        (store, homes, users)
    }

    #[test]
    fn home_roundtrip_and_code_lookup() {
        let (_store, homes, _users) = repos();
        let home = Home {
            name: "Casa".into(),
            join_code: "QW12ER".into(),
            members: vec!["u1".into()],
            ..Home::default()
        };
        let id = homes.insert(&home).unwrap();

        assert_eq!(homes.get(&id).unwrap(), Some(home.clone()));
        assert_eq!(homes.find_by_code("QW12ER").unwrap(), Some((id, home)));
        assert_eq!(homes.find_by_code("ZZZZZZ").unwrap(), None);
    }

    #[test]
    fn area_write_touches_only_that_area() {
        let (store, homes, _users) = repos();
        let id = homes.insert(&Home::default()).unwrap();
        let task = Task {
            id: "t1".into(),
            name: "Sweep".into(),
            details: String::new(),
            deadline: None,
            created_at: None,
            checked: false,
        };
        homes.write_area_tasks(&id, "garden", &[task.clone()]).unwrap();
        homes.write_area_tasks(&id, "kitchen", &[]).unwrap();

        let home = homes.get(&id).unwrap().unwrap();
        assert_eq!(home.tasks("garden"), &[task]);
        assert!(home.tasks("kitchen").is_empty());

        let raw = store.get(HOMES, &id).unwrap().unwrap();
        assert_eq!(raw["todos"]["garden"][0]["deadline"], json!(""));
    }

    #[test]
    fn corrupt_home_document_is_reported() {
        let (store, homes, _users) = repos();
        let mut fields = Document::new();
        fields.insert("members".into(), json!("not-a-list"));
        store.set(HOMES, "h1", fields, WriteMode::Replace).unwrap();

        assert!(matches!(homes.get("h1"), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn user_fields_merge_into_profile() {
        let (_store, _homes, users) = repos();
        users
            .create(&UserProfile {
                uid: "u1".into(),
                email: "ana@example.com".into(),
                name: "ana".into(),
                ..UserProfile::default()
            })
            .unwrap();

        users.set_home_id("u1", Some("h1")).unwrap();
        users.set_profile_image("u1", "https://img.example/ana.png").unwrap();
        let profile = users.get("u1").unwrap().unwrap();
        assert_eq!(profile.home_id.as_deref(), Some("h1"));
        assert_eq!(
            profile.profile_image.as_deref(),
            Some("https://img.example/ana.png")
        );
        assert_eq!(profile.email, "ana@example.com");

        users.set_home_id("u1", None).unwrap();
        assert_eq!(users.get("u1").unwrap().unwrap().home_id, None);
    }
}
