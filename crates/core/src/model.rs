use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Area vocabulary offered when a home is set up.
pub const DEFAULT_AREAS: [&str; 7] = [
    "kitchen",
    "bathroom",
    "living room",
    "bedroom",
    "garden",
    "garage",
    "laundry",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub details: String,
    #[serde(default, with = "lenient_timestamp")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default, with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub checked: bool,
}

/// Entry of a grocery list or wishlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub checked: bool,
}

/// Replacement fields for an existing task. `None` keeps the current value;
/// `deadline: Some(None)` clears the deadline. Identity fields are not part of
/// the payload, so an edit can never touch `id` or `createdAt`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TaskEdit {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default, deserialize_with = "deadline_patch")]
    pub deadline: Option<Option<DateTime<Utc>>>,
}

impl TaskEdit {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.details.is_none() && self.deadline.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Home {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub join_code: String,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub todos: BTreeMap<String, Vec<Task>>,
    #[serde(default)]
    pub groceries: Vec<ChecklistItem>,
    #[serde(default)]
    pub selected_areas: Vec<String>,
}

impl Home {
    pub fn tasks(&self, area: &str) -> &[Task] {
        self.todos.get(area).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_member(&self, uid: &str) -> bool {
        self.members.iter().any(|member| member == uid)
    }

    pub fn is_selected(&self, area: &str) -> bool {
        self.selected_areas.iter().any(|selected| selected == area)
    }
}

/// Per-user document: identity fields plus the personal task list and wishlist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub my_tasks: Vec<Task>,
    #[serde(default)]
    pub wishlist: Vec<ChecklistItem>,
}

/// Normalize an area name: trimmed, lower-case, non-empty and free of `.`,
/// which would otherwise split the nested `todos.<area>` field path.
pub fn normalize_area(raw: &str) -> Result<String, ValidationError> {
    let area = raw.trim().to_lowercase();
    if area.is_empty() || area.contains('.') {
        return Err(ValidationError::InvalidArea(raw.to_string()));
    }
    Ok(area)
}

/// Lenient timestamp reader used for stored records. Anything unparsable is
/// treated as absent rather than rejected.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn deadline_patch<'de, D>(deserializer: D) -> Result<Option<Option<DateTime<Utc>>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    lenient_timestamp::deserialize(deserializer).map(Some)
}

/// Stored form is an RFC 3339 string, or `""` when absent.
mod lenient_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(instant) => serializer.serialize_str(&super::format_timestamp(instant)),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(match raw {
            Some(Value::String(text)) => super::parse_timestamp(&text),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn task_reads_legacy_and_malformed_timestamps_as_absent() {
        let task: Task = serde_json::from_value(json!({
            "id": "1700000000000",
            "name": "Mop floor",
            "details": "",
            "deadline": "next tuesday-ish",
            "checked": false
        }))
        .unwrap();

        assert_eq!(task.deadline, None);
        assert_eq!(task.created_at, None);
        assert_eq!(task.name, "Mop floor");
    }

    #[test]
    fn task_serializes_absent_timestamps_as_empty_strings() {
        let task = Task {
            id: "t1".into(),
            name: "Dust shelves".into(),
            details: String::new(),
            deadline: None,
            created_at: parse_timestamp("2025-01-02T10:00:00Z"),
            checked: true,
        };

        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["deadline"], json!(""));
        assert_eq!(value["createdAt"], json!("2025-01-02T10:00:00.000Z"));
        assert_eq!(value["checked"], json!(true));
    }

    #[test]
    fn parse_timestamp_accepts_date_only_and_naive_forms() {
        let date_only = parse_timestamp("2025-06-01").unwrap();
        assert_eq!(format_timestamp(&date_only), "2025-06-01T00:00:00.000Z");

        let naive = parse_timestamp("2025-06-01T18:30").unwrap();
        assert_eq!(format_timestamp(&naive), "2025-06-01T18:30:00.000Z");

        let offset = parse_timestamp("2025-06-01T18:30:00+02:00").unwrap();
        assert_eq!(format_timestamp(&offset), "2025-06-01T16:30:00.000Z");

        assert_eq!(parse_timestamp("   "), None);
        assert_eq!(parse_timestamp("31/12/2025"), None);
    }

    #[test]
    fn task_edit_ignores_identity_fields_in_payload() {
        let edit: TaskEdit = serde_json::from_value(json!({
            "id": "hijack",
            "createdAt": "2020-01-01T00:00:00Z",
            "name": "Clean oven",
            "deadline": ""
        }))
        .unwrap();

        assert_eq!(edit.name.as_deref(), Some("Clean oven"));
        assert_eq!(edit.details, None);
        assert_eq!(edit.deadline, Some(None));
    }

    #[test]
    fn home_defaults_missing_collections() {
        let home: Home = serde_json::from_value(json!({
            "name": "Casa",
            "joinCode": "AB12CD",
            "members": ["u1"]
        }))
        .unwrap();

        assert!(home.todos.is_empty());
        assert!(home.groceries.is_empty());
        assert!(home.tasks("kitchen").is_empty());
        assert!(home.is_member("u1"));
        assert!(!home.is_member("u2"));
    }

    #[test]
    fn normalize_area_rejects_blank_and_dotted_names() {
        assert_eq!(normalize_area("  Living Room ").unwrap(), "living room");
        assert!(matches!(
            normalize_area("   "),
            Err(ValidationError::InvalidArea(_))
        ));
        assert!(matches!(
            normalize_area("todos.kitchen"),
            Err(ValidationError::InvalidArea(_))
        ));
    }
}
