//! Task and checklist mutations. Every function takes the current collection
//! and returns a new one; an unknown id leaves the collection unchanged.

use ulid::Ulid;

use crate::capture::{require_name, TaskDraft};
use crate::clock::Clock;
use crate::error::ValidationError;
use crate::model::{ChecklistItem, Task, TaskEdit};

/// Anything that can live in an id-addressed checklist.
pub trait Checklist: Clone {
    fn id(&self) -> &str;
    fn toggle(&mut self);
}

impl Checklist for Task {
    fn id(&self) -> &str {
        &self.id
    }

    fn toggle(&mut self) {
        self.checked = !self.checked;
    }
}

impl Checklist for ChecklistItem {
    fn id(&self) -> &str {
        &self.id
    }

    fn toggle(&mut self) {
        self.checked = !self.checked;
    }
}

pub fn new_id() -> String {
    Ulid::new().to_string()
}

pub fn create_task(draft: &TaskDraft, clock: &dyn Clock) -> Result<Task, ValidationError> {
    let name = draft.require_name()?;
    Ok(Task {
        id: new_id(),
        name: name.to_string(),
        details: draft.details.trim().to_string(),
        deadline: draft.deadline,
        created_at: Some(clock.now()),
        checked: false,
    })
}

pub fn create_item(name: &str) -> Result<ChecklistItem, ValidationError> {
    let name = require_name(name)?;
    Ok(ChecklistItem {
        id: new_id(),
        name: name.to_string(),
        checked: false,
    })
}

pub fn contains<T: Checklist>(items: &[T], id: &str) -> bool {
    items.iter().any(|item| item.id() == id)
}

pub fn append<T: Checklist>(items: &[T], item: T) -> Vec<T> {
    let mut next = items.to_vec();
    next.push(item);
    next
}

pub fn toggle<T: Checklist>(items: &[T], id: &str) -> Vec<T> {
    items
        .iter()
        .cloned()
        .map(|mut item| {
            if item.id() == id {
                item.toggle();
            }
            item
        })
        .collect()
}

pub fn delete<T: Checklist>(items: &[T], id: &str) -> Vec<T> {
    items.iter().filter(|item| item.id() != id).cloned().collect()
}

/// Input is validated only when `id` matches; an unknown id is a no-op.
pub fn edit_task(tasks: &[Task], id: &str, edit: &TaskEdit) -> Result<Vec<Task>, ValidationError> {
    if !contains(tasks, id) {
        return Ok(tasks.to_vec());
    }
    let name = edit.name.as_deref().map(require_name).transpose()?;

    Ok(tasks
        .iter()
        .cloned()
        .map(|mut task| {
            if task.id == id {
                if let Some(name) = name {
                    task.name = name.to_string();
                }
                if let Some(details) = &edit.details {
                    task.details = details.trim().to_string();
                }
                if let Some(deadline) = edit.deadline {
                    task.deadline = deadline;
                }
            }
            task
        })
        .collect())
}

pub fn rename_item(
    items: &[ChecklistItem],
    id: &str,
    name: &str,
) -> Result<Vec<ChecklistItem>, ValidationError> {
    if !contains(items, id) {
        return Ok(items.to_vec());
    }
    let name = require_name(name)?;
    Ok(items
        .iter()
        .cloned()
        .map(|mut item| {
            if item.id == id {
                item.name = name.to_string();
            }
            item
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::model::parse_timestamp;
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn clock() -> FixedClock {
        FixedClock::new(Utc.with_ymd_and_hms(2025, 4, 2, 9, 0, 0).unwrap())
    }

    fn sample(clock: &FixedClock) -> Vec<Task> {
        let first = create_task(&TaskDraft::new("Wipe counters"), clock).unwrap();
        let second = create_task(
            &TaskDraft::new("Descale kettle")
                .details("vinegar")
                .deadline(Some(clock.now() + Duration::days(2))),
            clock,
        )
        .unwrap();
        append(&vec![first], second)
    }

    #[test]
    fn create_assigns_identity_and_trims_fields() {
        let clock = clock();
        let task = create_task(
            &TaskDraft::new("  Take out bins ").details(" blue one "),
            &clock,
        )
        .unwrap();

        assert_eq!(task.name, "Take out bins");
        assert_eq!(task.details, "blue one");
        assert_eq!(task.created_at, Some(clock.now()));
        assert!(!task.checked);
        assert_eq!(task.id.len(), 26);
    }

    #[test]
    fn create_rejects_whitespace_name() {
        let clock = clock();
        let tasks = sample(&clock);
        let result = create_task(&TaskDraft::new("   "), &clock).map(|task| append(&tasks, task));

        assert_eq!(result, Err(ValidationError::EmptyName));
        assert_eq!(tasks.len(), 2);
    }

    #[test]
    fn ids_are_unique() {
        let clock = clock();
        let tasks = sample(&clock);
        assert_ne!(tasks[0].id, tasks[1].id);
    }

    #[test]
    fn toggle_flips_matching_task_only() {
        let clock = clock();
        let tasks = sample(&clock);
        let toggled = toggle(&tasks, &tasks[1].id);

        assert!(!toggled[0].checked);
        assert!(toggled[1].checked);
        assert_eq!(toggle(&toggled, &tasks[1].id), tasks);
    }

    #[test]
    fn toggle_unknown_id_returns_identical_collection() {
        let clock = clock();
        let tasks = sample(&clock);
        assert_eq!(toggle(&tasks, "missing"), tasks);
    }

    #[test]
    fn delete_removes_match_and_ignores_unknown() {
        let clock = clock();
        let tasks = sample(&clock);
        let remaining = delete(&tasks, &tasks[0].id);

        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "Descale kettle");
        assert_eq!(delete(&remaining, "missing"), remaining);
    }

    #[test]
    fn edit_never_changes_identity_fields() {
        let clock = clock();
        let tasks = sample(&clock);
        let target = tasks[1].clone();
        let payload: TaskEdit = serde_json::from_value(json!({
            "id": "other-id",
            "createdAt": "1999-01-01T00:00:00Z",
            "name": "Descale kettle and iron",
            "details": "",
            "deadline": "2025-04-10T18:00:00Z"
        }))
        .unwrap();

        let edited = edit_task(&tasks, &target.id, &payload).unwrap();
        let updated = &edited[1];

        assert_eq!(updated.id, target.id);
        assert_eq!(updated.created_at, target.created_at);
        assert_eq!(updated.name, "Descale kettle and iron");
        assert_eq!(updated.details, "");
        assert_eq!(updated.deadline, parse_timestamp("2025-04-10T18:00:00Z"));
        assert_eq!(edited[0], tasks[0]);
    }

    #[test]
    fn edit_keeps_unspecified_fields_and_can_clear_deadline() {
        let clock = clock();
        let tasks = sample(&clock);
        let id = tasks[1].id.clone();

        let cleared = edit_task(
            &tasks,
            &id,
            &TaskEdit {
                deadline: Some(None),
                ..TaskEdit::default()
            },
        )
        .unwrap();

        assert_eq!(cleared[1].deadline, None);
        assert_eq!(cleared[1].name, "Descale kettle");
        assert_eq!(cleared[1].details, "vinegar");
    }

    #[test]
    fn edit_rejects_blank_name_and_ignores_unknown_id() {
        let clock = clock();
        let tasks = sample(&clock);
        let blank = TaskEdit {
            name: Some("  ".into()),
            ..TaskEdit::default()
        };
        assert_eq!(
            edit_task(&tasks, &tasks[0].id, &blank),
            Err(ValidationError::EmptyName)
        );

        let rename = TaskEdit {
            name: Some("Anything".into()),
            ..TaskEdit::default()
        };
        assert_eq!(edit_task(&tasks, "missing", &rename).unwrap(), tasks);
        assert_eq!(edit_task(&tasks, "missing", &blank).unwrap(), tasks);
    }

    #[test]
    fn checklist_items_share_the_same_operations() {
        let milk = create_item("Milk").unwrap();
        let eggs = create_item(" Eggs ").unwrap();
        let list = append(&vec![milk.clone()], eggs.clone());

        let toggled = toggle(&list, &eggs.id);
        assert!(toggled[1].checked);

        let renamed = rename_item(&toggled, &milk.id, "Oat milk").unwrap();
        assert_eq!(renamed[0].name, "Oat milk");
        assert!(rename_item(&renamed, &milk.id, "").is_err());
        assert_eq!(rename_item(&renamed, "missing", "").unwrap(), renamed);

        let trimmed = delete(&renamed, &milk.id);
        assert_eq!(trimmed, vec![ChecklistItem {
            id: eggs.id.clone(),
            name: "Eggs".into(),
            checked: true,
        }]);
        assert!(create_item("\t").is_err());
        assert!(contains(&trimmed, &eggs.id));
    }
}
