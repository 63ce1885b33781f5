use chrono::{DateTime, Utc};

use crate::error::ValidationError;

/// Normalized input for capturing a task from any client. The deadline is
/// already absolute; see [`crate::deadline::DeadlineInput`] for the relative form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub name: String,
    pub details: String,
    pub deadline: Option<DateTime<Utc>>,
}

impl TaskDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    pub fn deadline(mut self, deadline: Option<DateTime<Utc>>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn require_name(&self) -> Result<&str, ValidationError> {
        require_name(&self.name)
    }
}

pub(crate) fn require_name(raw: &str) -> Result<&str, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(trimmed)
}
