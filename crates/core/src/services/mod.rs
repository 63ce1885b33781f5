mod homes;
mod personal;

use std::fmt;

use serde::Serialize;

use crate::error::StoreError;

pub use homes::{AreaSummary, HomeService, HomeWorkspace, LeaveOutcome};
pub use personal::{PersonalService, PersonalWorkspace};

/// What happened to a mutation after it was applied locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Applied {
    /// Nothing matched, so nothing was written.
    Unchanged,
    /// Local state changed and the store accepted the write.
    Persisted,
    /// Local state changed but the write failed; the change is kept locally.
    LocalOnly,
}

impl Applied {
    pub fn changed(&self) -> bool {
        !matches!(self, Applied::Unchanged)
    }
}

impl fmt::Display for Applied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Applied::Unchanged => "unchanged",
            Applied::Persisted => "saved",
            Applied::LocalOnly => "saved locally only",
        };
        write!(f, "{}", label)
    }
}

/// Writes are fire-and-forget: failures are logged, never rolled back or retried.
fn persist(action: &str, scope: &str, result: Result<(), StoreError>) -> Applied {
    match result {
        Ok(()) => {
            tracing::debug!(action, scope, "mutation persisted");
            Applied::Persisted
        }
        Err(err) => {
            tracing::warn!(action, scope, error = %err, "failed to persist mutation; keeping local state");
            Applied::LocalOnly
        }
    }
}
