use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use ulid::Ulid;

use super::{persist, Applied};
use crate::capture::TaskDraft;
use crate::clock::Clock;
use crate::error::ValidationError;
use crate::lifecycle;
use crate::model::{normalize_area, ChecklistItem, Home, Task, TaskEdit};
use crate::progress::{CollectionSummary, TaskView};
use crate::repository::{HomeRepository, UserRepository};
use crate::store::DocumentStore;

const JOIN_CODE_LEN: usize = 6;
const JOIN_CODE_ATTEMPTS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaveOutcome {
    pub was_member: bool,
    pub home_deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaSummary {
    pub area: String,
    #[serde(flatten)]
    pub summary: CollectionSummary,
}

#[derive(Clone)]
pub struct HomeService {
    homes: HomeRepository,
    users: UserRepository,
    clock: Arc<dyn Clock>,
}

impl HomeService {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            homes: HomeRepository::new(store.clone()),
            users: UserRepository::new(store),
            clock,
        }
    }

    /// Create a home owned by `owner` and point the owner's profile at it.
    pub fn create_home(&self, owner: &str, name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyHomeName.into());
        }
        self.ensure_not_in_other_home(owner, None)?;

        let join_code = self.unused_join_code()?;
        let home = Home {
            name: name.to_string(),
            join_code,
            members: vec![owner.to_string()],
            ..Home::default()
        };
        let id = self.homes.insert(&home).context("failed to store new home")?;
        self.users
            .set_home_id(owner, Some(&id))
            .context("failed to link home to its owner")?;

        tracing::info!(home_id = id.as_str(), join_code = home.join_code.as_str(), "home created");
        Ok(id)
    }

    pub fn find_by_code(&self, join_code: &str) -> Result<Option<(String, Home)>> {
        let code = join_code.trim().to_uppercase();
        if code.is_empty() {
            return Ok(None);
        }
        Ok(self.homes.find_by_code(&code)?)
    }

    /// Add `uid` to the home with this join code. Unknown codes yield `None`.
    pub fn join_home(&self, uid: &str, join_code: &str) -> Result<Option<String>> {
        let Some((id, home)) = self.find_by_code(join_code)? else {
            return Ok(None);
        };
        self.ensure_not_in_other_home(uid, Some(id.as_str()))?;

        if !home.is_member(uid) {
            let mut members = home.members.clone();
            members.push(uid.to_string());
            self.homes
                .write_members(&id, &members)
                .context("failed to add member")?;
        }
        self.users
            .set_home_id(uid, Some(&id))
            .context("failed to link home to member")?;

        tracing::info!(home_id = id.as_str(), uid, "joined home");
        Ok(Some(id))
    }

    /// Remove `uid` from the home, deleting it once nobody is left.
    pub fn leave_home(&self, uid: &str, home_id: &str) -> Result<LeaveOutcome> {
        let home = self
            .homes
            .get(home_id)?
            .ok_or_else(|| anyhow!("home {} not found", home_id))?;

        let was_member = home.is_member(uid);
        let remaining: Vec<String> = home
            .members
            .into_iter()
            .filter(|member| member != uid)
            .collect();

        let home_deleted = if remaining.is_empty() {
            self.homes.delete(home_id)?
        } else {
            if was_member {
                self.homes.write_members(home_id, &remaining)?;
            }
            false
        };
        self.users
            .set_home_id(uid, None)
            .context("failed to unlink home from user")?;

        tracing::info!(home_id, uid, home_deleted, "left home");
        Ok(LeaveOutcome {
            was_member,
            home_deleted,
        })
    }

    pub fn open(&self, home_id: &str) -> Result<Option<HomeWorkspace>> {
        let home = self.homes.get(home_id)?;
        Ok(home.map(|home| HomeWorkspace {
            id: home_id.to_string(),
            home,
            repo: self.homes.clone(),
            clock: self.clock.clone(),
        }))
    }

    /// A user belongs to at most one home. A `homeId` pointing at a home that
    /// is gone, or that no longer lists the user, does not count.
    fn ensure_not_in_other_home(&self, uid: &str, target: Option<&str>) -> Result<()> {
        let Some(current) = self.users.get(uid)?.and_then(|profile| profile.home_id) else {
            return Ok(());
        };
        if target == Some(current.as_str()) {
            return Ok(());
        }
        let still_member = self
            .homes
            .get(&current)?
            .is_some_and(|home| home.is_member(uid));
        if still_member {
            return Err(ValidationError::AlreadyInHome(current).into());
        }
        Ok(())
    }

    fn unused_join_code(&self) -> Result<String> {
        for _ in 0..JOIN_CODE_ATTEMPTS {
            let code = generate_join_code();
            if self.homes.find_by_code(&code)?.is_none() {
                return Ok(code);
            }
        }
        Err(anyhow!("could not allocate a unique join code"))
    }
}

/// Six upper-case characters taken from the random tail of a ULID.
fn generate_join_code() -> String {
    let id = Ulid::new().to_string();
    id[id.len() - JOIN_CODE_LEN..].to_string()
}

/// Locally cached home. Mutations update the cache first, then write the
/// affected field back wholesale.
pub struct HomeWorkspace {
    id: String,
    home: Home,
    repo: HomeRepository,
    clock: Arc<dyn Clock>,
}

impl HomeWorkspace {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn home(&self) -> &Home {
        &self.home
    }

    pub fn tasks(&self, area: &str) -> &[Task] {
        self.home.tasks(area)
    }

    pub fn groceries(&self) -> &[ChecklistItem] {
        &self.home.groceries
    }

    /// Re-read the home from the store. Returns `false` if it no longer exists.
    pub fn reload(&mut self) -> Result<bool> {
        match self.repo.get(&self.id)? {
            Some(home) => {
                self.home = home;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn task_views(&self, area: &str) -> Vec<TaskView> {
        let now = self.clock.now();
        self.tasks(area)
            .iter()
            .map(|task| TaskView::of(task, now))
            .collect()
    }

    /// Progress of every selected area, in selection order.
    pub fn area_summaries(&self) -> Vec<AreaSummary> {
        let now = self.clock.now();
        self.home
            .selected_areas
            .iter()
            .map(|area| AreaSummary {
                area: area.clone(),
                summary: CollectionSummary::of(self.home.tasks(area), now),
            })
            .collect()
    }

    pub fn add_task(&mut self, area: &str, draft: &TaskDraft) -> Result<(Task, Applied), ValidationError> {
        let area = normalize_area(area)?;
        let task = lifecycle::create_task(draft, self.clock.as_ref())?;
        let next = lifecycle::append(self.home.tasks(&area), task.clone());
        let applied = self.replace_area(&area, next, "add_task");
        Ok((task, applied))
    }

    pub fn toggle_task(&mut self, area: &str, id: &str) -> Result<Applied, ValidationError> {
        let area = normalize_area(area)?;
        let next = lifecycle::toggle(self.home.tasks(&area), id);
        Ok(self.replace_area(&area, next, "toggle_task"))
    }

    pub fn edit_task(&mut self, area: &str, id: &str, edit: &TaskEdit) -> Result<Applied, ValidationError> {
        let area = normalize_area(area)?;
        let next = lifecycle::edit_task(self.home.tasks(&area), id, edit)?;
        Ok(self.replace_area(&area, next, "edit_task"))
    }

    pub fn delete_task(&mut self, area: &str, id: &str) -> Result<Applied, ValidationError> {
        let area = normalize_area(area)?;
        let next = lifecycle::delete(self.home.tasks(&area), id);
        Ok(self.replace_area(&area, next, "delete_task"))
    }

    /// Show or hide an area on the home overview.
    pub fn toggle_area(&mut self, area: &str) -> Result<Applied, ValidationError> {
        let area = normalize_area(area)?;
        let mut selected = self.home.selected_areas.clone();
        if let Some(position) = selected.iter().position(|existing| *existing == area) {
            selected.remove(position);
        } else {
            selected.push(area);
        }
        self.home.selected_areas = selected;

        let result = self
            .repo
            .write_selected_areas(&self.id, &self.home.selected_areas);
        Ok(persist("toggle_area", &self.id, result))
    }

    pub fn add_grocery(&mut self, name: &str) -> Result<(ChecklistItem, Applied), ValidationError> {
        let item = lifecycle::create_item(name)?;
        let next = lifecycle::append(&self.home.groceries, item.clone());
        Ok((item, self.replace_groceries(next, "add_grocery")))
    }

    pub fn toggle_grocery(&mut self, id: &str) -> Applied {
        let next = lifecycle::toggle(&self.home.groceries, id);
        self.replace_groceries(next, "toggle_grocery")
    }

    pub fn rename_grocery(&mut self, id: &str, name: &str) -> Result<Applied, ValidationError> {
        let next = lifecycle::rename_item(&self.home.groceries, id, name)?;
        Ok(self.replace_groceries(next, "rename_grocery"))
    }

    pub fn delete_grocery(&mut self, id: &str) -> Applied {
        let next = lifecycle::delete(&self.home.groceries, id);
        self.replace_groceries(next, "delete_grocery")
    }

    fn replace_area(&mut self, area: &str, next: Vec<Task>, action: &str) -> Applied {
        if self.home.tasks(area) == next.as_slice() {
            return Applied::Unchanged;
        }
        self.home.todos.insert(area.to_string(), next);
        let result = self
            .repo
            .write_area_tasks(&self.id, area, self.home.tasks(area));
        persist(action, &self.id, result)
    }

    fn replace_groceries(&mut self, next: Vec<ChecklistItem>, action: &str) -> Applied {
        if self.home.groceries == next {
            return Applied::Unchanged;
        }
        self.home.groceries = next;
        let result = self.repo.write_groceries(&self.id, &self.home.groceries);
        persist(action, &self.id, result)
    }
}
