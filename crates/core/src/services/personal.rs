use std::sync::Arc;

use anyhow::Result;

use super::{persist, Applied};
use crate::capture::TaskDraft;
use crate::clock::Clock;
use crate::error::ValidationError;
use crate::lifecycle;
use crate::model::{ChecklistItem, Task, TaskEdit, UserProfile};
use crate::progress::{CollectionSummary, TaskView};
use crate::repository::UserRepository;
use crate::store::DocumentStore;

#[derive(Clone)]
pub struct PersonalService {
    users: UserRepository,
    clock: Arc<dyn Clock>,
}

impl PersonalService {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users: UserRepository::new(store),
            clock,
        }
    }

    pub fn open(&self, uid: &str) -> Result<Option<PersonalWorkspace>> {
        let profile = self.users.get(uid)?;
        Ok(profile.map(|profile| PersonalWorkspace {
            uid: uid.to_string(),
            profile,
            repo: self.users.clone(),
            clock: self.clock.clone(),
        }))
    }
}

/// A user's own task list and wishlist, cached locally.
pub struct PersonalWorkspace {
    uid: String,
    profile: UserProfile,
    repo: UserRepository,
    clock: Arc<dyn Clock>,
}

impl PersonalWorkspace {
    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn tasks(&self) -> &[Task] {
        &self.profile.my_tasks
    }

    pub fn wishlist(&self) -> &[ChecklistItem] {
        &self.profile.wishlist
    }

    pub fn reload(&mut self) -> Result<bool> {
        match self.repo.get(&self.uid)? {
            Some(profile) => {
                self.profile = profile;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn task_views(&self) -> Vec<TaskView> {
        let now = self.clock.now();
        self.tasks()
            .iter()
            .map(|task| TaskView::of(task, now))
            .collect()
    }

    pub fn my_tasks_summary(&self) -> CollectionSummary {
        CollectionSummary::of(self.tasks(), self.clock.now())
    }

    pub fn add_task(&mut self, draft: &TaskDraft) -> Result<(Task, Applied), ValidationError> {
        let task = lifecycle::create_task(draft, self.clock.as_ref())?;
        let next = lifecycle::append(self.tasks(), task.clone());
        Ok((task, self.replace_tasks(next, "add_my_task")))
    }

    pub fn toggle_task(&mut self, id: &str) -> Applied {
        let next = lifecycle::toggle(self.tasks(), id);
        self.replace_tasks(next, "toggle_my_task")
    }

    pub fn edit_task(&mut self, id: &str, edit: &TaskEdit) -> Result<Applied, ValidationError> {
        let next = lifecycle::edit_task(self.tasks(), id, edit)?;
        Ok(self.replace_tasks(next, "edit_my_task"))
    }

    pub fn delete_task(&mut self, id: &str) -> Applied {
        let next = lifecycle::delete(self.tasks(), id);
        self.replace_tasks(next, "delete_my_task")
    }

    pub fn add_wish(&mut self, name: &str) -> Result<(ChecklistItem, Applied), ValidationError> {
        let item = lifecycle::create_item(name)?;
        let next = lifecycle::append(self.wishlist(), item.clone());
        Ok((item, self.replace_wishlist(next, "add_wish")))
    }

    pub fn toggle_wish(&mut self, id: &str) -> Applied {
        let next = lifecycle::toggle(self.wishlist(), id);
        self.replace_wishlist(next, "toggle_wish")
    }

    pub fn rename_wish(&mut self, id: &str, name: &str) -> Result<Applied, ValidationError> {
        let next = lifecycle::rename_item(self.wishlist(), id, name)?;
        Ok(self.replace_wishlist(next, "rename_wish"))
    }

    pub fn delete_wish(&mut self, id: &str) -> Applied {
        let next = lifecycle::delete(self.wishlist(), id);
        self.replace_wishlist(next, "delete_wish")
    }

    /// Record the URL returned by the image upload service.
    pub fn set_profile_image(&mut self, url: &str) -> Applied {
        let url = url.trim();
        if self.profile.profile_image.as_deref() == Some(url) {
            return Applied::Unchanged;
        }
        self.profile.profile_image = Some(url.to_string());
        let result = self.repo.set_profile_image(&self.uid, url);
        persist("set_profile_image", &self.uid, result)
    }

    fn replace_tasks(&mut self, next: Vec<Task>, action: &str) -> Applied {
        if self.profile.my_tasks == next {
            return Applied::Unchanged;
        }
        self.profile.my_tasks = next;
        let result = self.repo.write_my_tasks(&self.uid, &self.profile.my_tasks);
        persist(action, &self.uid, result)
    }

    fn replace_wishlist(&mut self, next: Vec<ChecklistItem>, action: &str) -> Applied {
        if self.profile.wishlist == next {
            return Applied::Unchanged;
        }
        self.profile.wishlist = next;
        let result = self.repo.write_wishlist(&self.uid, &self.profile.wishlist);
        persist(action, &self.uid, result)
    }
}
