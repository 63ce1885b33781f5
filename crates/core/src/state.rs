use std::sync::Arc;

use anyhow::{anyhow, Context, Result};

use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::database::Database;
use crate::repository::UserRepository;
use crate::services::{HomeService, HomeWorkspace, LeaveOutcome, PersonalService, PersonalWorkspace};
use crate::session::{AuthProvider, Session};
use crate::store::DocumentStore;

/// Everything a front end needs: the store, the services built on it and the
/// current session.
pub struct AppState {
    clock: Arc<dyn Clock>,
    users: UserRepository,
    homes: HomeService,
    personal: PersonalService,
    session: Session,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users: UserRepository::new(store.clone()),
            homes: HomeService::new(store.clone(), clock.clone()),
            personal: PersonalService::new(store, clock.clone()),
            session: Session::new(),
            clock,
        }
    }

    /// Open the on-disk database described by `config`.
    pub fn open(config: &AppConfig) -> Result<Self> {
        let database = Database::initialize(config)?;
        Ok(Self::new(Arc::new(database), Arc::new(SystemClock)))
    }

    pub fn authenticate(&mut self, auth: &dyn AuthProvider) -> Result<()> {
        self.session.sync_with(auth, &self.users)
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn homes(&self) -> &HomeService {
        &self.homes
    }

    pub fn require_uid(&self) -> Result<String> {
        self.session
            .uid()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Not signed in. Pass --user or set HOMEKEEP_USER."))
    }

    /// Workspace of the home the signed-in user belongs to.
    pub fn home_workspace(&self) -> Result<HomeWorkspace> {
        self.require_uid()?;
        let home_id = self
            .session
            .home_id()
            .ok_or_else(|| anyhow!("You are not part of a home yet. Create or join one first."))?;
        self.homes
            .open(home_id)?
            .ok_or_else(|| anyhow!("Home {} no longer exists", home_id))
    }

    pub fn personal_workspace(&self) -> Result<PersonalWorkspace> {
        let uid = self.require_uid()?;
        self.personal
            .open(&uid)?
            .ok_or_else(|| anyhow!("User {} has no profile document", uid))
    }

    pub fn create_home(&mut self, name: &str) -> Result<String> {
        let uid = self.require_uid()?;
        let id = self.homes.create_home(&uid, name)?;
        self.session.refresh(&self.users)?;
        Ok(id)
    }

    /// Returns `None` when no home has this join code.
    pub fn join_home(&mut self, join_code: &str) -> Result<Option<String>> {
        let uid = self.require_uid()?;
        let joined = self.homes.join_home(&uid, join_code)?;
        if joined.is_some() {
            self.session.refresh(&self.users)?;
        }
        Ok(joined)
    }

    pub fn leave_home(&mut self) -> Result<LeaveOutcome> {
        let uid = self.require_uid()?;
        let home_id = self
            .session
            .home_id()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("You are not part of a home"))?;
        let outcome = self
            .homes
            .leave_home(&uid, &home_id)
            .with_context(|| format!("Failed to leave home {home_id}"))?;
        self.session.refresh(&self.users)?;
        Ok(outcome)
    }

    pub fn sign_out(&mut self) {
        self.session.sign_out();
    }
}
