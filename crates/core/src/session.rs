//! Signed-in user context. Owned by the caller and passed explicitly; there
//! is no process-wide auth state.

use anyhow::{Context, Result};

use crate::model::UserProfile;
use crate::repository::UserRepository;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
}

impl Identity {
    pub fn new(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            display_name: None,
        }
    }

    /// Display name, falling back to the local part of the email address.
    pub fn preferred_name(&self) -> String {
        if let Some(name) = self.display_name.as_deref().map(str::trim) {
            if !name.is_empty() {
                return name.to_string();
            }
        }
        let local = self.email.split('@').next().unwrap_or_default().trim();
        if local.is_empty() {
            self.uid.clone()
        } else {
            local.to_string()
        }
    }
}

/// Source of the currently authenticated identity. Sign-in itself happens
/// elsewhere; the core only consumes the result.
pub trait AuthProvider {
    fn current_identity(&self) -> Option<Identity>;
}

/// Identity fixed at construction, e.g. from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    identity: Option<Identity>,
}

impl StaticAuth {
    pub fn new(identity: Option<Identity>) -> Self {
        Self { identity }
    }
}

impl AuthProvider for StaticAuth {
    fn current_identity(&self) -> Option<Identity> {
        self.identity.clone()
    }
}

#[derive(Debug, Default)]
pub struct Session {
    identity: Option<Identity>,
    profile: Option<UserProfile>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the user's document, creating it on first sign-in.
    pub fn sign_in(&mut self, identity: Identity, users: &UserRepository) -> Result<&UserProfile> {
        let profile = match users
            .get(&identity.uid)
            .with_context(|| format!("Failed to load user {}", identity.uid))?
        {
            Some(profile) => profile,
            None => {
                let profile = UserProfile {
                    uid: identity.uid.clone(),
                    email: identity.email.clone(),
                    name: identity.preferred_name(),
                    ..UserProfile::default()
                };
                users
                    .create(&profile)
                    .with_context(|| format!("Failed to create user {}", identity.uid))?;
                tracing::info!(uid = %identity.uid, "created user document");
                profile
            }
        };

        self.identity = Some(identity);
        Ok(self.profile.insert(profile))
    }

    /// Follow the auth provider: sign in when it reports an identity, sign
    /// out when it reports none.
    pub fn sync_with(&mut self, auth: &dyn AuthProvider, users: &UserRepository) -> Result<()> {
        match auth.current_identity() {
            Some(identity) => {
                let same_user = self.uid() == Some(identity.uid.as_str());
                if same_user {
                    self.refresh(users)?;
                } else {
                    self.sign_in(identity, users)?;
                }
            }
            None => self.sign_out(),
        }
        Ok(())
    }

    /// Re-read the user document, e.g. after `homeId` changed.
    pub fn refresh(&mut self, users: &UserRepository) -> Result<()> {
        let Some(uid) = self.identity.as_ref().map(|identity| identity.uid.clone()) else {
            return Ok(());
        };
        self.profile = users
            .get(&uid)
            .with_context(|| format!("Failed to reload user {uid}"))?;
        Ok(())
    }

    pub fn sign_out(&mut self) {
        if let Some(identity) = self.identity.take() {
            tracing::debug!(uid = %identity.uid, "signed out");
        }
        self.profile = None;
    }

    pub fn is_signed_in(&self) -> bool {
        self.identity.is_some()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn uid(&self) -> Option<&str> {
        self.identity.as_ref().map(|identity| identity.uid.as_str())
    }

    pub fn home_id(&self) -> Option<&str> {
        self.profile.as_ref().and_then(|profile| profile.home_id.as_deref())
    }
}
