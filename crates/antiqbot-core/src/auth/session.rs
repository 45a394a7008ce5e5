use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::models::UserProfile;

use super::Storage;

/// Storage key for the bearer credential
pub const TOKEN_KEY: &str = "token";

/// Storage key for the JSON-serialized profile
pub const USER_KEY: &str = "user";

/// Credential and cached profile. Both absent means logged out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub credential: Option<String>,
    pub profile: Option<UserProfile>,
}

impl Session {
    pub fn new(credential: String, profile: UserProfile) -> Self {
        Self {
            credential: Some(credential),
            profile: Some(profile),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    /// Get the bearer token if there is one
    pub fn token(&self) -> Option<&str> {
        self.credential.as_deref()
    }
}

/// Persists a [`Session`] across restarts.
pub struct SessionStore {
    storage: Box<dyn Storage>,
}

impl SessionStore {
    pub fn new(storage: impl Storage + 'static) -> Self {
        Self {
            storage: Box::new(storage),
        }
    }

    pub fn from_boxed(storage: Box<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Read the persisted session.
    ///
    /// Never fails: unreadable storage, a missing token or a malformed
    /// profile all read as absent. A profile is never returned without a
    /// credential.
    pub fn load(&self) -> Session {
        let credential = match self.storage.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read stored credential");
                None
            }
        };

        let Some(credential) = credential else {
            debug!("No stored session");
            return Session::default();
        };

        let profile = match self.storage.get(USER_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<UserProfile>(&json) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    warn!(error = %e, "Stored profile is malformed, ignoring it");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read stored profile");
                None
            }
        };

        debug!(has_profile = profile.is_some(), "Stored session loaded");
        Session {
            credential: Some(credential),
            profile,
        }
    }

    /// Persist credential and profile together.
    ///
    /// The old credential is removed before anything is written and the new
    /// one goes last. `load` ignores a profile without a credential, so a
    /// failure part-way reads back as logged out, never as the new profile
    /// paired with the old credential. If even the first removal fails,
    /// storage still holds the old session untouched.
    pub fn save(&self, credential: &str, profile: &UserProfile) -> Result<()> {
        let profile_json = serde_json::to_string(profile).context("Failed to serialize profile")?;

        self.storage.remove(TOKEN_KEY)?;
        let written = self
            .storage
            .set(USER_KEY, &profile_json)
            .and_then(|()| self.storage.set(TOKEN_KEY, credential));

        if let Err(e) = written {
            if let Err(cleanup) = self.storage.remove(USER_KEY) {
                warn!(error = %cleanup, "Failed to remove profile after incomplete session save");
            }
            return Err(e);
        }
        Ok(())
    }

    /// Remove both values. The credential goes first.
    pub fn clear(&self) -> Result<()> {
        self.storage.remove(TOKEN_KEY)?;
        self.storage.remove(USER_KEY)?;
        Ok(())
    }
}
