use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, RequestError};
use crate::models::{AuthResponse, Credits, RegisterRequest, UserProfile};

use super::{Session, SessionStore};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl SessionError {
    pub fn request_error(&self) -> Option<&RequestError> {
        match self {
            SessionError::Request(e) => Some(e),
            SessionError::Storage(_) => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.request_error().is_some_and(RequestError::is_unauthorized)
    }
}

/// Fresh account data fetched by [`SessionManager::refresh`].
#[derive(Debug, Clone)]
pub struct AccountSnapshot {
    pub profile: UserProfile,
    pub credits: Credits,
}

/// Ties an [`ApiClient`] to a [`SessionStore`].
///
/// The session is either Anonymous (no credential) or Authenticated. Login
/// and register move to Authenticated only after the store write succeeds;
/// a failed write leaves the manager in whatever state the store reads back.
/// Logout and any request rejected with HTTP 401 (via [`guard`]) move back.
///
/// [`guard`]: SessionManager::guard
pub struct SessionManager {
    client: ApiClient,
    store: SessionStore,
    session: Session,
}

impl SessionManager {
    /// Start Anonymous. Call [`restore`](Self::restore) to pick up a saved
    /// session.
    pub fn new(mut client: ApiClient, store: SessionStore) -> Self {
        client.clear_token();
        Self {
            client,
            store,
            session: Session::default(),
        }
    }

    /// Load the persisted session and hand its credential to the client.
    /// Returns whether a session was found.
    pub fn restore(&mut self) -> bool {
        self.session = self.store.load();
        match self.session.credential {
            Some(ref token) => {
                self.client.set_token(token.clone());
                debug!(has_profile = self.session.profile.is_some(), "Session restored");
                true
            }
            None => {
                self.client.clear_token();
                false
            }
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.session.profile.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Log in and persist the new session.
    ///
    /// Nothing is written when the backend rejects the login.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<AuthResponse, SessionError> {
        let response = self.client.login(email, password).await?;
        self.establish(&response)?;
        Ok(response)
    }

    /// Create an account and persist the new session, as `login` does.
    pub async fn register(&mut self, request: &RegisterRequest) -> Result<AuthResponse, SessionError> {
        let response = self.client.register(request).await?;
        self.establish(&response)?;
        Ok(response)
    }

    fn establish(&mut self, response: &AuthResponse) -> Result<(), SessionError> {
        let Some((token, user)) = response.session_parts() else {
            warn!("Auth response has no token and user, session not changed");
            return Ok(());
        };

        self.save_or_resync(token, user)?;
        self.client.set_token(token.to_string());
        self.session = Session::new(token.to_string(), user.clone());
        info!(user = %user.display_name(), "Session established");
        Ok(())
    }

    /// End the session locally. No request is sent.
    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.client.clear_token();
        self.session = Session::default();
        self.store.clear()?;
        info!("Logged out");
        Ok(())
    }

    /// Pass a request result through, ending the session if the backend
    /// rejected the credential.
    pub fn guard<T>(&mut self, result: Result<T, RequestError>) -> Result<T, RequestError> {
        if let Err(ref e) = result {
            if e.is_unauthorized() && self.is_authenticated() {
                warn!("Credential rejected by backend, ending session");
                if let Err(clear_err) = self.logout() {
                    warn!(error = %clear_err, "Failed to clear stored session");
                }
            }
        }
        result
    }

    /// Fetch profile and credits concurrently.
    ///
    /// Returns `Ok(None)` when Anonymous. Nothing is persisted; use
    /// [`update_profile`](Self::update_profile) to keep the fresh profile.
    pub async fn refresh(&mut self) -> Result<Option<AccountSnapshot>, RequestError> {
        if !self.is_authenticated() {
            return Ok(None);
        }

        let result = futures::try_join!(self.client.get_user_profile(), self.client.get_credits());
        let (profile, credits) = self.guard(result)?;
        Ok(Some(AccountSnapshot { profile, credits }))
    }

    /// Replace the cached profile for the current credential.
    /// Does nothing when Anonymous.
    pub fn update_profile(&mut self, profile: UserProfile) -> Result<(), SessionError> {
        let Some(token) = self.session.credential.clone() else {
            return Ok(());
        };
        self.save_or_resync(&token, &profile)?;
        self.session.profile = Some(profile);
        Ok(())
    }

    /// Write the session; on failure reload whatever the store now holds so
    /// the client token and in-memory session never disagree with storage.
    fn save_or_resync(&mut self, token: &str, profile: &UserProfile) -> Result<(), SessionError> {
        if let Err(e) = self.store.save(token, profile) {
            warn!(error = %e, "Failed to persist session, reloading stored state");
            self.restore();
            return Err(e.into());
        }
        Ok(())
    }
}
