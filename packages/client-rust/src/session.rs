//! Resident authentication state, passed explicitly instead of looked up
//! from an ambient context.

use std::sync::Arc;

use tracing::info;

use crate::api::{ApiError, Backend};
use crate::models::User;
use crate::storage::{SessionStorage, StorageError, ACCESS_TOKEN_KEY, HOUSE_ID_KEY};

/// Errors from session transitions.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Signed-in resident, token and house, backed by injected storage.
pub struct AuthSession {
    storage: Arc<dyn SessionStorage>,
    user: Option<User>,
    token: Option<String>,
    house: Option<String>,
}

impl AuthSession {
    /// Creates a session, restoring token and house from `storage`.
    #[must_use]
    pub fn restore(storage: Arc<dyn SessionStorage>) -> Self {
        let token = storage.get(ACCESS_TOKEN_KEY);
        let house = storage.get(HOUSE_ID_KEY);
        Self {
            storage,
            user: None,
            token,
            house,
        }
    }

    /// Signs in and persists the token, plus the house when the backend sends one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the credentials or the session
    /// cannot be persisted. The session is left unchanged on backend failure.
    pub async fn login(
        &mut self,
        backend: &dyn Backend,
        email: &str,
        password: &str,
    ) -> Result<&User, SessionError> {
        let response = backend.login(email, password).await?;

        self.storage.set(ACCESS_TOKEN_KEY, &response.token)?;
        self.token = Some(response.token);
        if let Some(house) = response.house_id {
            self.storage.set(HOUSE_ID_KEY, &house)?;
            self.house = Some(house);
        }
        info!(user_id = %response.user.id, "signed in");
        Ok(self.user.insert(response.user))
    }

    /// Replaces the token. A present token is persisted; clearing it only
    /// affects this session.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be persisted.
    pub fn set_token(&mut self, token: Option<String>) -> Result<(), StorageError> {
        if let Some(token) = &token {
            self.storage.set(ACCESS_TOKEN_KEY, token)?;
        }
        self.token = token;
        Ok(())
    }

    /// Signs out, removing the persisted token. The house is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be removed from storage.
    pub fn logout(&mut self) -> Result<(), StorageError> {
        self.storage.remove(ACCESS_TOKEN_KEY)?;
        self.token = None;
        self.user = None;
        info!("signed out");
        Ok(())
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    #[must_use]
    pub fn house(&self) -> Option<&str> {
        self.house.as_deref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}
