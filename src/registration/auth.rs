//! Account and session handling on top of the backend session client

use crate::backend::{Account, AccountApi, Session};
use crate::error::AuthError;
use std::sync::Arc;
use tracing::{error, info};

pub struct SessionManager {
    account: Arc<dyn AccountApi>,
}

impl SessionManager {
    pub fn new(account: Arc<dyn AccountApi>) -> Self {
        Self { account }
    }

    pub async fn current_user(&self) -> Result<Account, AuthError> {
        self.account
            .get_current_user()
            .await
            .inspect_err(|e| error!("Failed to load current user: {}", e))
    }

    pub async fn create_account(
        &self,
        user_id: &str,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Account, AuthError> {
        let account = self
            .account
            .create_account(user_id, email, password, name)
            .await
            .inspect_err(|e| error!("Failed to create account for {}: {}", email, e))?;

        info!("Created account {} for {}", account.id, email);
        Ok(account)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = self
            .account
            .create_session(email, password)
            .await
            .inspect_err(|e| error!("Login failed for {}: {}", email, e))?;

        info!("Session {} started for user {}", session.id, session.user_id);
        Ok(session)
    }

    pub async fn logout(&self) -> Result<(), AuthError> {
        self.account
            .delete_session()
            .await
            .inspect_err(|e| error!("Logout failed: {}", e))?;

        info!("Current session closed");
        Ok(())
    }
}
