//! Registration workflow: account, session, profile, membership card
//!
//! The four steps run strictly in order and nothing is rolled back. If the
//! profile or the card cannot be created, the account (and its session)
//! created by the earlier steps stays in place and the error is returned.

use crate::backend::{unique_id, Account};
use crate::error::RegistrationError;
use crate::registration::auth::SessionManager;
use crate::registration::document_store::Stored;
use crate::registration::membership_card::MembershipCard;
use crate::registration::user_directory::UserDirectory;
use crate::registration::user_profile::{full_name, UserProfile};
use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Deserialize)]
pub struct NewRegistration {
    pub email: String,
    pub password: String,
    pub nome: String,
    #[serde(default)]
    pub cognome: Option<String>,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub data_nascita: Option<String>,
    #[serde(default)]
    pub luogo_nascita: Option<String>,
}

impl NewRegistration {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        nome: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            nome: nome.into(),
            cognome: None,
            telefono: None,
            data_nascita: None,
            luogo_nascita: None,
        }
    }

    pub fn with_cognome(mut self, cognome: impl Into<String>) -> Self {
        self.cognome = Some(cognome.into());
        self
    }

    pub fn with_telefono(mut self, telefono: impl Into<String>) -> Self {
        self.telefono = Some(telefono.into());
        self
    }

    pub fn with_birth(mut self, data: impl Into<String>, luogo: impl Into<String>) -> Self {
        self.data_nascita = Some(data.into());
        self.luogo_nascita = Some(luogo.into());
        self
    }

    pub fn display_name(&self) -> String {
        full_name(&self.nome, self.cognome.as_deref().unwrap_or_default())
    }

    fn profile_for(&self, user_id: &str) -> UserProfile {
        UserProfile::new(user_id, &self.email, &self.nome, self.cognome.as_deref())
            .with_telefono(self.telefono.clone().unwrap_or_default())
            .with_birth(
                self.data_nascita.clone().unwrap_or_default(),
                self.luogo_nascita.clone().unwrap_or_default(),
            )
    }
}

impl std::fmt::Debug for NewRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewRegistration")
            .field("email", &self.email)
            .field("nome", &self.nome)
            .field("cognome", &self.cognome)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub account: Account,
    pub profile: Stored<UserProfile>,
    pub card: Stored<MembershipCard>,
}

pub struct Provisioner {
    sessions: SessionManager,
    directory: UserDirectory,
}

impl Provisioner {
    pub fn new(sessions: SessionManager, directory: UserDirectory) -> Self {
        Self {
            sessions,
            directory,
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn directory(&self) -> &UserDirectory {
        &self.directory
    }

    pub async fn register(
        &self,
        registration: &NewRegistration,
    ) -> Result<Registration, RegistrationError> {
        self.run(registration).await.inspect_err(|e| {
            error!("Registration of {} failed: {}", registration.email, e);
        })
    }

    async fn run(&self, registration: &NewRegistration) -> Result<Registration, RegistrationError> {
        // 1. Account
        let account = self
            .sessions
            .create_account(
                &unique_id(),
                &registration.email,
                &registration.password,
                &registration.display_name(),
            )
            .await?;

        // 2. Auto-login
        self.sessions
            .login(&registration.email, &registration.password)
            .await?;

        // 3. Profile
        let profile = self
            .directory
            .create_profile(&registration.profile_for(&account.id))
            .await?;

        // 4. Card
        let card = self.directory.issue_card(&account.id, &profile).await?;

        info!(
            "Registered {} as {} with card {}",
            registration.email, account.id, card.numero_tessera
        );

        Ok(Registration {
            account,
            profile,
            card,
        })
    }
}
