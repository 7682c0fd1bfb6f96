//! User directory over the profile and membership card collections

use crate::error::StoreError;
use crate::registration::config::CollectionIds;
use crate::registration::document_store::{to_fields, DocumentStore, Stored};
use crate::registration::membership_card::{generate_card_number_for, MembershipCard};
use crate::registration::user_profile::{Role, UserProfile};
use chrono::Datelike;
use std::sync::Arc;
use tracing::{info, warn};

pub const DEFAULT_LIST_LIMIT: u32 = 100;

pub struct UserDirectory {
    store: Arc<DocumentStore>,
    collections: CollectionIds,
}

impl UserDirectory {
    pub fn new(store: Arc<DocumentStore>, collections: CollectionIds) -> Self {
        Self { store, collections }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub async fn create_profile(
        &self,
        profile: &UserProfile,
    ) -> Result<Stored<UserProfile>, StoreError> {
        let document = self
            .store
            .create(&self.collections.user_profiles, to_fields(profile)?)
            .await?;

        info!("Created profile {} for user '{}'", document.id, profile.user_id);
        Stored::from_document(&document)
    }

    /// Issue an active standard card for the profile, valid one year from now.
    pub async fn issue_card(
        &self,
        user_id: &str,
        profile: &UserProfile,
    ) -> Result<Stored<MembershipCard>, StoreError> {
        let issued_at = self.store.now();
        let numero = generate_card_number_for(issued_at.year(), &mut rand::thread_rng());
        let card = MembershipCard::issue(user_id, profile, numero, issued_at);

        let document = self
            .store
            .create(&self.collections.tessere, to_fields(&card)?)
            .await?;

        info!(
            "Issued card {} to user '{}' (expires {})",
            card.numero_tessera, user_id, card.data_scadenza
        );
        Stored::from_document(&document)
    }

    pub async fn get_user_profile(
        &self,
        user_id: &str,
    ) -> Result<Option<Stored<UserProfile>>, StoreError> {
        self.store
            .find_one_by_field(&self.collections.user_profiles, "user_id", user_id)
            .await?
            .map(|document| Stored::from_document(&document))
            .transpose()
    }

    pub async fn get_user_card(
        &self,
        user_id: &str,
    ) -> Result<Option<Stored<MembershipCard>>, StoreError> {
        self.store
            .find_one_by_field(&self.collections.tessere, "user_id", user_id)
            .await?
            .map(|document| Stored::from_document(&document))
            .transpose()
    }

    pub async fn list_profiles(&self, limit: u32) -> Result<Vec<Stored<UserProfile>>, StoreError> {
        self.store
            .list(&self.collections.user_profiles, limit)
            .await?
            .iter()
            .map(Stored::from_document)
            .collect()
    }

    pub async fn list_cards(&self, limit: u32) -> Result<Vec<Stored<MembershipCard>>, StoreError> {
        self.store
            .list(&self.collections.tessere, limit)
            .await?
            .iter()
            .map(Stored::from_document)
            .collect()
    }

    /// Whether the user's profile carries an administrative role (ADMIN or DIRIGENTE,
    /// any case).
    ///
    /// Fails closed: a missing profile or a failed lookup returns `false`, never an error.
    pub async fn is_admin(&self, user_id: &str) -> bool {
        match self
            .store
            .find_one_by_field(&self.collections.user_profiles, "user_id", user_id)
            .await
        {
            Ok(Some(document)) => document
                .get_str("role")
                .map(Role::from)
                .is_some_and(|role| role.is_admin()),
            Ok(None) => false,
            Err(e) => {
                warn!("Admin check for '{}' denied after lookup failure: {}", user_id, e);
                false
            }
        }
    }
}
