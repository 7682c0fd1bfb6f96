//! Membership card record and card number generation

use crate::registration::clock::{serialize_millis, serialize_millis_opt};
use crate::registration::user_profile::UserProfile;
use chrono::{DateTime, Datelike, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const CARD_PREFIX: &str = "MA";
pub const CARD_VALIDITY_DAYS: i64 = 365;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MembershipCard {
    pub user_id: String,
    pub numero_tessera: String,
    pub nome_completo: String,
    pub email: String,
    #[serde(default)]
    pub telefono: String,
    #[serde(serialize_with = "serialize_millis")]
    pub data_emissione: DateTime<Utc>,
    #[serde(serialize_with = "serialize_millis")]
    pub data_scadenza: DateTime<Utc>,
    pub stato: String,
    pub tipo: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_millis_opt"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_millis_opt"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl MembershipCard {
    pub const STATUS_ACTIVE: &'static str = "ATTIVA";
    pub const TYPE_STANDARD: &'static str = "STANDARD";

    /// Active standard card for `profile`, valid for one year from `issued_at`.
    pub fn issue(
        user_id: impl Into<String>,
        profile: &UserProfile,
        numero_tessera: impl Into<String>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            numero_tessera: numero_tessera.into(),
            nome_completo: profile.full_name.clone(),
            email: profile.email.clone(),
            telefono: profile.telefono.clone(),
            data_emissione: issued_at,
            data_scadenza: issued_at + Duration::days(CARD_VALIDITY_DAYS),
            stato: Self::STATUS_ACTIVE.to_string(),
            tipo: Self::TYPE_STANDARD.to_string(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.stato == Self::STATUS_ACTIVE
    }
}

/// `MA<year><5-digit random>`. Not checked for uniqueness.
pub fn generate_card_number() -> String {
    generate_card_number_for(Utc::now().year(), &mut rand::thread_rng())
}

pub fn generate_card_number_for<R: Rng + ?Sized>(year: i32, rng: &mut R) -> String {
    let suffix: u32 = rng.gen_range(0..=99_999);
    format!("{}{:04}{:05}", CARD_PREFIX, year, suffix)
}
