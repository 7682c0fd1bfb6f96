//! User profile record

use crate::registration::clock::serialize_millis_opt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub user_id: String,
    pub email: String,
    pub full_name: String,
    #[serde(default)]
    pub cognome: String,
    #[serde(default)]
    pub telefono: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub data_nascita: String,
    #[serde(default)]
    pub luogo_nascita: String,
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

/// Role stored on a profile. Parsed case-insensitively but otherwise exactly;
/// unknown values (including whitespace-padded ones) are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    #[default]
    User,
    Admin,
    Dirigente,
    Other(String),
}

impl UserProfile {
    pub fn new(
        user_id: impl Into<String>,
        email: impl Into<String>,
        nome: &str,
        cognome: Option<&str>,
    ) -> Self {
        let cognome = cognome.unwrap_or_default();
        Self {
            user_id: user_id.into(),
            email: email.into(),
            full_name: full_name(nome, cognome),
            cognome: cognome.to_string(),
            telefono: String::new(),
            role: Role::User,
            data_nascita: String::new(),
            luogo_nascita: String::new(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_telefono(mut self, telefono: impl Into<String>) -> Self {
        self.telefono = telefono.into();
        self
    }

    pub fn with_birth(mut self, data: impl Into<String>, luogo: impl Into<String>) -> Self {
        self.data_nascita = data.into();
        self.luogo_nascita = luogo.into();
        self
    }

    pub fn initials(&self) -> String {
        initials(&self.full_name)
    }
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
            Role::Dirigente => "DIRIGENTE",
            Role::Other(raw) => raw,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin | Role::Dirigente)
    }
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        match raw.to_uppercase().as_str() {
            "USER" => Role::User,
            "ADMIN" => Role::Admin,
            "DIRIGENTE" => Role::Dirigente,
            _ => Role::Other(raw),
        }
    }
}

impl From<&str> for Role {
    fn from(raw: &str) -> Self {
        Role::from(raw.to_string())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `"<nome> <cognome>"` with surrounding whitespace removed.
pub fn full_name(nome: &str, cognome: &str) -> String {
    format!("{} {}", nome, cognome).trim().to_string()
}

/// First letter of each word, uppercased, at most two characters.
pub fn initials(name: &str) -> String {
    name.split(' ')
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}
