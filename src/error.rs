//! Error types for the backend client

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned by the backend platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: u16,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub message: String,
}

impl ApiError {
    pub fn new(code: u16, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Build from a non-2xx response. Falls back to the raw body when it is not the usual JSON.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        match serde_json::from_slice::<ApiError>(body) {
            Ok(mut err) => {
                if err.code == 0 {
                    err.code = status;
                }
                err
            }
            Err(_) => Self::new(
                status,
                "general_unknown",
                String::from_utf8_lossy(body).trim().to_string(),
            ),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.code == 404
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.kind.is_empty() {
            write!(f, "{} ({})", self.message, self.code)
        } else {
            write!(f, "{} ({} {})", self.message, self.code, self.kind)
        }
    }
}

/// Any failure coming from a document store call.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document store rejected the request: {0}")]
    Api(ApiError),

    #[error("Document store unreachable: {0}")]
    Transport(String),

    #[error("Failed to decode document payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Api(err) if err.is_not_found())
    }
}

/// Any failure coming from the session client.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Authentication failed: {0}")]
    Api(ApiError),

    #[error("Session service unreachable: {0}")]
    Transport(String),

    #[error("Failed to decode account payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Error of the provisioning workflow. Wraps the failing step's error unchanged.
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Invalid(String),
}
