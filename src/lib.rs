//! Client for the membership backend: configuration, document store access,
//! and the registration workflow that provisions profiles and membership cards.

pub mod backend;
pub mod error;
pub mod registration;

pub use backend::{AccountApi, AppwriteClient, DocumentApi};
pub use error::{ApiError, AuthError, ConfigError, RegistrationError, StoreError};
