//! Backend platform seams: account/session API and document API.
//!
//! [`AppwriteClient`] implements both traits over the REST API. Everything
//! above this module only talks to the traits.

pub mod client;
pub mod query;

pub use client::AppwriteClient;
pub use query::Query;

use crate::error::{AuthError, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Generate a backend-unique identifier for accounts and documents.
pub fn unique_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub registration: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(rename = "$id")]
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub expire: Option<DateTime<Utc>>,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub current: bool,
}

/// Schemaless record stored in a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$collectionId", default)]
    pub collection_id: String,
    #[serde(rename = "$databaseId", default)]
    pub database_id: String,
    #[serde(rename = "$createdAt", default)]
    pub backend_created_at: Option<DateTime<Utc>>,
    #[serde(rename = "$updatedAt", default)]
    pub backend_updated_at: Option<DateTime<Utc>>,
    #[serde(rename = "$permissions", default)]
    pub permissions: Vec<String>,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl Document {
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }

    /// Read an RFC 3339 timestamp field written by the client.
    pub fn get_timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        self.get_str(field)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Deserialize the caller fields into a typed record.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        Ok(serde_json::from_value(Value::Object(self.data.clone()))?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentList {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub documents: Vec<Document>,
}

/// Session client contract of the backend platform.
#[async_trait]
pub trait AccountApi: Send + Sync {
    async fn get_current_user(&self) -> Result<Account, AuthError>;

    async fn create_account(
        &self,
        user_id: &str,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Account, AuthError>;

    async fn create_session(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Terminate the current session.
    async fn delete_session(&self) -> Result<(), AuthError>;
}

/// Raw document calls of the backend platform.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    async fn list_documents(
        &self,
        database_id: &str,
        collection_id: &str,
        queries: &[Query],
    ) -> Result<DocumentList, StoreError>;

    async fn get_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
    ) -> Result<Document, StoreError>;

    async fn create_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
        data: &Map<String, Value>,
    ) -> Result<Document, StoreError>;

    async fn update_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
        data: &Map<String, Value>,
    ) -> Result<Document, StoreError>;
}
