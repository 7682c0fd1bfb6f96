//! Requests submitted by members and handled by administrators

use crate::error::StoreError;
use crate::registration::clock::serialize_millis_opt;
use crate::registration::document_store::{DocumentStore, Stored};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Request {
    #[serde(default)]
    pub status: String,
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
    /// Caller-supplied fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Request {
    pub const STATUS_PENDING: &'static str = "PENDING";

    pub fn is_pending(&self) -> bool {
        self.status == Self::STATUS_PENDING
    }
}

pub struct RequestDesk {
    store: Arc<DocumentStore>,
    collection: String,
}

impl RequestDesk {
    pub fn new(store: Arc<DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    /// Submit a request. Any caller-supplied `status` is replaced by PENDING.
    pub async fn create_request(
        &self,
        mut fields: Map<String, Value>,
    ) -> Result<Stored<Request>, StoreError> {
        fields.insert(
            "status".to_string(),
            Value::String(Request::STATUS_PENDING.to_string()),
        );

        let document = self.store.create(&self.collection, fields).await?;
        info!("Request {} submitted", document.id);
        Stored::from_document(&document)
    }

    pub async fn update_request(
        &self,
        id: &str,
        partial: Map<String, Value>,
    ) -> Result<Stored<Request>, StoreError> {
        let document = self.store.update(&self.collection, id, partial).await?;
        info!("Request {} updated", id);
        Stored::from_document(&document)
    }

    pub async fn set_status(
        &self,
        id: &str,
        status: impl Into<String>,
    ) -> Result<Stored<Request>, StoreError> {
        let mut partial = Map::new();
        partial.insert("status".to_string(), Value::String(status.into()));
        self.update_request(id, partial).await
    }

    /// Newest first.
    pub async fn list_requests(&self, limit: u32) -> Result<Vec<Stored<Request>>, StoreError> {
        self.store
            .list(&self.collection, limit)
            .await?
            .iter()
            .map(Stored::from_document)
            .collect()
    }
}
