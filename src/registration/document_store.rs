//! Document store facade scoped to one database
//!
//! Every write is stamped with `created_at`/`updated_at` by the client. Errors
//! from the backend are logged with context and returned unchanged.

use crate::backend::{unique_id, Document, DocumentApi, Query};
use crate::error::StoreError;
use crate::registration::clock::{format_timestamp, truncate_to_millis, Clock, SystemClock};
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::ops::Deref;
use std::sync::Arc;
use tracing::{debug, error};

pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

/// A typed record together with the id of the document holding it.
#[derive(Debug, Clone, PartialEq)]
pub struct Stored<T> {
    pub id: String,
    pub record: T,
}

impl<T: DeserializeOwned> Stored<T> {
    pub fn from_document(document: &Document) -> Result<Self, StoreError> {
        Ok(Self {
            id: document.id.clone(),
            record: document.decode()?,
        })
    }
}

impl<T> Deref for Stored<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.record
    }
}

pub struct DocumentStore {
    backend: Arc<dyn DocumentApi>,
    database_id: String,
    clock: Arc<dyn Clock>,
}

impl DocumentStore {
    pub fn new(backend: Arc<dyn DocumentApi>, database_id: impl Into<String>) -> Self {
        Self {
            backend,
            database_id: database_id.into(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn database_id(&self) -> &str {
        &self.database_id
    }

    /// Current time as it would be stamped on a document.
    pub fn now(&self) -> DateTime<Utc> {
        truncate_to_millis(self.clock.now())
    }

    /// First document with `field == value`, or `None` when nothing matches.
    pub async fn find_one_by_field(
        &self,
        collection: &str,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<Option<Document>, StoreError> {
        let queries = [Query::equal(field, value)];
        let list = self
            .backend
            .list_documents(&self.database_id, collection, &queries)
            .await
            .inspect_err(|e| {
                error!("Lookup in '{}' by '{}' failed: {}", collection, field, e);
            })?;

        Ok(list.documents.into_iter().next())
    }

    pub async fn get(&self, collection: &str, id: &str) -> Result<Document, StoreError> {
        self.backend
            .get_document(&self.database_id, collection, id)
            .await
            .inspect_err(|e| error!("Failed to load {}/{}: {}", collection, id, e))
    }

    /// Persist a new document under a fresh id. Both timestamps get the same instant.
    pub async fn create(
        &self,
        collection: &str,
        mut data: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let stamp = Value::String(format_timestamp(self.now()));
        data.insert(CREATED_AT.to_string(), stamp.clone());
        data.insert(UPDATED_AT.to_string(), stamp);

        let id = unique_id();
        let document = self
            .backend
            .create_document(&self.database_id, collection, &id, &data)
            .await
            .inspect_err(|e| error!("Failed to create document in '{}': {}", collection, e))?;

        debug!("Created {}/{}", collection, document.id);
        Ok(document)
    }

    /// Merge `partial` into an existing document and refresh `updated_at`.
    ///
    /// The new `updated_at` is strictly later than the stored one, even when
    /// the clock has not advanced since the previous write.
    pub async fn update(
        &self,
        collection: &str,
        id: &str,
        mut partial: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let current = self.get(collection, id).await?;

        let mut stamp = self.now();
        if let Some(previous) = current.get_timestamp(UPDATED_AT) {
            if stamp <= previous {
                stamp = truncate_to_millis(previous) + Duration::milliseconds(1);
            }
        }
        partial.insert(
            UPDATED_AT.to_string(),
            Value::String(format_timestamp(stamp)),
        );

        let document = self
            .backend
            .update_document(&self.database_id, collection, id, &partial)
            .await
            .inspect_err(|e| error!("Failed to update {}/{}: {}", collection, id, e))?;

        debug!("Updated {}/{}", collection, id);
        Ok(document)
    }

    /// Up to `limit` documents, newest first.
    pub async fn list(&self, collection: &str, limit: u32) -> Result<Vec<Document>, StoreError> {
        let queries = [Query::limit(limit), Query::order_desc(CREATED_AT)];
        let list = self
            .backend
            .list_documents(&self.database_id, collection, &queries)
            .await
            .inspect_err(|e| error!("Failed to list '{}': {}", collection, e))?;

        Ok(list.documents)
    }
}

/// Serialize a record into the field map sent to the backend.
pub(crate) fn to_fields<T: serde::Serialize>(record: &T) -> Result<Map<String, Value>, StoreError> {
    match serde_json::to_value(record)? {
        Value::Object(fields) => Ok(fields),
        other => Err(StoreError::Decode(serde::de::Error::custom(format!(
            "record must serialize to an object, got {}",
            other
        )))),
    }
}
