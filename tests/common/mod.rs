//! In-memory backend for integration tests
//!
//! Implements both backend traits over plain maps and lets a test make a
//! collection reject writes or fail reads.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tessera_client::backend::{
    Account, AccountApi, Document, DocumentApi, DocumentList, Query, Session,
};
use tessera_client::registration::{
    BackendConfig, Clock, DocumentStore, FixedClock, Provisioner, RequestDesk, SessionManager,
    UserDirectory,
};
use tessera_client::{ApiError, AuthError, StoreError};

#[derive(Default)]
struct State {
    accounts: Vec<(Account, String)>,
    current_session: Option<Session>,
    documents: HashMap<String, Vec<Document>>,
    failing_collection: Option<String>,
    unreachable_collection: Option<String>,
}

#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every create/update in `collection` fail with a backend error.
    pub fn fail_writes_to(&self, collection: &str) {
        self.state.lock().unwrap().failing_collection = Some(collection.to_string());
    }

    /// Make every read from `collection` fail as if the backend were down.
    pub fn fail_reads_from(&self, collection: &str) {
        self.state.lock().unwrap().unreachable_collection = Some(collection.to_string());
    }

    pub fn account_count(&self) -> usize {
        self.state.lock().unwrap().accounts.len()
    }

    pub fn has_session(&self) -> bool {
        self.state.lock().unwrap().current_session.is_some()
    }

    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.state
            .lock()
            .unwrap()
            .documents
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Insert a document directly, bypassing the facade.
    pub fn seed(&self, collection: &str, id: &str, data: Value) {
        let Value::Object(data) = data else {
            panic!("seed data must be an object");
        };
        let document = make_document(collection, id, data);
        self.state
            .lock()
            .unwrap()
            .documents
            .entry(collection.to_string())
            .or_default()
            .push(document);
    }

    fn check_writable(state: &State, collection: &str) -> Result<(), StoreError> {
        if state.failing_collection.as_deref() == Some(collection) {
            return Err(StoreError::Api(ApiError::new(
                400,
                "document_invalid_structure",
                format!("Invalid document structure for {}", collection),
            )));
        }
        Ok(())
    }

    fn check_readable(state: &State, collection: &str) -> Result<(), StoreError> {
        if state.unreachable_collection.as_deref() == Some(collection) {
            return Err(StoreError::Transport(format!(
                "connection reset while reading {}",
                collection
            )));
        }
        Ok(())
    }
}

fn make_document(collection: &str, id: &str, data: Map<String, Value>) -> Document {
    Document {
        id: id.to_string(),
        collection_id: collection.to_string(),
        database_id: "test-db".to_string(),
        backend_created_at: Some(Utc::now()),
        backend_updated_at: Some(Utc::now()),
        permissions: Vec::new(),
        data,
    }
}

fn not_found(collection: &str, id: &str) -> StoreError {
    StoreError::Api(ApiError::new(
        404,
        "document_not_found",
        format!("Document {} not found in {}", id, collection),
    ))
}

fn matches(document: &Document, query: &Query) -> bool {
    match query {
        Query::Equal { attribute, values } => document
            .data
            .get(attribute)
            .is_some_and(|value| values.contains(value)),
        _ => true,
    }
}

#[async_trait]
impl AccountApi for MemoryBackend {
    async fn get_current_user(&self) -> Result<Account, AuthError> {
        let state = self.state.lock().unwrap();
        let session = state.current_session.as_ref().ok_or_else(|| {
            AuthError::Api(ApiError::new(401, "general_unauthorized_scope", "Missing session"))
        })?;
        state
            .accounts
            .iter()
            .find(|(account, _)| account.id == session.user_id)
            .map(|(account, _)| account.clone())
            .ok_or_else(|| AuthError::Api(ApiError::new(404, "user_not_found", "No such user")))
    }

    async fn create_account(
        &self,
        user_id: &str,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Account, AuthError> {
        let mut state = self.state.lock().unwrap();
        if state.accounts.iter().any(|(a, _)| a.email == email) {
            return Err(AuthError::Api(ApiError::new(
                409,
                "user_already_exists",
                "A user with the same email already exists",
            )));
        }
        let account = Account {
            id: user_id.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            registration: Some(Utc::now()),
            status: true,
        };
        state.accounts.push((account.clone(), password.to_string()));
        Ok(account)
    }

    async fn create_session(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let mut state = self.state.lock().unwrap();
        let user_id = state
            .accounts
            .iter()
            .find(|(a, p)| a.email == email && p == password)
            .map(|(a, _)| a.id.clone())
            .ok_or_else(|| {
                AuthError::Api(ApiError::new(401, "user_invalid_credentials", "Invalid credentials"))
            })?;
        let session = Session {
            id: format!("session-{}", user_id),
            user_id,
            expire: None,
            provider: "email".to_string(),
            current: true,
        };
        state.current_session = Some(session.clone());
        Ok(session)
    }

    async fn delete_session(&self) -> Result<(), AuthError> {
        let mut state = self.state.lock().unwrap();
        match state.current_session.take() {
            Some(_) => Ok(()),
            None => Err(AuthError::Api(ApiError::new(
                401,
                "general_unauthorized_scope",
                "Missing session",
            ))),
        }
    }
}

#[async_trait]
impl DocumentApi for MemoryBackend {
    async fn list_documents(
        &self,
        _database_id: &str,
        collection_id: &str,
        queries: &[Query],
    ) -> Result<DocumentList, StoreError> {
        let state = self.state.lock().unwrap();
        Self::check_readable(&state, collection_id)?;
        let mut documents: Vec<Document> = state
            .documents
            .get(collection_id)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|d| queries.iter().all(|q| matches(d, q)))
            .collect();

        for query in queries {
            match query {
                Query::OrderDesc(attr) => documents.sort_by(|a, b| {
                    b.get_str(attr).unwrap_or("").cmp(a.get_str(attr).unwrap_or(""))
                }),
                Query::OrderAsc(attr) => documents.sort_by(|a, b| {
                    a.get_str(attr).unwrap_or("").cmp(b.get_str(attr).unwrap_or(""))
                }),
                _ => {}
            }
        }
        let total = documents.len() as u64;
        if let Some(limit) = queries.iter().find_map(|q| match q {
            Query::Limit(limit) => Some(*limit as usize),
            _ => None,
        }) {
            documents.truncate(limit);
        }

        Ok(DocumentList { total, documents })
    }

    async fn get_document(
        &self,
        _database_id: &str,
        collection_id: &str,
        document_id: &str,
    ) -> Result<Document, StoreError> {
        let state = self.state.lock().unwrap();
        Self::check_readable(&state, collection_id)?;
        state
            .documents
            .get(collection_id)
            .and_then(|docs| docs.iter().find(|d| d.id == document_id))
            .cloned()
            .ok_or_else(|| not_found(collection_id, document_id))
    }

    async fn create_document(
        &self,
        _database_id: &str,
        collection_id: &str,
        document_id: &str,
        data: &Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let mut state = self.state.lock().unwrap();
        Self::check_writable(&state, collection_id)?;
        let document = make_document(collection_id, document_id, data.clone());
        state
            .documents
            .entry(collection_id.to_string())
            .or_default()
            .push(document.clone());
        Ok(document)
    }

    async fn update_document(
        &self,
        _database_id: &str,
        collection_id: &str,
        document_id: &str,
        data: &Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let mut state = self.state.lock().unwrap();
        Self::check_writable(&state, collection_id)?;
        let document = state
            .documents
            .get_mut(collection_id)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == document_id))
            .ok_or_else(|| not_found(collection_id, document_id))?;
        for (key, value) in data {
            document.data.insert(key.clone(), value.clone());
        }
        document.backend_updated_at = Some(Utc::now());
        Ok(document.clone())
    }
}

pub fn fixed_clock(year: i32, month: u32, day: u32) -> Arc<dyn Clock> {
    Arc::new(FixedClock(
        Utc.with_ymd_and_hms(year, month, day, 10, 30, 0).unwrap(),
    ))
}

pub struct Harness {
    pub backend: Arc<MemoryBackend>,
    pub config: BackendConfig,
    pub store: Arc<DocumentStore>,
    pub provisioner: Provisioner,
    pub desk: RequestDesk,
}

impl Harness {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let backend = MemoryBackend::new();
        let config = BackendConfig::default();
        let store = Arc::new(
            DocumentStore::new(backend.clone(), config.database_id.clone()).with_clock(clock),
        );
        let directory = UserDirectory::new(store.clone(), config.collections.clone());
        let provisioner = Provisioner::new(SessionManager::new(backend.clone()), directory);
        let desk = RequestDesk::new(store.clone(), config.collections.richieste.clone());
        Self {
            backend,
            config,
            store,
            provisioner,
            desk,
        }
    }
}
