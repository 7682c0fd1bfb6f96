//! REST transport for the backend platform
//!
//! One `AppwriteClient` per configured project. It keeps the session
//! credential handed out at login and replays it on every later call.

use crate::backend::{
    Account, AccountApi, Document, DocumentApi, DocumentList, Query, Session,
};
use crate::error::{ApiError, AuthError, ConfigError, StoreError};
use crate::registration::config::BackendConfig;
use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{HeaderMap, CONTENT_TYPE, SET_COOKIE};
use hyper::{Method, Request};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

type HttpsClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

const PROJECT_HEADER: &str = "X-Appwrite-Project";
const FALLBACK_COOKIES_HEADER: &str = "X-Fallback-Cookies";

/// Failure of a single REST call, before it is attributed to a store or auth error.
#[derive(Debug)]
enum HttpError {
    Api(ApiError),
    Transport(String),
    Decode(serde_json::Error),
}

impl From<HttpError> for StoreError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Api(e) => StoreError::Api(e),
            HttpError::Transport(e) => StoreError::Transport(e),
            HttpError::Decode(e) => StoreError::Decode(e),
        }
    }
}

impl From<HttpError> for AuthError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Api(e) => AuthError::Api(e),
            HttpError::Transport(e) => AuthError::Transport(e),
            HttpError::Decode(e) => AuthError::Decode(e),
        }
    }
}

struct RawResponse {
    headers: HeaderMap,
    body: Bytes,
}

impl RawResponse {
    fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        serde_json::from_slice(&self.body).map_err(HttpError::Decode)
    }
}

pub struct AppwriteClient {
    http: HttpsClient,
    endpoint: String,
    project_id: String,
    session: RwLock<Option<String>>,
}

impl AppwriteClient {
    pub fn new(config: &BackendConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let _ = rustls::crypto::ring::default_provider().install_default();

        let roots = match hyper_rustls::HttpsConnectorBuilder::new().with_native_roots() {
            Ok(builder) => builder,
            Err(e) => {
                warn!("Native TLS roots unavailable ({}), using bundled roots", e);
                hyper_rustls::HttpsConnectorBuilder::new().with_webpki_roots()
            }
        };

        let connector = roots
            .https_or_http()
            .enable_http1()
            .enable_http2()
            .build();

        let http = Client::builder(TokioExecutor::new()).build(connector);

        info!(
            "Backend client initialized: endpoint={} project={} database={}",
            config.endpoint, config.project_id, config.database_id
        );

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            session: RwLock::new(None),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn has_session(&self) -> bool {
        self.session.read().await.is_some()
    }

    /// Probe `<endpoint>/health`. Any failure counts as unreachable.
    pub async fn check_connection(&self) -> bool {
        match self.send(Method::GET, "/health", None, None).await {
            Ok(_) => true,
            Err(HttpError::Api(e)) => {
                warn!("Health check rejected: {}", e);
                false
            }
            Err(HttpError::Transport(e)) => {
                warn!("Health check failed: {}", e);
                false
            }
            Err(HttpError::Decode(_)) => false,
        }
    }

    fn documents_path(database_id: &str, collection_id: &str) -> String {
        format!(
            "/databases/{}/collections/{}/documents",
            urlencoding::encode(database_id),
            urlencoding::encode(collection_id)
        )
    }

    fn document_path(database_id: &str, collection_id: &str, document_id: &str) -> String {
        format!(
            "{}/{}",
            Self::documents_path(database_id, collection_id),
            urlencoding::encode(document_id)
        )
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: Option<String>,
        body: Option<Value>,
    ) -> Result<RawResponse, HttpError> {
        let mut uri = format!("{}{}", self.endpoint, path);
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            uri.push('?');
            uri.push_str(&query);
        }

        let mut builder = Request::builder()
            .method(method.clone())
            .uri(&uri)
            .header(PROJECT_HEADER, self.project_id.as_str())
            .header(CONTENT_TYPE, "application/json");

        if let Some(cookies) = self.session.read().await.as_deref() {
            builder = builder.header(FALLBACK_COOKIES_HEADER, cookies);
        }

        let payload = match body {
            Some(value) => Bytes::from(serde_json::to_vec(&value).map_err(HttpError::Decode)?),
            None => Bytes::new(),
        };

        let request = builder
            .body(Full::new(payload))
            .map_err(|e| HttpError::Transport(format!("Invalid request {} {}: {}", method, uri, e)))?;

        debug!("{} {}", method, uri);

        let response = self
            .http
            .request(request)
            .await
            .map_err(|e| HttpError::Transport(format!("{} {} failed: {}", method, uri, e)))?;

        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| {
                HttpError::Transport(format!("Failed to read response of {} {}: {}", method, uri, e))
            })?
            .to_bytes();

        if !parts.status.is_success() {
            return Err(HttpError::Api(ApiError::from_response(
                parts.status.as_u16(),
                &body,
            )));
        }

        Ok(RawResponse {
            headers: parts.headers,
            body,
        })
    }

    /// Session credential from a login response, in `X-Fallback-Cookies` form.
    fn session_credential(&self, headers: &HeaderMap) -> Option<String> {
        if let Some(value) = headers
            .get(FALLBACK_COOKIES_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
        {
            return Some(value.to_string());
        }

        let cookie_name = format!("a_session_{}", self.project_id);
        headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|cookie| cookie.split(';').next())
            .filter_map(|pair| pair.split_once('='))
            .find(|(name, _)| name.trim() == cookie_name)
            .map(|(name, value)| {
                let mut cookies = Map::new();
                cookies.insert(name.trim().to_string(), Value::String(value.trim().to_string()));
                Value::Object(cookies).to_string()
            })
    }
}

#[async_trait]
impl AccountApi for AppwriteClient {
    async fn get_current_user(&self) -> Result<Account, AuthError> {
        let response = self.send(Method::GET, "/account", None, None).await?;
        Ok(response.json()?)
    }

    async fn create_account(
        &self,
        user_id: &str,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Account, AuthError> {
        let body = json!({
            "userId": user_id,
            "email": email,
            "password": password,
            "name": name,
        });
        let response = self.send(Method::POST, "/account", None, Some(body)).await?;
        Ok(response.json()?)
    }

    async fn create_session(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let body = json!({ "email": email, "password": password });
        let response = self
            .send(Method::POST, "/account/sessions/email", None, Some(body))
            .await?;

        match self.session_credential(&response.headers) {
            Some(credential) => *self.session.write().await = Some(credential),
            None => warn!("Session created for {} but no credential was returned", email),
        }

        Ok(response.json()?)
    }

    async fn delete_session(&self) -> Result<(), AuthError> {
        self.send(Method::DELETE, "/account/sessions/current", None, None)
            .await?;
        *self.session.write().await = None;
        Ok(())
    }
}

#[async_trait]
impl DocumentApi for AppwriteClient {
    async fn list_documents(
        &self,
        database_id: &str,
        collection_id: &str,
        queries: &[Query],
    ) -> Result<DocumentList, StoreError> {
        let response = self
            .send(
                Method::GET,
                &Self::documents_path(database_id, collection_id),
                Some(Query::encode_all(queries)),
                None,
            )
            .await?;
        Ok(response.json()?)
    }

    async fn get_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
    ) -> Result<Document, StoreError> {
        let response = self
            .send(
                Method::GET,
                &Self::document_path(database_id, collection_id, document_id),
                None,
                None,
            )
            .await?;
        Ok(response.json()?)
    }

    async fn create_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
        data: &Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let body = json!({ "documentId": document_id, "data": data });
        let response = self
            .send(
                Method::POST,
                &Self::documents_path(database_id, collection_id),
                None,
                Some(body),
            )
            .await?;
        Ok(response.json()?)
    }

    async fn update_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
        data: &Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let body = json!({ "data": data });
        let response = self
            .send(
                Method::PATCH,
                &Self::document_path(database_id, collection_id, document_id),
                None,
                Some(body),
            )
            .await?;
        Ok(response.json()?)
    }
}
