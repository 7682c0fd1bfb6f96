//! Configuration for the backend endpoint, project, database and collections

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the REST API, including the version segment.
    pub endpoint: String,
    pub project_id: String,
    /// Every document call is scoped to this database.
    pub database_id: String,
    pub collections: CollectionIds,
    pub buckets: BucketIds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionIds {
    pub user_profiles: String,
    pub tessere: String,
    pub notizie: String,
    pub convenzioni: String,
    pub organico_dirigenti: String,
    pub richieste: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketIds {
    pub documents: String,
    pub images: String,
    pub tessere: String,
}

impl BackendConfig {
    pub fn new(
        endpoint: impl Into<String>,
        project_id: impl Into<String>,
        database_id: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            project_id: project_id.into(),
            database_id: database_id.into(),
            ..Self::default()
        }
    }

    pub fn with_collections(mut self, collections: CollectionIds) -> Self {
        self.collections = collections;
        self
    }

    pub fn with_buckets(mut self, buckets: BucketIds) -> Self {
        self.buckets = buckets;
        self
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: BackendConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config file '{}': {}", path.display(), e),
            ))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "endpoint must be an http(s) URL, got '{}'",
                self.endpoint
            )));
        }
        if self.project_id.trim().is_empty() {
            return Err(ConfigError::Invalid("project_id cannot be empty".to_string()));
        }
        if self.database_id.trim().is_empty() {
            return Err(ConfigError::Invalid("database_id cannot be empty".to_string()));
        }

        let mut seen = HashSet::new();
        for (name, id) in self.collections.named() {
            if id.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "collection id for '{}' cannot be empty",
                    name
                )));
            }
            if !seen.insert(id) {
                return Err(ConfigError::Invalid(format!(
                    "collection '{}' reuses id '{}' of another collection",
                    name, id
                )));
            }
        }
        Ok(())
    }
}

impl CollectionIds {
    fn named(&self) -> [(&'static str, &str); 6] {
        [
            ("user_profiles", self.user_profiles.as_str()),
            ("tessere", self.tessere.as_str()),
            ("notizie", self.notizie.as_str()),
            ("convenzioni", self.convenzioni.as_str()),
            ("organico_dirigenti", self.organico_dirigenti.as_str()),
            ("richieste", self.richieste.as_str()),
        ]
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://fra.cloud.appwrite.io/v1".to_string(),
            project_id: "688db9670010e3113d56".to_string(),
            database_id: "688dbfaf001fcce68c0f".to_string(),
            collections: CollectionIds::default(),
            buckets: BucketIds::default(),
        }
    }
}

impl Default for CollectionIds {
    fn default() -> Self {
        Self {
            user_profiles: "688dca4f00345547d52f".to_string(),
            tessere: "688e6222002987f97521".to_string(),
            notizie: "688e02b3000595a16b2c".to_string(),
            convenzioni: "688e03f000195871d9e".to_string(),
            organico_dirigenti: "688e0501000254ad0966".to_string(),
            richieste: "richieste".to_string(),
        }
    }
}

impl Default for BucketIds {
    fn default() -> Self {
        Self {
            documents: "documents-bucket".to_string(),
            images: "images-bucket".to_string(),
            tessere: "tessere-bucket".to_string(),
        }
    }
}
