//! Endpoint and workflow configuration.
//!
//! Configuration is passed around as plain values. Nothing here reads the environment;
//! the demo binary maps flags and environment variables onto these types.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use tracing::info;

use docflow_core::{
    backend::StoreBackendBuilder,
    endpoint::{DynEndpoint, StoreEndpoint},
    error::DocumentStoreResult,
    page::DEFAULT_PAGE_SIZE,
    resource::{CollectionSpec, Throughput},
};
use docflow_memory::InMemoryStore;

/// Which store client backs an endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Memory,
    MongoDb,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackendKind::Memory => "memory",
            BackendKind::MongoDb => "mongodb",
        })
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "mongodb" | "mongo" => Ok(BackendKind::MongoDb),
            other => Err(format!("unknown backend {other:?}, expected memory or mongodb")),
        }
    }
}

/// Where the store lives and how to authenticate against it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EndpointConfig {
    pub backend: BackendKind,
    /// Connection string; ignored by the in-memory backend.
    pub endpoint_uri: String,
    /// Account key, sent as the password of the connection's credential.
    pub primary_key: Option<String>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            endpoint_uri: "mongodb://localhost:27017".to_string(),
            primary_key: None,
        }
    }
}

/// Names and settings the workflow operates with.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct WorkflowConfig {
    pub database: String,
    pub collection: String,
    /// Request units provisioned for the collection when it is created.
    pub throughput: u32,
    pub page_size: usize,
    /// `lastName` the workflow's queries match on.
    pub last_name: String,
}

impl WorkflowConfig {
    /// Settings for creating the workflow's collection.
    pub fn collection_spec(&self) -> CollectionSpec {
        CollectionSpec::default().with_throughput(Throughput(self.throughput))
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            database: "FamilyDB".to_string(),
            collection: "FamilyCollection".to_string(),
            throughput: Throughput::default().0,
            page_size: DEFAULT_PAGE_SIZE,
            last_name: "Andersen".to_string(),
        }
    }
}

/// Connects the backend named by `config` and wraps it in an endpoint.
///
/// # Errors
///
/// `Initialization` if the backend cannot be set up, including when `mongodb` is selected
/// in a build without the `mongodb` feature.
pub async fn connect(config: &EndpointConfig) -> DocumentStoreResult<DynEndpoint> {
    info!(backend = %config.backend, "connecting endpoint");

    match config.backend {
        BackendKind::Memory => Ok(StoreEndpoint::new(InMemoryStore::builder().build().await?).into_dyn()),
        BackendKind::MongoDb => connect_mongodb(config).await,
    }
}

#[cfg(feature = "mongodb")]
async fn connect_mongodb(config: &EndpointConfig) -> DocumentStoreResult<DynEndpoint> {
    let mut builder = docflow_mongodb::MongoDbStore::builder(&config.endpoint_uri).with_app_name("docflow");
    if let Some(key) = &config.primary_key {
        builder = builder.with_password(key);
    }

    Ok(StoreEndpoint::new(builder.build().await?).into_dyn())
}

#[cfg(not(feature = "mongodb"))]
async fn connect_mongodb(_config: &EndpointConfig) -> DocumentStoreResult<DynEndpoint> {
    Err(docflow_core::error::DocumentStoreError::Initialization(
        "mongodb backend requested but docflow was built without the `mongodb` feature".into(),
    ))
}
