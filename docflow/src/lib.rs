//! Main docflow crate: provisioning and document workflows over a document store.
//!
//! This crate is the primary entry point of the docflow workspace. It re-exports the core
//! types from `docflow-core`, exposes the available backends, and carries the family
//! workflow together with its configuration and status reporting.
//!
//! # Quick Start
//!
//! ```ignore
//! use docflow::{prelude::*, family::Family, sink::TracingSink};
//!
//! #[tokio::main]
//! async fn main() -> DocumentStoreResult<()> {
//!     let endpoint = connect(&EndpointConfig::default()).await?;
//!
//!     // Make sure the database and collection exist; running this twice reports `Found`.
//!     let provisioner = endpoint.provisioner();
//!     provisioner.ensure_database("FamilyDB").await?;
//!     provisioner
//!         .ensure_collection("FamilyDB", "FamilyCollection", &CollectionSpec::default())
//!         .await?;
//!
//!     let families = endpoint.typed_collection::<Family>("FamilyDB", "FamilyCollection");
//!     families.create_if_absent(&docflow::family::andersen()).await?;
//!
//!     let mut cursor = families.query(Query::filtered(Filter::eq("lastName", "Andersen")), 100)?;
//!     while let Some(page) = cursor.next_page().await? {
//!         for family in page.items {
//!             println!("{family}");
//!         }
//!     }
//!
//!     endpoint.shutdown().await
//! }
//! ```
//!
//! # Running the whole workflow
//!
//! ```ignore
//! let endpoint = connect(&EndpointConfig::default()).await?;
//! let report = Workflow::new(&endpoint, WorkflowConfig::default(), TracingSink)
//!     .run()
//!     .await?;
//! ```
//!
//! # Backends
//!
//! - [`memory`] - In-process store for development and testing
//! - [`mongodb`] - MongoDB backend (requires the `mongodb` feature)

pub mod config;
pub mod family;
pub mod prelude;
pub mod sink;
pub mod workflow;

pub use docflow_core::{
    backend, collection, cursor, document, endpoint, error, lookup, page, provision, query,
    resource,
};
pub use docflow_core::endpoint::StoreEndpoint;

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use docflow_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docflow_mongodb::{MongoDbStore, MongoDbStoreBuilder};
}
