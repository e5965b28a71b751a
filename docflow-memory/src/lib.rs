//! In-memory document storage backend for docflow.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It keeps the full database/collection/document hierarchy in process, enforces the same
//! naming, throughput, and uniqueness rules a real store does, and evaluates queries with
//! filtering, sorting, and continuation-based paging.
//!
//! # Quick Start
//!
//! ```ignore
//! use docflow::{StoreEndpoint, memory::InMemoryStore, resource::CollectionSpec};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let endpoint = StoreEndpoint::new(InMemoryStore::builder().build().await?);
//!     let provisioner = endpoint.provisioner();
//!
//!     provisioner.ensure_database("FamilyDB").await?;
//!     provisioner
//!         .ensure_collection("FamilyDB", "FamilyCollection", &CollectionSpec::default())
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docflow_memory;

pub mod evaluator;
pub mod store;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
