//! MongoDB backend implementation for docflow.
//!
//! This crate provides a MongoDB-based implementation of the `StoreBackend` trait, with
//! databases and collections provisioned explicitly and queries executed by MongoDB's
//! query engine.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! docflow = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use docflow::{StoreEndpoint, backend::StoreBackendBuilder, mongodb::MongoDbStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MongoDbStore::builder("mongodb://localhost:27017")
//!         .build()
//!         .await?;
//!     let endpoint = StoreEndpoint::new(store);
//!
//!     endpoint.provisioner().ensure_database("FamilyDB").await?;
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docflow_mongodb;

pub mod error;
pub mod query;
pub mod sanitizer;
pub mod store;

pub use store::{MongoDbStore, MongoDbStoreBuilder};
