//! Client-side building blocks for provisioning and operating a hierarchical document store.
//!
//! This crate is the core of the docflow project and provides:
//!
//! - **Resource model** ([`resource`]): databases, collections, indexing policy, throughput
//! - **Store backend abstraction** ([`backend`]): the capability set a store client offers
//! - **Provisioning** ([`provision`]): idempotent ensure-exists for databases and collections
//! - **Repositories** ([`collection`]): create-if-absent, read, replace and delete by id
//! - **Query and filtering API** ([`query`]) with lazy paged execution ([`cursor`], [`page`])
//! - **Endpoint** ([`endpoint`]): the handle tying everything to one connected backend
//! - **Error handling** ([`error`]) and existence outcomes ([`lookup`])
//!
//! # Example
//!
//! ```ignore
//! use docflow_core::{endpoint::StoreEndpoint, resource::CollectionSpec};
//!
//! let endpoint = StoreEndpoint::new(backend);
//! let provisioner = endpoint.provisioner();
//!
//! provisioner.ensure_database("FamilyDB").await?;
//! provisioner
//!     .ensure_collection("FamilyDB", "FamilyCollection", &CollectionSpec::default())
//!     .await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docflow_core;

pub mod backend;
pub mod collection;
pub mod cursor;
pub mod document;
pub mod endpoint;
pub mod error;
pub mod lookup;
pub mod page;
pub mod provision;
pub mod query;
pub mod resource;

#[cfg(test)]
pub(crate) mod testing;
