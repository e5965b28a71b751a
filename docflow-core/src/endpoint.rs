//! Connected store handle.
//!
//! A [`StoreEndpoint`] owns one connected backend and hands out the provisioner and
//! repositories that borrow it. It is created once and reused for every operation; it holds
//! no domain state of its own.
//!
//! ```ignore
//! let endpoint = StoreEndpoint::new(InMemoryStore::new());
//!
//! endpoint.provisioner().ensure_database("FamilyDB").await?;
//! let families = endpoint.typed_collection::<Family>("FamilyDB", "FamilyCollection");
//! ```
//!
//! [`DynEndpoint`] is the same handle over a backend chosen at runtime.

use crate::{
    backend::{DynStoreBackend, StoreBackend},
    collection::{Collection, TypedCollection},
    document::Document,
    error::DocumentStoreResult,
    provision::ResourceProvisioner,
};

/// Endpoint over a backend picked at runtime.
pub type DynEndpoint = StoreEndpoint<Box<dyn DynStoreBackend>>;

/// Handle to a connected document store.
#[derive(Debug)]
pub struct StoreEndpoint<B: StoreBackend> {
    backend: B,
}

impl<B: StoreBackend> StoreEndpoint<B> {
    /// Wraps a connected backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Provisioner for databases and collections of this endpoint.
    pub fn provisioner(&self) -> ResourceProvisioner<'_, B> {
        ResourceProvisioner::new(&self.backend)
    }

    /// Untyped repository for `collection` inside `database`.
    ///
    /// No round trip is made; a missing collection surfaces on first use.
    pub fn collection(&self, database: &str, collection: &str) -> Collection<'_, B> {
        Collection::new(database.to_string(), collection.to_string(), &self.backend)
    }

    /// Typed repository for `collection` inside `database`.
    pub fn typed_collection<D: Document>(
        &self,
        database: &str,
        collection: &str,
    ) -> TypedCollection<'_, B, D> {
        TypedCollection::new(database.to_string(), collection.to_string(), &self.backend)
    }

    /// Shuts down the endpoint and releases backend resources.
    pub async fn shutdown(self) -> DocumentStoreResult<()> {
        self.backend.shutdown().await
    }
}

impl<B: StoreBackend + 'static> StoreEndpoint<B> {
    /// Erases the backend type.
    pub fn into_dyn(self) -> DynEndpoint {
        StoreEndpoint::new(Box::new(self.backend))
    }
}

impl<B: StoreBackend> From<B> for StoreEndpoint<B> {
    fn from(backend: B) -> Self {
        Self::new(backend)
    }
}
