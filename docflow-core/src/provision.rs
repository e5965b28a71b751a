//! Idempotent provisioning of databases and collections.
//!
//! Each `ensure_*` call reads the resource by name and creates it only when the read comes
//! back [`Lookup::Absent`]. Running it again with the same name yields `Found` and never a
//! duplicate. Errors from either round trip are returned as they are, without retries.

use tracing::info;

use crate::{
    backend::StoreBackend,
    error::DocumentStoreResult,
    lookup::{Lookup, Provisioned},
    resource::{CollectionResource, CollectionSpec, Database},
};

/// Ensures databases and collections exist.
#[derive(Debug)]
pub struct ResourceProvisioner<'a, B: StoreBackend> {
    backend: &'a B,
}

impl<'a, B: StoreBackend> ResourceProvisioner<'a, B> {
    pub(crate) fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Makes sure a database named `name` exists.
    pub async fn ensure_database(&self, name: &str) -> DocumentStoreResult<Provisioned<Database>> {
        if let Lookup::Found(database) = self.backend.read_database(name).await? {
            info!(database = name, "database found");
            return Ok(Provisioned::Found(database));
        }

        let database = self.backend.create_database(name).await?;
        info!(database = name, rid = %database.meta.rid, "database created");

        Ok(Provisioned::Created(database))
    }

    /// Makes sure `collection` exists inside `database`, creating it with `spec` if absent.
    ///
    /// An existing collection is reported as found even if it was created with different
    /// settings; they are never altered.
    ///
    /// # Errors
    ///
    /// `NotFound` for the database if it has not been provisioned. The database is never
    /// created implicitly.
    pub async fn ensure_collection(
        &self,
        database: &str,
        collection: &str,
        spec: &CollectionSpec,
    ) -> DocumentStoreResult<Provisioned<CollectionResource>> {
        if let Lookup::Found(resource) = self
            .backend
            .read_collection(database, collection)
            .await?
        {
            info!(database, collection, "collection found");
            return Ok(Provisioned::Found(resource));
        }

        let resource = self
            .backend
            .create_collection(database, collection, spec)
            .await?;
        info!(
            database,
            collection,
            throughput = resource.throughput.0,
            "collection created"
        );

        Ok(Provisioned::Created(resource))
    }

    /// Deletes a database with all of its collections and documents.
    pub async fn delete_database(&self, name: &str) -> DocumentStoreResult<()> {
        self.backend.delete_database(name).await?;
        info!(database = name, "database deleted");
        Ok(())
    }

    pub async fn list_databases(&self) -> DocumentStoreResult<Vec<String>> {
        self.backend.list_databases().await
    }

    pub async fn list_collections(&self, database: &str) -> DocumentStoreResult<Vec<String>> {
        self.backend.list_collections(database).await
    }
}
