//! Storage backend abstraction.
//!
//! [`StoreBackend`] is the capability set the provisioning and document layers need from a
//! store client: existence reads and creates for databases and collections, point
//! operations on documents, and paged queries. Everything about transport, authentication,
//! retries, and connection pooling lives behind it.
//!
//! # Traits
//!
//! - [`StoreBackend`]: the statically dispatched backend interface
//! - [`DynStoreBackend`]: object-safe mirror, implemented for every `StoreBackend`
//! - [`StoreBackendBuilder`]: factory for connecting a backend
//!
//! # Existence reads
//!
//! `read_*` methods return `Ok(Lookup::Absent)` when the store answers that the resource
//! does not exist. An `Err` always means the store could not answer, or refused to.
//!
//! # Example
//!
//! ```ignore
//! use docflow::backend::StoreBackend;
//! use docflow::lookup::Lookup;
//!
//! if let Lookup::Absent = backend.read_database("FamilyDB").await? {
//!     backend.create_database("FamilyDB").await?;
//! }
//! ```

use async_trait::async_trait;
use bson::Bson;
use std::fmt::Debug;

use crate::{
    error::DocumentStoreResult,
    lookup::Lookup,
    page::{ContinuationToken, Page},
    query::Query,
    resource::{CollectionResource, CollectionSpec, Database},
};

/// Abstract interface for document store clients.
///
/// Implementations must be thread-safe. Documents cross this boundary as BSON documents
/// that carry their id under [`ID_FIELD`](crate::document::ID_FIELD).
///
/// # Errors
///
/// Implementations map their native failures onto
/// [`DocumentStoreError`](crate::error::DocumentStoreError) so that the error class
/// survives: a missing resource on a write is `NotFound`, a duplicate id is `Conflict`,
/// malformed names or settings are `Validation`, and connectivity, credential, or
/// throttling failures are `Transport`, `Unauthorized`, or `Throttled`.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Reads a database by name.
    async fn read_database(&self, name: &str) -> DocumentStoreResult<Lookup<Database>>;

    /// Creates a database.
    ///
    /// Fails with `Conflict` if a database of that name already exists.
    async fn create_database(&self, name: &str) -> DocumentStoreResult<Database>;

    /// Deletes a database and every collection and document in it.
    ///
    /// Fails with `NotFound` if the database does not exist.
    async fn delete_database(&self, name: &str) -> DocumentStoreResult<()>;

    /// Lists the names of all databases.
    async fn list_databases(&self) -> DocumentStoreResult<Vec<String>>;

    /// Reads a collection of an existing database.
    ///
    /// Returns `Absent` if the collection does not exist. Fails with `NotFound` if the
    /// database itself does not exist.
    async fn read_collection(
        &self,
        database: &str,
        collection: &str,
    ) -> DocumentStoreResult<Lookup<CollectionResource>>;

    /// Creates a collection with the given indexing policy and throughput.
    ///
    /// Fails with `NotFound` if the database does not exist, `Conflict` if the collection
    /// does, and `Validation` if `spec` is rejected.
    async fn create_collection(
        &self,
        database: &str,
        collection: &str,
        spec: &CollectionSpec,
    ) -> DocumentStoreResult<CollectionResource>;

    /// Lists the names of the collections in a database.
    async fn list_collections(&self, database: &str) -> DocumentStoreResult<Vec<String>>;

    /// Reads one document by id.
    ///
    /// Fails with `NotFound` if the collection does not exist.
    async fn read_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
    ) -> DocumentStoreResult<Lookup<Bson>>;

    /// Stores a new document and returns it as stored.
    ///
    /// Never overwrites: fails with `Conflict` if the id is taken.
    async fn create_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        document: Bson,
    ) -> DocumentStoreResult<Bson>;

    /// Overwrites the document with the given id and returns it as stored.
    ///
    /// No concurrency check is made; the last write wins. Fails with `NotFound` if no
    /// document has that id.
    async fn replace_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        document: Bson,
    ) -> DocumentStoreResult<Bson>;

    /// Removes the document with the given id.
    ///
    /// Fails with `NotFound` if no document has that id.
    async fn delete_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
    ) -> DocumentStoreResult<()>;

    /// Runs one round trip of a query.
    ///
    /// Returns at most `page_size` matches starting at `continuation` (or at the beginning),
    /// and a continuation for the next round trip when more matches remain. An empty page
    /// without continuation is a normal end of results.
    async fn query_page(
        &self,
        database: &str,
        collection: &str,
        query: &Query,
        continuation: Option<&ContinuationToken>,
        page_size: usize,
    ) -> DocumentStoreResult<Page<Bson>>;

    /// Releases connections and other resources held by the backend.
    async fn shutdown(self) -> DocumentStoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend,
{
    async fn read_database(&self, name: &str) -> DocumentStoreResult<Lookup<Database>> {
        (*self).read_database(name).await
    }

    async fn create_database(&self, name: &str) -> DocumentStoreResult<Database> {
        (*self).create_database(name).await
    }

    async fn delete_database(&self, name: &str) -> DocumentStoreResult<()> {
        (*self).delete_database(name).await
    }

    async fn list_databases(&self) -> DocumentStoreResult<Vec<String>> {
        (*self).list_databases().await
    }

    async fn read_collection(
        &self,
        database: &str,
        collection: &str,
    ) -> DocumentStoreResult<Lookup<CollectionResource>> {
        (*self)
            .read_collection(database, collection)
            .await
    }

    async fn create_collection(
        &self,
        database: &str,
        collection: &str,
        spec: &CollectionSpec,
    ) -> DocumentStoreResult<CollectionResource> {
        (*self)
            .create_collection(database, collection, spec)
            .await
    }

    async fn list_collections(&self, database: &str) -> DocumentStoreResult<Vec<String>> {
        (*self).list_collections(database).await
    }

    async fn read_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
    ) -> DocumentStoreResult<Lookup<Bson>> {
        (*self)
            .read_document(database, collection, id)
            .await
    }

    async fn create_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        document: Bson,
    ) -> DocumentStoreResult<Bson> {
        (*self)
            .create_document(database, collection, id, document)
            .await
    }

    async fn replace_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        document: Bson,
    ) -> DocumentStoreResult<Bson> {
        (*self)
            .replace_document(database, collection, id, document)
            .await
    }

    async fn delete_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
    ) -> DocumentStoreResult<()> {
        (*self)
            .delete_document(database, collection, id)
            .await
    }

    async fn query_page(
        &self,
        database: &str,
        collection: &str,
        query: &Query,
        continuation: Option<&ContinuationToken>,
        page_size: usize,
    ) -> DocumentStoreResult<Page<Bson>> {
        (*self)
            .query_page(database, collection, query, continuation, page_size)
            .await
    }
}

/// Object-safe form of [`StoreBackend`], for picking a backend at runtime.
#[async_trait]
pub trait DynStoreBackend: Send + Sync + Debug {
    async fn read_database(&self, name: &str) -> DocumentStoreResult<Lookup<Database>>;
    async fn create_database(&self, name: &str) -> DocumentStoreResult<Database>;
    async fn delete_database(&self, name: &str) -> DocumentStoreResult<()>;
    async fn list_databases(&self) -> DocumentStoreResult<Vec<String>>;
    async fn read_collection(
        &self,
        database: &str,
        collection: &str,
    ) -> DocumentStoreResult<Lookup<CollectionResource>>;
    async fn create_collection(
        &self,
        database: &str,
        collection: &str,
        spec: &CollectionSpec,
    ) -> DocumentStoreResult<CollectionResource>;
    async fn list_collections(&self, database: &str) -> DocumentStoreResult<Vec<String>>;
    async fn read_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
    ) -> DocumentStoreResult<Lookup<Bson>>;
    async fn create_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        document: Bson,
    ) -> DocumentStoreResult<Bson>;
    async fn replace_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        document: Bson,
    ) -> DocumentStoreResult<Bson>;
    async fn delete_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
    ) -> DocumentStoreResult<()>;
    async fn query_page(
        &self,
        database: &str,
        collection: &str,
        query: &Query,
        continuation: Option<&ContinuationToken>,
        page_size: usize,
    ) -> DocumentStoreResult<Page<Bson>>;
    async fn shutdown_boxed(self: Box<Self>) -> DocumentStoreResult<()>;
}

#[async_trait]
impl<B: StoreBackend + 'static> DynStoreBackend for B {
    async fn read_database(&self, name: &str) -> DocumentStoreResult<Lookup<Database>> {
        StoreBackend::read_database(self, name).await
    }

    async fn create_database(&self, name: &str) -> DocumentStoreResult<Database> {
        StoreBackend::create_database(self, name).await
    }

    async fn delete_database(&self, name: &str) -> DocumentStoreResult<()> {
        StoreBackend::delete_database(self, name).await
    }

    async fn list_databases(&self) -> DocumentStoreResult<Vec<String>> {
        StoreBackend::list_databases(self).await
    }

    async fn read_collection(
        &self,
        database: &str,
        collection: &str,
    ) -> DocumentStoreResult<Lookup<CollectionResource>> {
        StoreBackend::read_collection(self, database, collection).await
    }

    async fn create_collection(
        &self,
        database: &str,
        collection: &str,
        spec: &CollectionSpec,
    ) -> DocumentStoreResult<CollectionResource> {
        StoreBackend::create_collection(self, database, collection, spec).await
    }

    async fn list_collections(&self, database: &str) -> DocumentStoreResult<Vec<String>> {
        StoreBackend::list_collections(self, database).await
    }

    async fn read_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
    ) -> DocumentStoreResult<Lookup<Bson>> {
        StoreBackend::read_document(self, database, collection, id).await
    }

    async fn create_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        document: Bson,
    ) -> DocumentStoreResult<Bson> {
        StoreBackend::create_document(self, database, collection, id, document).await
    }

    async fn replace_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        document: Bson,
    ) -> DocumentStoreResult<Bson> {
        StoreBackend::replace_document(self, database, collection, id, document).await
    }

    async fn delete_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
    ) -> DocumentStoreResult<()> {
        StoreBackend::delete_document(self, database, collection, id).await
    }

    async fn query_page(
        &self,
        database: &str,
        collection: &str,
        query: &Query,
        continuation: Option<&ContinuationToken>,
        page_size: usize,
    ) -> DocumentStoreResult<Page<Bson>> {
        StoreBackend::query_page(self, database, collection, query, continuation, page_size).await
    }

    async fn shutdown_boxed(self: Box<Self>) -> DocumentStoreResult<()> {
        StoreBackend::shutdown(*self).await
    }
}

/// A boxed backend is itself a backend, so runtime-selected stores flow through the same
/// generic code as concrete ones.
#[async_trait]
impl StoreBackend for Box<dyn DynStoreBackend> {
    async fn read_database(&self, name: &str) -> DocumentStoreResult<Lookup<Database>> {
        DynStoreBackend::read_database(&**self, name).await
    }

    async fn create_database(&self, name: &str) -> DocumentStoreResult<Database> {
        DynStoreBackend::create_database(&**self, name).await
    }

    async fn delete_database(&self, name: &str) -> DocumentStoreResult<()> {
        DynStoreBackend::delete_database(&**self, name).await
    }

    async fn list_databases(&self) -> DocumentStoreResult<Vec<String>> {
        DynStoreBackend::list_databases(&**self).await
    }

    async fn read_collection(
        &self,
        database: &str,
        collection: &str,
    ) -> DocumentStoreResult<Lookup<CollectionResource>> {
        DynStoreBackend::read_collection(&**self, database, collection).await
    }

    async fn create_collection(
        &self,
        database: &str,
        collection: &str,
        spec: &CollectionSpec,
    ) -> DocumentStoreResult<CollectionResource> {
        DynStoreBackend::create_collection(&**self, database, collection, spec).await
    }

    async fn list_collections(&self, database: &str) -> DocumentStoreResult<Vec<String>> {
        DynStoreBackend::list_collections(&**self, database).await
    }

    async fn read_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
    ) -> DocumentStoreResult<Lookup<Bson>> {
        DynStoreBackend::read_document(&**self, database, collection, id).await
    }

    async fn create_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        document: Bson,
    ) -> DocumentStoreResult<Bson> {
        DynStoreBackend::create_document(&**self, database, collection, id, document).await
    }

    async fn replace_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        document: Bson,
    ) -> DocumentStoreResult<Bson> {
        DynStoreBackend::replace_document(&**self, database, collection, id, document).await
    }

    async fn delete_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
    ) -> DocumentStoreResult<()> {
        DynStoreBackend::delete_document(&**self, database, collection, id).await
    }

    async fn query_page(
        &self,
        database: &str,
        collection: &str,
        query: &Query,
        continuation: Option<&ContinuationToken>,
        page_size: usize,
    ) -> DocumentStoreResult<Page<Bson>> {
        DynStoreBackend::query_page(&**self, database, collection, query, continuation, page_size)
            .await
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        <dyn DynStoreBackend as DynStoreBackend>::shutdown_boxed(self).await
    }
}

/// Connects a backend.
#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}
