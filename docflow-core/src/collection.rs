//! Document repositories bound to one collection.
//!
//! A repository addresses documents by id inside a fixed `(database, collection)` pair.
//! [`Collection`] works on raw BSON documents, [`TypedCollection`] on any [`Document`]
//! type. Both provide the same four point operations and paged queries:
//!
//! - `create_if_absent`: point read, then create only if the id is free
//! - `read`: point read returning [`Lookup`]
//! - `replace`: unconditional overwrite of an existing document
//! - `delete`: removal by id
//!
//! The collection must already exist (see
//! [`ResourceProvisioner`](crate::provision::ResourceProvisioner)); otherwise every call
//! fails with `NotFound` for the collection.
//!
//! # Example
//!
//! ```ignore
//! let families = endpoint.typed_collection::<Family>("FamilyDB", "FamilyCollection");
//!
//! match families.create_if_absent(&andersen).await? {
//!     Provisioned::Found(_) => println!("Found {}", andersen.id),
//!     Provisioned::Created(_) => println!("Created Family {}", andersen.id),
//! }
//! ```

use bson::Bson;
use std::marker::PhantomData;
use tracing::{debug, info};

use crate::{
    backend::StoreBackend,
    cursor::{QueryCursor, TypedQueryCursor},
    document::{Document, DocumentExt, document_id},
    error::{DocumentStoreError, DocumentStoreResult},
    lookup::{Lookup, Provisioned},
    query::Query,
};

/// Untyped repository over one collection.
#[derive(Debug)]
pub struct Collection<'a, B: StoreBackend> {
    database: String,
    name: String,
    backend: &'a B,
}

impl<'a, B: StoreBackend> Collection<'a, B> {
    pub(crate) fn new(database: String, name: String, backend: &'a B) -> Self {
        Self { database, name, backend }
    }

    /// Name of the database holding this collection.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Views this collection through a document type.
    pub fn typed<D: Document>(&self) -> TypedCollection<'a, B, D> {
        TypedCollection::new(self.database.clone(), self.name.clone(), self.backend)
    }

    /// Stores `document` unless a document with its id already exists.
    ///
    /// Returns `Found` with the stored document, left untouched, or `Created` with the
    /// document as written.
    ///
    /// # Errors
    ///
    /// `Validation` if `document` carries no string id. A `Conflict` from the create, which
    /// means another writer took the id after the read, is returned as is.
    pub async fn create_if_absent(&self, document: Bson) -> DocumentStoreResult<Provisioned<Bson>> {
        let id = document_id(&document)
            .ok_or_else(|| DocumentStoreError::Validation("document has no string id".into()))?
            .to_owned();

        if let Lookup::Found(existing) = self.read(&id).await? {
            debug!(database = %self.database, collection = %self.name, %id, "document found");
            return Ok(Provisioned::Found(existing));
        }

        let created = self
            .backend
            .create_document(&self.database, &self.name, &id, document)
            .await?;

        info!(database = %self.database, collection = %self.name, %id, "document created");
        Ok(Provisioned::Created(created))
    }

    /// Reads the document with the given id.
    pub async fn read(&self, id: &str) -> DocumentStoreResult<Lookup<Bson>> {
        self.backend
            .read_document(&self.database, &self.name, id)
            .await
    }

    /// Overwrites the stored document carrying the same id as `document`.
    ///
    /// Every field except the id is replaced; there is no concurrency check.
    ///
    /// # Errors
    ///
    /// `NotFound` if no document has that id. A missing document is never created.
    pub async fn replace(&self, document: Bson) -> DocumentStoreResult<Bson> {
        let id = document_id(&document)
            .ok_or_else(|| DocumentStoreError::Validation("document has no string id".into()))?
            .to_owned();

        let stored = self
            .backend
            .replace_document(&self.database, &self.name, &id, document)
            .await?;

        info!(database = %self.database, collection = %self.name, %id, "document replaced");
        Ok(stored)
    }

    /// Deletes the document with the given id.
    ///
    /// # Errors
    ///
    /// `NotFound` if no document has that id.
    pub async fn delete(&self, id: &str) -> DocumentStoreResult<()> {
        self.backend
            .delete_document(&self.database, &self.name, id)
            .await?;

        info!(database = %self.database, collection = %self.name, %id, "document deleted");
        Ok(())
    }

    /// Prepares a paged query. Nothing is fetched until the cursor is polled.
    ///
    /// # Errors
    ///
    /// `Validation` if `page_size` is zero.
    pub fn query(&self, query: Query, page_size: usize) -> DocumentStoreResult<QueryCursor<'a, B>> {
        QueryCursor::new(
            self.backend,
            self.database.clone(),
            self.name.clone(),
            query,
            page_size,
        )
    }
}

/// Repository over one collection whose documents deserialize into `D`.
#[derive(Debug)]
pub struct TypedCollection<'a, B: StoreBackend, D: Document> {
    inner: Collection<'a, B>,
    _marker: PhantomData<D>,
}

impl<'a, B: StoreBackend, D: Document> TypedCollection<'a, B, D> {
    pub(crate) fn new(database: String, name: String, backend: &'a B) -> Self {
        Self {
            inner: Collection::new(database, name, backend),
            _marker: PhantomData,
        }
    }

    pub fn database(&self) -> &str {
        self.inner.database()
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Converts this typed collection to a different document type.
    pub fn with_type<T: Document>(&self) -> TypedCollection<'a, B, T> {
        self.inner.typed()
    }

    /// Drops the typing.
    pub fn untyped(&self) -> Collection<'a, B> {
        Collection::new(
            self.inner.database.clone(),
            self.inner.name.clone(),
            self.inner.backend,
        )
    }

    /// Typed form of [`Collection::create_if_absent`].
    pub async fn create_if_absent(&self, document: &D) -> DocumentStoreResult<Provisioned<D>> {
        Ok(match self.inner.create_if_absent(document.to_bson()?).await? {
            Provisioned::Found(stored) => Provisioned::Found(D::from_bson(stored)?),
            Provisioned::Created(stored) => Provisioned::Created(D::from_bson(stored)?),
        })
    }

    pub async fn read(&self, id: &str) -> DocumentStoreResult<Lookup<D>> {
        self.inner
            .read(id)
            .await?
            .try_map(D::from_bson)
    }

    /// Typed form of [`Collection::replace`].
    pub async fn replace(&self, document: &D) -> DocumentStoreResult<D> {
        D::from_bson(self.inner.replace(document.to_bson()?).await?)
    }

    pub async fn delete(&self, id: &str) -> DocumentStoreResult<()> {
        self.inner.delete(id).await
    }

    /// Typed form of [`Collection::query`].
    pub fn query(
        &self,
        query: Query,
        page_size: usize,
    ) -> DocumentStoreResult<TypedQueryCursor<'a, B, D>> {
        Ok(TypedQueryCursor::new(self.inner.query(query, page_size)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ResourceKind,
        query::Filter,
        testing::{FakeBackend, Note},
    };
    use bson::doc;
    use futures::TryStreamExt;

    fn note(id: &str, body: &str) -> Note {
        Note { id: id.into(), body: body.into() }
    }

    #[tokio::test]
    async fn create_if_absent_keeps_the_stored_document() {
        let backend = FakeBackend::with_collection("db", "notes");
        let notes = Collection::new("db".into(), "notes".into(), &backend).typed::<Note>();

        let first = notes.create_if_absent(&note("n1", "first")).await.unwrap();
        assert!(first.is_created());

        let second = notes.create_if_absent(&note("n1", "second")).await.unwrap();
        assert!(!second.is_created());
        assert_eq!(second.resource().body, "first");
        assert_eq!(notes.read("n1").await.unwrap(), Lookup::Found(note("n1", "first")));
    }

    #[tokio::test]
    async fn create_conflict_after_absent_read_is_not_downgraded() {
        let backend = FakeBackend::with_collection("db", "notes");
        backend.fail_creates_with(|| DocumentStoreError::conflict(ResourceKind::Document, "n1"));
        let notes = Collection::new("db".into(), "notes".into(), &backend);

        let err = notes
            .create_if_absent(Bson::Document(doc! { "id": "n1" }))
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentStoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn replace_and_delete_require_an_existing_document() {
        let backend = FakeBackend::with_collection("db", "notes");
        let notes = Collection::new("db".into(), "notes".into(), &backend).typed::<Note>();

        let err = notes.replace(&note("ghost", "x")).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(notes.read("ghost").await.unwrap(), Lookup::Absent);

        notes.create_if_absent(&note("n1", "draft")).await.unwrap();
        let replaced = notes.replace(&note("n1", "final")).await.unwrap();
        assert_eq!(replaced.body, "final");

        notes.delete("n1").await.unwrap();
        assert_eq!(notes.read("n1").await.unwrap(), Lookup::Absent);
        assert!(notes.delete("n1").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn untyped_create_requires_an_id() {
        let backend = FakeBackend::with_collection("db", "notes");
        let notes = Collection::new("db".into(), "notes".into(), &backend);

        let err = notes
            .create_if_absent(Bson::Document(doc! { "body": "anonymous" }))
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentStoreError::Validation(_)));
    }

    #[tokio::test]
    async fn cursor_pages_until_exhausted_then_stops_fetching() {
        let backend = FakeBackend::with_collection("db", "notes");
        let notes = Collection::new("db".into(), "notes".into(), &backend).typed::<Note>();
        for i in 0..5 {
            notes.create_if_absent(&note(&format!("n{i}"), "x")).await.unwrap();
        }

        let mut cursor = notes.query(Query::all(), 2).unwrap();
        assert!(cursor.has_more_results());

        let mut sizes = Vec::new();
        while let Some(page) = cursor.next_page().await.unwrap() {
            sizes.push(page.len());
        }
        assert_eq!(sizes, vec![2, 2, 1]);
        assert!(!cursor.has_more_results());
        assert!(cursor.next_page().await.unwrap().is_none());
        assert_eq!(backend.page_fetches(), 3);
    }

    #[tokio::test]
    async fn empty_result_is_a_single_empty_page() {
        let backend = FakeBackend::with_collection("db", "notes");
        let notes = Collection::new("db".into(), "notes".into(), &backend);

        let mut cursor = notes
            .query(Query::filtered(Filter::eq("body", "nothing")), 10)
            .unwrap();
        let page = cursor.next_page().await.unwrap().unwrap();
        assert!(page.is_empty());
        assert!(cursor.next_page().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn zero_page_size_fails_before_any_fetch() {
        let backend = FakeBackend::with_collection("db", "notes");
        let notes = Collection::new("db".into(), "notes".into(), &backend);

        assert!(matches!(
            notes.query(Query::all(), 0),
            Err(DocumentStoreError::Validation(_))
        ));
        assert_eq!(backend.page_fetches(), 0);
    }

    #[tokio::test]
    async fn stream_yields_every_match_in_id_order() {
        let backend = FakeBackend::with_collection("db", "notes");
        let notes = Collection::new("db".into(), "notes".into(), &backend).typed::<Note>();
        for id in ["c", "a", "b"] {
            notes.create_if_absent(&note(id, id)).await.unwrap();
        }

        let ids: Vec<String> = notes
            .query(Query::all(), 1)
            .unwrap()
            .into_stream()
            .map_ok(|n| n.id)
            .try_collect()
            .await
            .unwrap();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn missing_collection_is_reported_as_not_found() {
        let backend = FakeBackend::with_database("db");
        let notes = Collection::new("db".into(), "notes".into(), &backend);

        let err = notes.read("n1").await.unwrap_err();
        assert!(matches!(
            err,
            DocumentStoreError::NotFound { kind: ResourceKind::Collection, .. }
        ));
    }

    #[tokio::test]
    async fn undecodable_page_keeps_the_cursor_in_place() {
        let backend = FakeBackend::with_collection("db", "notes");
        let notes = Collection::new("db".into(), "notes".into(), &backend);
        notes
            .create_if_absent(Bson::Document(doc! { "id": "n1", "body": 5 }))
            .await
            .unwrap();

        let mut cursor = notes.typed::<Note>().query(Query::all(), 10).unwrap();
        let err = cursor.next_page().await.unwrap_err();
        assert!(matches!(err, DocumentStoreError::Serialization(_)));
        assert!(cursor.has_more_results());

        let page = cursor.into_untyped().next_page().await.unwrap().unwrap();
        assert_eq!(page.items, vec![Bson::Document(doc! { "id": "n1", "body": 5 })]);
        assert_eq!(backend.page_fetches(), 2);
    }
}
