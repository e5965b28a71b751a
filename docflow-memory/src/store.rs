//! In-memory storage implementation for document stores.
//!
//! Databases, their collections, and the documents inside them live in nested maps behind
//! one async-aware read-write lock. Documents are kept in id order, which is also the
//! default result order of queries.

use async_trait::async_trait;
use bson::{Bson, Document};
use mea::rwlock::RwLock;
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};
use tracing::debug;

use docflow_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    document::check_id,
    error::{DocumentStoreError, DocumentStoreResult, ResourceKind},
    lookup::Lookup,
    page::{ContinuationToken, Page},
    query::Query,
    resource::{CollectionResource, CollectionSpec, Database, ResourceMeta, validate_name},
};

use crate::evaluator::{DocumentEvaluator, compare};

#[derive(Debug)]
struct CollectionEntry {
    resource: CollectionResource,
    documents: BTreeMap<String, Document>,
}

#[derive(Debug)]
struct DatabaseEntry {
    database: Database,
    collections: HashMap<String, CollectionEntry>,
}

type StoreMap = HashMap<String, DatabaseEntry>;

fn database_entry<'a>(store: &'a StoreMap, name: &str) -> DocumentStoreResult<&'a DatabaseEntry> {
    store
        .get(name)
        .ok_or_else(|| DocumentStoreError::not_found(ResourceKind::Database, name))
}

fn collection_entry<'a>(
    store: &'a StoreMap,
    database: &str,
    collection: &str,
) -> DocumentStoreResult<&'a CollectionEntry> {
    database_entry(store, database)?
        .collections
        .get(collection)
        .ok_or_else(|| {
            DocumentStoreError::not_found(ResourceKind::Collection, format!("{database}/{collection}"))
        })
}

fn collection_entry_mut<'a>(
    store: &'a mut StoreMap,
    database: &str,
    collection: &str,
) -> DocumentStoreResult<&'a mut CollectionEntry> {
    store
        .get_mut(database)
        .ok_or_else(|| DocumentStoreError::not_found(ResourceKind::Database, database))?
        .collections
        .get_mut(collection)
        .ok_or_else(|| {
            DocumentStoreError::not_found(ResourceKind::Collection, format!("{database}/{collection}"))
        })
}

fn into_document(id: &str, document: Bson) -> DocumentStoreResult<Document> {
    check_id(&document, id)?;

    match document {
        Bson::Document(document) => Ok(document),
        _ => Err(DocumentStoreError::Validation("document must be a BSON document".into())),
    }
}

/// Thread-safe in-memory document storage backend.
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, so clones share
/// the same data. Queries scan the whole collection.
///
/// # Example
///
/// ```ignore
/// use docflow_memory::InMemoryStore;
/// use docflow::backend::StoreBackend;
///
/// let store = InMemoryStore::new();
/// store.create_database("FamilyDB").await?;
/// assert_eq!(store.list_databases().await?, vec!["FamilyDB"]);
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn read_database(&self, name: &str) -> DocumentStoreResult<Lookup<Database>> {
        validate_name(ResourceKind::Database, name)?;

        Ok(self
            .store
            .read()
            .await
            .get(name)
            .map(|entry| entry.database.clone())
            .into())
    }

    async fn create_database(&self, name: &str) -> DocumentStoreResult<Database> {
        validate_name(ResourceKind::Database, name)?;

        let mut store = self.store.write().await;
        if store.contains_key(name) {
            return Err(DocumentStoreError::conflict(ResourceKind::Database, name));
        }

        let database = Database {
            id: name.to_string(),
            meta: ResourceMeta::assign(),
        };
        store.insert(
            name.to_string(),
            DatabaseEntry {
                database: database.clone(),
                collections: HashMap::new(),
            },
        );

        Ok(database)
    }

    async fn delete_database(&self, name: &str) -> DocumentStoreResult<()> {
        match self.store.write().await.remove(name) {
            Some(_) => Ok(()),
            None => Err(DocumentStoreError::not_found(ResourceKind::Database, name)),
        }
    }

    async fn list_databases(&self) -> DocumentStoreResult<Vec<String>> {
        let mut names: Vec<String> = self.store.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn read_collection(
        &self,
        database: &str,
        collection: &str,
    ) -> DocumentStoreResult<Lookup<CollectionResource>> {
        validate_name(ResourceKind::Collection, collection)?;

        let store = self.store.read().await;
        Ok(database_entry(&store, database)?
            .collections
            .get(collection)
            .map(|entry| entry.resource.clone())
            .into())
    }

    async fn create_collection(
        &self,
        database: &str,
        collection: &str,
        spec: &CollectionSpec,
    ) -> DocumentStoreResult<CollectionResource> {
        validate_name(ResourceKind::Collection, collection)?;
        spec.validate()?;

        let mut store = self.store.write().await;
        let entry = store
            .get_mut(database)
            .ok_or_else(|| DocumentStoreError::not_found(ResourceKind::Database, database))?;

        if entry.collections.contains_key(collection) {
            return Err(DocumentStoreError::conflict(
                ResourceKind::Collection,
                format!("{database}/{collection}"),
            ));
        }

        let resource = CollectionResource {
            id: collection.to_string(),
            database: database.to_string(),
            indexing_policy: spec.indexing_policy.clone(),
            throughput: spec.throughput,
            meta: ResourceMeta::assign(),
        };
        entry.collections.insert(
            collection.to_string(),
            CollectionEntry {
                resource: resource.clone(),
                documents: BTreeMap::new(),
            },
        );

        Ok(resource)
    }

    async fn list_collections(&self, database: &str) -> DocumentStoreResult<Vec<String>> {
        let store = self.store.read().await;
        let mut names: Vec<String> = database_entry(&store, database)?
            .collections
            .keys()
            .cloned()
            .collect();
        names.sort();
        Ok(names)
    }

    async fn read_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
    ) -> DocumentStoreResult<Lookup<Bson>> {
        let store = self.store.read().await;
        Ok(collection_entry(&store, database, collection)?
            .documents
            .get(id)
            .map(|doc| Bson::Document(doc.clone()))
            .into())
    }

    async fn create_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        document: Bson,
    ) -> DocumentStoreResult<Bson> {
        validate_name(ResourceKind::Document, id)?;
        let document = into_document(id, document)?;

        let mut store = self.store.write().await;
        let entry = collection_entry_mut(&mut store, database, collection)?;

        if entry.documents.contains_key(id) {
            return Err(DocumentStoreError::conflict(ResourceKind::Document, id));
        }
        entry.documents.insert(id.to_string(), document.clone());

        Ok(Bson::Document(document))
    }

    async fn replace_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        document: Bson,
    ) -> DocumentStoreResult<Bson> {
        let document = into_document(id, document)?;

        let mut store = self.store.write().await;
        let entry = collection_entry_mut(&mut store, database, collection)?;

        match entry.documents.get_mut(id) {
            Some(slot) => {
                *slot = document.clone();
                Ok(Bson::Document(document))
            }
            None => Err(DocumentStoreError::not_found(ResourceKind::Document, id)),
        }
    }

    async fn delete_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
    ) -> DocumentStoreResult<()> {
        let mut store = self.store.write().await;
        let entry = collection_entry_mut(&mut store, database, collection)?;

        match entry.documents.remove(id) {
            Some(_) => Ok(()),
            None => Err(DocumentStoreError::not_found(ResourceKind::Document, id)),
        }
    }

    async fn query_page(
        &self,
        database: &str,
        collection: &str,
        query: &Query,
        continuation: Option<&ContinuationToken>,
        page_size: usize,
    ) -> DocumentStoreResult<Page<Bson>> {
        let store = self.store.read().await;
        let entry = collection_entry(&store, database, collection)?;

        let mut matches: Vec<&Document> = match &query.filter {
            Some(filter) => entry
                .documents
                .values()
                .filter(|doc| DocumentEvaluator::matches(doc, filter))
                .collect(),
            None => entry.documents.values().collect(),
        };

        if query.sort.is_some() {
            matches.sort_by(|a, b| compare(a, b, query.sort.as_ref()));
        }

        debug!(database, collection, matches = matches.len(), "evaluated query");

        Page::slice(
            matches
                .into_iter()
                .map(|doc| Bson::Document(doc.clone()))
                .collect(),
            continuation,
            page_size,
        )
    }
}

/// Builder for constructing [`InMemoryStore`] instances.
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}
