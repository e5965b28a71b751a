//! Minimal backend for unit tests of the layers above [`StoreBackend`].
//!
//! Filters are ignored; every query returns the whole collection ordered by id.

use async_trait::async_trait;
use bson::Bson;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use crate::{
    backend::StoreBackend,
    document::Document,
    error::{DocumentStoreError, DocumentStoreResult, ResourceKind},
    lookup::Lookup,
    page::{ContinuationToken, Page},
    query::Query,
    resource::{CollectionResource, CollectionSpec, Database, ResourceMeta},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Note {
    pub id: String,
    pub body: String,
}

impl Document for Note {
    fn id(&self) -> &str {
        &self.id
    }
}

type Docs = BTreeMap<String, Bson>;

#[derive(Debug, Default)]
pub(crate) struct FakeBackend {
    databases: Mutex<BTreeMap<String, BTreeMap<String, Docs>>>,
    fail_creates: Mutex<Option<fn() -> DocumentStoreError>>,
    fail_reads: Mutex<Option<fn() -> DocumentStoreError>>,
    page_fetches: AtomicUsize,
    creates: AtomicUsize,
}

impl FakeBackend {
    /// A backend holding one empty database.
    pub fn with_database(database: &str) -> Self {
        let backend = Self::default();
        backend
            .databases
            .lock()
            .unwrap()
            .insert(database.into(), BTreeMap::new());
        backend
    }

    pub fn with_collection(database: &str, collection: &str) -> Self {
        let backend = Self::default();
        backend
            .databases
            .lock()
            .unwrap()
            .entry(database.into())
            .or_default()
            .insert(collection.into(), Docs::new());
        backend
    }

    /// Every subsequent create of any resource fails with `err()`.
    pub fn fail_creates_with(&self, err: fn() -> DocumentStoreError) {
        *self.fail_creates.lock().unwrap() = Some(err);
    }

    /// Every subsequent existence read fails with `err()`.
    pub fn fail_reads_with(&self, err: fn() -> DocumentStoreError) {
        *self.fail_reads.lock().unwrap() = Some(err);
    }

    pub fn page_fetches(&self) -> usize {
        self.page_fetches.load(Ordering::SeqCst)
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    fn check_read(&self) -> DocumentStoreResult<()> {
        match *self.fail_reads.lock().unwrap() {
            Some(err) => Err(err()),
            None => Ok(()),
        }
    }

    fn check_create(&self) -> DocumentStoreResult<()> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        match *self.fail_creates.lock().unwrap() {
            Some(err) => Err(err()),
            None => Ok(()),
        }
    }

    fn with_docs<T>(
        &self,
        database: &str,
        collection: &str,
        f: impl FnOnce(&mut Docs) -> DocumentStoreResult<T>,
    ) -> DocumentStoreResult<T> {
        let mut databases = self.databases.lock().unwrap();
        let docs = databases
            .get_mut(database)
            .ok_or_else(|| DocumentStoreError::not_found(ResourceKind::Database, database))?
            .get_mut(collection)
            .ok_or_else(|| DocumentStoreError::not_found(ResourceKind::Collection, collection))?;
        f(docs)
    }
}

fn database(name: &str) -> Database {
    Database { id: name.into(), meta: ResourceMeta::assign() }
}

fn collection_resource(database: &str, name: &str, spec: &CollectionSpec) -> CollectionResource {
    CollectionResource {
        id: name.into(),
        database: database.into(),
        indexing_policy: spec.indexing_policy.clone(),
        throughput: spec.throughput,
        meta: ResourceMeta::assign(),
    }
}

#[async_trait]
impl StoreBackend for FakeBackend {
    async fn read_database(&self, name: &str) -> DocumentStoreResult<Lookup<Database>> {
        self.check_read()?;
        Ok(self
            .databases
            .lock()
            .unwrap()
            .contains_key(name)
            .then(|| database(name))
            .into())
    }

    async fn create_database(&self, name: &str) -> DocumentStoreResult<Database> {
        self.check_create()?;
        let mut databases = self.databases.lock().unwrap();
        if databases.contains_key(name) {
            return Err(DocumentStoreError::conflict(ResourceKind::Database, name));
        }
        databases.insert(name.into(), BTreeMap::new());
        Ok(database(name))
    }

    async fn delete_database(&self, name: &str) -> DocumentStoreResult<()> {
        self.databases
            .lock()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| DocumentStoreError::not_found(ResourceKind::Database, name))
    }

    async fn list_databases(&self) -> DocumentStoreResult<Vec<String>> {
        Ok(self.databases.lock().unwrap().keys().cloned().collect())
    }

    async fn read_collection(
        &self,
        database: &str,
        collection: &str,
    ) -> DocumentStoreResult<Lookup<CollectionResource>> {
        self.check_read()?;
        let databases = self.databases.lock().unwrap();
        let collections = databases
            .get(database)
            .ok_or_else(|| DocumentStoreError::not_found(ResourceKind::Database, database))?;
        Ok(collections
            .contains_key(collection)
            .then(|| collection_resource(database, collection, &CollectionSpec::default()))
            .into())
    }

    async fn create_collection(
        &self,
        database: &str,
        collection: &str,
        spec: &CollectionSpec,
    ) -> DocumentStoreResult<CollectionResource> {
        self.check_create()?;
        spec.validate()?;
        let mut databases = self.databases.lock().unwrap();
        let collections = databases
            .get_mut(database)
            .ok_or_else(|| DocumentStoreError::not_found(ResourceKind::Database, database))?;
        if collections.contains_key(collection) {
            return Err(DocumentStoreError::conflict(ResourceKind::Collection, collection));
        }
        collections.insert(collection.into(), Docs::new());
        Ok(collection_resource(database, collection, spec))
    }

    async fn list_collections(&self, database: &str) -> DocumentStoreResult<Vec<String>> {
        let databases = self.databases.lock().unwrap();
        Ok(databases
            .get(database)
            .ok_or_else(|| DocumentStoreError::not_found(ResourceKind::Database, database))?
            .keys()
            .cloned()
            .collect())
    }

    async fn read_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
    ) -> DocumentStoreResult<Lookup<Bson>> {
        self.check_read()?;
        self.with_docs(database, collection, |docs| Ok(docs.get(id).cloned().into()))
    }

    async fn create_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        document: Bson,
    ) -> DocumentStoreResult<Bson> {
        self.check_create()?;
        self.with_docs(database, collection, |docs| {
            if docs.contains_key(id) {
                return Err(DocumentStoreError::conflict(ResourceKind::Document, id));
            }
            docs.insert(id.into(), document.clone());
            Ok(document)
        })
    }

    async fn replace_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        document: Bson,
    ) -> DocumentStoreResult<Bson> {
        self.with_docs(database, collection, |docs| match docs.get_mut(id) {
            Some(slot) => {
                *slot = document.clone();
                Ok(document)
            }
            None => Err(DocumentStoreError::not_found(ResourceKind::Document, id)),
        })
    }

    async fn delete_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
    ) -> DocumentStoreResult<()> {
        self.with_docs(database, collection, |docs| {
            docs.remove(id)
                .map(|_| ())
                .ok_or_else(|| DocumentStoreError::not_found(ResourceKind::Document, id))
        })
    }

    async fn query_page(
        &self,
        database: &str,
        collection: &str,
        _query: &Query,
        continuation: Option<&ContinuationToken>,
        page_size: usize,
    ) -> DocumentStoreResult<Page<Bson>> {
        self.page_fetches.fetch_add(1, Ordering::SeqCst);
        let all = self.with_docs(database, collection, |docs| Ok(docs.values().cloned().collect()))?;
        Page::slice(all, continuation, page_size)
    }
}
