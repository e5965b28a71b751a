#![allow(dead_code)]

use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, Once,
        atomic::{AtomicBool, Ordering},
    },
};

use docflow::{
    backend::StoreBackend,
    bson::Bson,
    endpoint::StoreEndpoint,
    error::{DocumentStoreError, DocumentStoreResult},
    family::Family,
    lookup::Lookup,
    memory::InMemoryStore,
    page::{ContinuationToken, Page},
    query::Query,
    resource::{CollectionResource, CollectionSpec, Database},
};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

pub const DATABASE: &str = "FamilyDB";
pub const COLLECTION: &str = "FamilyCollection";

/// Backend calls that can be counted and made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    ReadDatabase,
    CreateDatabase,
    ReadCollection,
    CreateCollection,
    ReadDocument,
    CreateDocument,
    ReplaceDocument,
    DeleteDocument,
    QueryPage,
}

/// Wraps a backend, counting calls and injecting failures per operation.
#[derive(Debug)]
pub struct InstrumentedBackend<B> {
    inner: B,
    faults: Mutex<HashMap<Op, fn() -> DocumentStoreError>>,
    calls: Mutex<HashMap<Op, usize>>,
    shut_down: Arc<AtomicBool>,
}

impl<B: StoreBackend> InstrumentedBackend<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            faults: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            shut_down: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag set once the backend has been shut down; outlives the backend.
    pub fn shut_down_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shut_down)
    }

    /// Every later call of `op` fails with `err()` until healed.
    pub fn fail(&self, op: Op, err: fn() -> DocumentStoreError) {
        self.faults.lock().unwrap().insert(op, err);
    }

    pub fn heal(&self, op: Op) {
        self.faults.lock().unwrap().remove(&op);
    }

    pub fn calls(&self, op: Op) -> usize {
        self.calls.lock().unwrap().get(&op).copied().unwrap_or(0)
    }

    fn enter(&self, op: Op) -> DocumentStoreResult<()> {
        *self.calls.lock().unwrap().entry(op).or_default() += 1;
        match self.faults.lock().unwrap().get(&op) {
            Some(err) => Err(err()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<B: StoreBackend> StoreBackend for InstrumentedBackend<B> {
    async fn read_database(&self, name: &str) -> DocumentStoreResult<Lookup<Database>> {
        self.enter(Op::ReadDatabase)?;
        self.inner.read_database(name).await
    }

    async fn create_database(&self, name: &str) -> DocumentStoreResult<Database> {
        self.enter(Op::CreateDatabase)?;
        self.inner.create_database(name).await
    }

    async fn delete_database(&self, name: &str) -> DocumentStoreResult<()> {
        self.inner.delete_database(name).await
    }

    async fn list_databases(&self) -> DocumentStoreResult<Vec<String>> {
        self.inner.list_databases().await
    }

    async fn read_collection(
        &self,
        database: &str,
        collection: &str,
    ) -> DocumentStoreResult<Lookup<CollectionResource>> {
        self.enter(Op::ReadCollection)?;
        self.inner.read_collection(database, collection).await
    }

    async fn create_collection(
        &self,
        database: &str,
        collection: &str,
        spec: &CollectionSpec,
    ) -> DocumentStoreResult<CollectionResource> {
        self.enter(Op::CreateCollection)?;
        self.inner.create_collection(database, collection, spec).await
    }

    async fn list_collections(&self, database: &str) -> DocumentStoreResult<Vec<String>> {
        self.inner.list_collections(database).await
    }

    async fn read_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
    ) -> DocumentStoreResult<Lookup<Bson>> {
        self.enter(Op::ReadDocument)?;
        self.inner.read_document(database, collection, id).await
    }

    async fn create_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        document: Bson,
    ) -> DocumentStoreResult<Bson> {
        self.enter(Op::CreateDocument)?;
        self.inner
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
        self.enter(Op::ReplaceDocument)?;
        self.inner
            .replace_document(database, collection, id, document)
            .await
    }

    async fn delete_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
    ) -> DocumentStoreResult<()> {
        self.enter(Op::DeleteDocument)?;
        self.inner.delete_document(database, collection, id).await
    }

    async fn query_page(
        &self,
        database: &str,
        collection: &str,
        query: &Query,
        continuation: Option<&ContinuationToken>,
        page_size: usize,
    ) -> DocumentStoreResult<Page<Bson>> {
        self.enter(Op::QueryPage)?;
        self.inner
            .query_page(database, collection, query, continuation, page_size)
            .await
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        self.shut_down.store(true, Ordering::SeqCst);
        self.inner.shutdown().await
    }
}

pub type TestEndpoint = StoreEndpoint<InstrumentedBackend<InMemoryStore>>;

pub fn endpoint() -> TestEndpoint {
    init_tracing();
    StoreEndpoint::new(InstrumentedBackend::new(InMemoryStore::new()))
}

/// An endpoint with the family database and collection already in place.
pub async fn provisioned_endpoint() -> TestEndpoint {
    let endpoint = endpoint();
    let provisioner = endpoint.provisioner();
    provisioner.ensure_database(DATABASE).await.unwrap();
    provisioner
        .ensure_collection(DATABASE, COLLECTION, &CollectionSpec::default())
        .await
        .unwrap();
    endpoint
}

/// A copy of the Andersen family under a different id.
pub fn andersen_numbered(n: usize) -> Family {
    let mut family = docflow::family::andersen();
    family.id = format!("Andersen.{n:03}");
    family
}
