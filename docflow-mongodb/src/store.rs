//! MongoDB implementation of [`StoreBackend`].
//!
//! Each docflow database maps to a MongoDB database and each collection to a MongoDB
//! collection. MongoDB creates databases lazily, so provisioning state is recorded
//! explicitly: every provisioned database holds a `_provisioning` collection with one record
//! for the database itself and one per collection. A database or collection exists for
//! docflow exactly when its record does.
//!
//! Documents are stored with their id as `_id`, which gives uniqueness and id ordering.

use async_trait::async_trait;
use bson::{Bson, Document, de::deserialize_from_bson, doc, ser::serialize_to_bson};
use futures::{StreamExt, TryStreamExt, stream::iter};
use mongodb::{
    Client, Collection as MongoCollection, Database as MongoDatabase,
    options::{ClientOptions, FindOptions},
};
use tracing::debug;

use docflow_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    document::check_id,
    error::{DocumentStoreError, DocumentStoreResult, ResourceKind},
    lookup::Lookup,
    page::{ContinuationToken, Page},
    query::{Query, QueryVisitor},
    resource::{CollectionResource, CollectionSpec, Database, ResourceMeta, validate_name},
};

use crate::{
    error::{driver_error, is_duplicate, write_error},
    query::MongoQueryTranslator,
    sanitizer::ValueSanitizer,
};

const PROVISIONING: &str = "_provisioning";
const DATABASE_RECORD: &str = "database";
const RESOURCE_FIELD: &str = "resource";

fn collection_record(name: &str) -> String {
    format!("collection/{name}")
}

#[derive(Debug)]
pub struct MongoDbStore {
    client: Client,
}

impl MongoDbStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn builder(dsn: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn)
    }

    fn get_database(&self, name: &str) -> MongoDatabase {
        self.client
            .database(&ValueSanitizer::sanitize_string(name))
    }

    fn get_collection(&self, database: &str, collection: &str) -> MongoCollection<Document> {
        self.get_database(database)
            .collection(&ValueSanitizer::sanitize_string(collection))
    }

    fn provisioning(&self, database: &str) -> MongoCollection<Document> {
        self.get_database(database).collection(PROVISIONING)
    }

    async fn read_record<T>(&self, database: &str, record: &str) -> DocumentStoreResult<Lookup<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        self.provisioning(database)
            .find_one(doc! { "_id": record })
            .await
            .map_err(driver_error)?
            .map(|doc| -> DocumentStoreResult<T> {
                let resource = doc
                    .get(RESOURCE_FIELD)
                    .cloned()
                    .ok_or_else(|| {
                        DocumentStoreError::Backend(format!("provisioning record {record} is malformed"))
                    })?;
                Ok(deserialize_from_bson(resource)?)
            })
            .transpose()
            .map(Lookup::from)
    }

    async fn require_database(&self, database: &str) -> DocumentStoreResult<()> {
        match self.read_record::<Database>(database, DATABASE_RECORD).await? {
            Lookup::Found(_) => Ok(()),
            Lookup::Absent => Err(DocumentStoreError::not_found(ResourceKind::Database, database)),
        }
    }

    /// Handle on a provisioned collection; `NotFound` if it was never provisioned.
    async fn require_collection(
        &self,
        database: &str,
        collection: &str,
    ) -> DocumentStoreResult<MongoCollection<Document>> {
        match StoreBackend::read_collection(self, database, collection).await? {
            Lookup::Found(_) => Ok(self.get_collection(database, collection)),
            Lookup::Absent => Err(DocumentStoreError::not_found(
                ResourceKind::Collection,
                format!("{database}/{collection}"),
            )),
        }
    }

    fn prepare_document(id: &str, document: Bson) -> DocumentStoreResult<Document> {
        check_id(&document, id)?;

        let document = document
            .as_document()
            .map(ValueSanitizer::sanitize_keys)
            .ok_or_else(|| DocumentStoreError::Validation("document must be a BSON document".into()))?;

        Ok(Document::from_iter(
            std::iter::once(("_id".to_string(), Bson::String(id.to_string()))).chain(document),
        ))
    }

    fn restore_document(document: &Document) -> Bson {
        Bson::Document(ValueSanitizer::restore_keys(&Document::from_iter(
            document
                .clone()
                .into_iter()
                .filter(|(k, _)| k != "_id"),
        )))
    }
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn read_database(&self, name: &str) -> DocumentStoreResult<Lookup<Database>> {
        validate_name(ResourceKind::Database, name)?;
        self.read_record(name, DATABASE_RECORD).await
    }

    async fn create_database(&self, name: &str) -> DocumentStoreResult<Database> {
        validate_name(ResourceKind::Database, name)?;

        let database = Database {
            id: name.to_string(),
            meta: ResourceMeta::assign(),
        };
        self.provisioning(name)
            .insert_one(doc! {
                "_id": DATABASE_RECORD,
                RESOURCE_FIELD: serialize_to_bson(&database)?,
            })
            .await
            .map_err(write_error(ResourceKind::Database, name))?;

        debug!(database = name, "recorded database");
        Ok(database)
    }

    async fn delete_database(&self, name: &str) -> DocumentStoreResult<()> {
        self.require_database(name).await?;
        self.get_database(name)
            .drop()
            .await
            .map_err(driver_error)
    }

    async fn list_databases(&self) -> DocumentStoreResult<Vec<String>> {
        let names = self
            .client
            .list_database_names()
            .await
            .map_err(driver_error)?;

        let found = iter(names)
            .then(async |name| {
                let name = ValueSanitizer::restore_string(&name);
                self.read_record::<Database>(&name, DATABASE_RECORD)
                    .await
                    .map(|lookup| lookup.is_found().then_some(name))
            })
            .try_collect::<Vec<_>>()
            .await?;

        let mut names: Vec<String> = found.into_iter().flatten().collect();
        names.sort();
        Ok(names)
    }

    async fn read_collection(
        &self,
        database: &str,
        collection: &str,
    ) -> DocumentStoreResult<Lookup<CollectionResource>> {
        validate_name(ResourceKind::Collection, collection)?;
        self.require_database(database).await?;
        self.read_record(database, &collection_record(collection))
            .await
    }

    async fn create_collection(
        &self,
        database: &str,
        collection: &str,
        spec: &CollectionSpec,
    ) -> DocumentStoreResult<CollectionResource> {
        validate_name(ResourceKind::Collection, collection)?;
        spec.validate()?;
        self.require_database(database).await?;

        let resource = CollectionResource {
            id: collection.to_string(),
            database: database.to_string(),
            indexing_policy: spec.indexing_policy.clone(),
            throughput: spec.throughput,
            meta: ResourceMeta::assign(),
        };
        let record = collection_record(collection);
        let qualified = format!("{database}/{collection}");

        self.provisioning(database)
            .insert_one(doc! {
                "_id": &record,
                RESOURCE_FIELD: serialize_to_bson(&resource)?,
            })
            .await
            .map_err(write_error(ResourceKind::Collection, &qualified))?;

        let created = self
            .get_database(database)
            .create_collection(&ValueSanitizer::sanitize_string(collection))
            .await;

        if let Err(err) = created {
            // An existing MongoDB collection without a record is adopted as is.
            if !is_duplicate(&err) {
                self.provisioning(database)
                    .delete_one(doc! { "_id": &record })
                    .await
                    .map_err(driver_error)?;
                return Err(driver_error(err));
            }
        }

        debug!(database, collection, "recorded collection");
        Ok(resource)
    }

    async fn list_collections(&self, database: &str) -> DocumentStoreResult<Vec<String>> {
        self.require_database(database).await?;

        let records = self
            .provisioning(database)
            .find(doc! { "_id": { "$regex": "^collection/" } })
            .sort(doc! { "_id": 1 })
            .await
            .map_err(driver_error)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(driver_error)?;

        Ok(records
            .iter()
            .filter_map(|record| record.get_str("_id").ok())
            .filter_map(|id| id.strip_prefix("collection/"))
            .map(str::to_string)
            .collect())
    }

    async fn read_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
    ) -> DocumentStoreResult<Lookup<Bson>> {
        Ok(self
            .require_collection(database, collection)
            .await?
            .find_one(doc! { "_id": id })
            .await
            .map_err(driver_error)?
            .map(|doc| Self::restore_document(&doc))
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
        let prepared = Self::prepare_document(id, document)?;

        self.require_collection(database, collection)
            .await?
            .insert_one(&prepared)
            .await
            .map_err(write_error(ResourceKind::Document, id))?;

        Ok(Self::restore_document(&prepared))
    }

    async fn replace_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
        document: Bson,
    ) -> DocumentStoreResult<Bson> {
        let prepared = Self::prepare_document(id, document)?;

        let result = self
            .require_collection(database, collection)
            .await?
            .replace_one(doc! { "_id": id }, &prepared)
            .await
            .map_err(driver_error)?;

        if result.matched_count == 0 {
            return Err(DocumentStoreError::not_found(ResourceKind::Document, id));
        }

        Ok(Self::restore_document(&prepared))
    }

    async fn delete_document(
        &self,
        database: &str,
        collection: &str,
        id: &str,
    ) -> DocumentStoreResult<()> {
        let result = self
            .require_collection(database, collection)
            .await?
            .delete_one(doc! { "_id": id })
            .await
            .map_err(driver_error)?;

        if result.deleted_count == 0 {
            return Err(DocumentStoreError::not_found(ResourceKind::Document, id));
        }

        Ok(())
    }

    async fn query_page(
        &self,
        database: &str,
        collection: &str,
        query: &Query,
        continuation: Option<&ContinuationToken>,
        page_size: usize,
    ) -> DocumentStoreResult<Page<Bson>> {
        if page_size == 0 {
            return Err(DocumentStoreError::Validation("page size must be at least 1".into()));
        }
        let offset = match continuation {
            Some(token) => token.to_offset()?,
            None => 0,
        };

        let filter = match &query.filter {
            Some(expr) => MongoQueryTranslator.visit_expr(expr)?,
            None => doc! {},
        };

        let mut options = FindOptions::default();
        options.sort = Some(MongoQueryTranslator::sort(query.sort.as_ref()));
        options.skip = Some(offset as u64);
        options.limit = fetch_limit(page_size);

        let mut documents = self
            .require_collection(database, collection)
            .await?
            .find(filter)
            .with_options(options)
            .await
            .map_err(driver_error)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(driver_error)?;

        let more = documents.len() > page_size;
        documents.truncate(page_size);

        Ok(Page::builder(
            documents
                .iter()
                .map(Self::restore_document)
                .collect(),
        )
        .with_continuation(
            more.then(|| ContinuationToken::from_offset(offset.saturating_add(page_size))),
        )
        .build())
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

/// Connects a [`MongoDbStore`] from a connection string.
pub struct MongoDbStoreBuilder {
    dsn: String,
    app_name: Option<String>,
    password: Option<String>,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            app_name: None,
            password: None,
        }
    }

    /// Name reported to the server in connection handshakes.
    pub fn with_app_name(mut self, app_name: &str) -> Self {
        self.app_name = Some(app_name.to_string());
        self
    }

    /// Password for the user named in the connection string, kept out of the URI.
    pub fn with_password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        let mut options = ClientOptions::parse(&self.dsn)
            .await
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;
        if self.app_name.is_some() {
            options.app_name = self.app_name;
        }
        if let Some(password) = self.password {
            let mut credential = options.credential.take().unwrap_or_default();
            credential.password = Some(password);
            options.credential = Some(credential);
        }

        Ok(MongoDbStore::new(
            Client::with_options(options)
                .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?,
        ))
    }
}

/// Documents to request for a page: one extra tells whether another page exists.
///
/// `None` (no limit) when the page size does not fit the driver's signed limit.
fn fetch_limit(page_size: usize) -> Option<i64> {
    i64::try_from(page_size).ok().and_then(|n| n.checked_add(1))
}
