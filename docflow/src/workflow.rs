//! The family workflow: provision, seed, query, replace, delete.
//!
//! [`Workflow::run`] performs every step in order against one endpoint and stops at the first
//! error. Each step reports its outcome to a [`StatusSink`] as it completes. The steps are
//! also public so callers can drive them individually.

use tracing::{debug, info, warn};

use docflow_core::{
    backend::StoreBackend,
    collection::TypedCollection,
    endpoint::StoreEndpoint,
    error::DocumentStoreResult,
    lookup::ProvisionStatus,
    query::{Filter, Query},
};

use crate::{
    config::WorkflowConfig,
    family::{self, Family},
    sink::{StatusSink, WorkflowEvent},
};

/// Matches returned by one full pass of the workflow's query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    /// Round trips made, including a trailing empty page.
    pub pages: usize,
    pub matches: Vec<Family>,
}

impl QueryOutcome {
    pub fn ids(&self) -> Vec<&str> {
        self.matches.iter().map(|family| family.id.as_str()).collect()
    }
}

/// Everything a completed run did.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowReport {
    pub database: ProvisionStatus,
    pub collection: ProvisionStatus,
    pub seeded: Vec<(String, ProvisionStatus)>,
    /// Query results before the replace, after it, and after the delete.
    pub queries: Vec<QueryOutcome>,
    pub replaced: Family,
    pub deleted: String,
}

/// Drives the family workflow against one endpoint.
#[derive(Debug)]
pub struct Workflow<'e, B: StoreBackend, S: StatusSink> {
    endpoint: &'e StoreEndpoint<B>,
    config: WorkflowConfig,
    sink: S,
}

impl<'e, B: StoreBackend, S: StatusSink> Workflow<'e, B, S> {
    pub fn new(endpoint: &'e StoreEndpoint<B>, config: WorkflowConfig, sink: S) -> Self {
        Self {
            endpoint,
            config,
            sink,
        }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn families(&self) -> TypedCollection<'e, B, Family> {
        self.endpoint
            .typed_collection(&self.config.database, &self.config.collection)
    }

    /// Runs every step in order.
    ///
    /// The first sample is seeded, then replaced by a fresh copy whose first child moved up
    /// a grade, then deleted. The query runs after each of those.
    ///
    /// # Errors
    ///
    /// The first error of any step, unchanged. Later steps are not attempted.
    pub async fn run(&mut self) -> DocumentStoreResult<WorkflowReport> {
        info!(
            database = %self.config.database,
            collection = %self.config.collection,
            "workflow started"
        );

        let (database, collection) = self.provision().await?;
        let seeded = self.seed(&[family::andersen(), family::wakefield()]).await?;

        let mut queries = Vec::with_capacity(3);
        queries.push(self.run_query().await?);

        let mut updated = family::andersen();
        if let Some(child) = updated.children.first_mut() {
            child.grade = 6;
        }
        let replaced = self.replace(&updated).await?;
        queries.push(self.run_query().await?);

        self.delete(&updated.id).await?;
        queries.push(self.run_query().await?);

        info!("workflow finished");

        Ok(WorkflowReport {
            database,
            collection,
            seeded,
            queries,
            replaced,
            deleted: updated.id,
        })
    }

    /// Ensures the configured database and collection exist.
    pub async fn provision(&mut self) -> DocumentStoreResult<(ProvisionStatus, ProvisionStatus)> {
        let provisioner = self.endpoint.provisioner();

        let database = provisioner
            .ensure_database(&self.config.database)
            .await?
            .status();
        self.sink.report(&WorkflowEvent::Database {
            name: self.config.database.clone(),
            status: database,
        });

        let collection = provisioner
            .ensure_collection(
                &self.config.database,
                &self.config.collection,
                &self.config.collection_spec(),
            )
            .await?
            .status();
        self.sink.report(&WorkflowEvent::Collection {
            name: self.config.collection.clone(),
            status: collection,
        });

        Ok((database, collection))
    }

    /// Creates each family unless a document with its id already exists.
    pub async fn seed(
        &mut self,
        families: &[Family],
    ) -> DocumentStoreResult<Vec<(String, ProvisionStatus)>> {
        let repository = self.families();
        let mut seeded = Vec::with_capacity(families.len());

        for family in families {
            let status = repository.create_if_absent(family).await?.status();
            self.sink.report(&WorkflowEvent::Document {
                id: family.id.clone(),
                status,
            });
            seeded.push((family.id.clone(), status));
        }

        Ok(seeded)
    }

    /// Queries families by the configured last name, reporting every page.
    pub async fn run_query(&mut self) -> DocumentStoreResult<QueryOutcome> {
        let query = Query::filtered(Filter::eq("lastName", self.config.last_name.as_str()));
        let mut cursor = self.families().query(query, self.config.page_size)?;

        let mut outcome = QueryOutcome {
            pages: 0,
            matches: Vec::new(),
        };
        while let Some(page) = cursor.next_page().await? {
            outcome.pages += 1;
            for family in &page.items {
                debug!(%family, "query match");
            }
            self.sink.report(&WorkflowEvent::QueryPage {
                ids: page.items.iter().map(|family| family.id.clone()).collect(),
            });
            outcome.matches.extend(page.items);
        }

        info!(
            last_name = %self.config.last_name,
            matches = outcome.matches.len(),
            pages = outcome.pages,
            "query complete"
        );

        Ok(outcome)
    }

    /// Overwrites the stored family that has the same id.
    pub async fn replace(&mut self, family: &Family) -> DocumentStoreResult<Family> {
        let stored = self.families().replace(family).await?;
        self.sink.report(&WorkflowEvent::Replaced {
            id: stored.id.clone(),
        });

        Ok(stored)
    }

    pub async fn delete(&mut self, id: &str) -> DocumentStoreResult<()> {
        self.families().delete(id).await?;
        self.sink.report(&WorkflowEvent::Deleted { id: id.to_string() });

        Ok(())
    }
}

/// Runs the workflow on `endpoint`, then shuts the endpoint down whether or not the run
/// succeeded.
///
/// # Errors
///
/// The run's error if it failed, otherwise any shutdown error.
pub async fn run_to_completion<B: StoreBackend, S: StatusSink>(
    endpoint: StoreEndpoint<B>,
    config: WorkflowConfig,
    sink: S,
) -> DocumentStoreResult<WorkflowReport> {
    let outcome = Workflow::new(&endpoint, config, sink).run().await;
    let shutdown = endpoint.shutdown().await;

    if let (Err(_), Err(err)) = (&outcome, &shutdown) {
        warn!(error = %err, "endpoint shutdown failed after workflow error");
    }
    let report = outcome?;
    shutdown?;

    Ok(report)
}
