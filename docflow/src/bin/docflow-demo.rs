use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use docflow::{
    config::{BackendKind, EndpointConfig, WorkflowConfig, connect},
    page::DEFAULT_PAGE_SIZE,
    resource::Throughput,
    sink::{ConsoleSink, Tee, TracingSink},
    workflow::run_to_completion,
};

/// Provisions the family database and runs the seed, query, replace, delete workflow.
#[derive(Parser, Debug)]
#[command(name = "docflow-demo", version, about)]
struct Cli {
    /// Store client to run against: memory or mongodb.
    #[arg(long, env = "DOCFLOW_BACKEND", default_value_t = BackendKind::Memory)]
    backend: BackendKind,

    /// Connection string of the store.
    #[arg(long, env = "DOCFLOW_ENDPOINT", default_value = "mongodb://localhost:27017")]
    endpoint: String,

    /// Account key used as the connection password.
    #[arg(long, env = "DOCFLOW_PRIMARY_KEY", hide_env_values = true)]
    primary_key: Option<String>,

    #[arg(long, env = "DOCFLOW_DATABASE", default_value = "FamilyDB")]
    database: String,

    #[arg(long, env = "DOCFLOW_COLLECTION", default_value = "FamilyCollection")]
    collection: String,

    /// Request units provisioned for a newly created collection.
    #[arg(long, env = "DOCFLOW_THROUGHPUT", default_value_t = Throughput::MIN.0)]
    throughput: u32,

    /// Maximum documents fetched per query round trip.
    #[arg(long, env = "DOCFLOW_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,
}

impl Cli {
    fn endpoint_config(&self) -> EndpointConfig {
        EndpointConfig {
            backend: self.backend,
            endpoint_uri: self.endpoint.clone(),
            primary_key: self.primary_key.clone(),
        }
    }

    fn workflow_config(&self) -> WorkflowConfig {
        WorkflowConfig {
            database: self.database.clone(),
            collection: self.collection.clone(),
            throughput: self.throughput,
            page_size: self.page_size,
            ..WorkflowConfig::default()
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let endpoint = connect(&cli.endpoint_config())
        .await
        .with_context(|| format!("connecting to the {} backend", cli.backend))?;

    let sink = Tee(ConsoleSink::stdout(), TracingSink);
    let report = run_to_completion(endpoint, cli.workflow_config(), sink)
        .await
        .context("running the family workflow")?;

    info!(
        database = %report.database,
        collection = %report.collection,
        queries = report.queries.len(),
        deleted = %report.deleted,
        "End of demo"
    );

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("demo failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}
