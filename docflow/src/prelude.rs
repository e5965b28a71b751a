//! Convenient re-exports of commonly used types from docflow.
//!
//! ```ignore
//! use docflow::prelude::*;
//! ```

pub use docflow_core::{
    backend::{DynStoreBackend, StoreBackend, StoreBackendBuilder},
    collection::{Collection, TypedCollection},
    cursor::{QueryCursor, TypedQueryCursor},
    document::{Document, DocumentExt},
    endpoint::{DynEndpoint, StoreEndpoint},
    error::{DocumentStoreError, DocumentStoreResult, ErrorClass, ResourceKind},
    lookup::{Lookup, ProvisionStatus, Provisioned},
    page::{ContinuationToken, Page},
    provision::ResourceProvisioner,
    query::{Expr, FieldOp, Filter, Query, QueryBuilder, QueryVisitor, Sort, SortDirection},
    resource::{CollectionSpec, DataType, IndexingPolicy, Precision, Throughput},
};

pub use crate::{
    config::{BackendKind, EndpointConfig, WorkflowConfig, connect},
    sink::{StatusSink, WorkflowEvent},
    workflow::{Workflow, WorkflowReport, run_to_completion},
};
