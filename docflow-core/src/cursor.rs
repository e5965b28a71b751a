//! Lazy, forward-only query execution.
//!
//! A [`QueryCursor`] runs a [`Query`] against one collection a page at a time. Nothing is
//! fetched until [`QueryCursor::next_page`] is called, and once the backend reports that no
//! further results remain the cursor stops contacting it. A cursor cannot be rewound;
//! create a new one for a fresh pass.
//!
//! ```ignore
//! let mut cursor = family.query(Query::filtered(Filter::eq("lastName", "Andersen")), 100)?;
//!
//! while let Some(page) = cursor.next_page().await? {
//!     if page.is_empty() {
//!         println!("Nothing Found");
//!     }
//!     for doc in page.items {
//!         println!("{doc}");
//!     }
//! }
//! ```

use bson::Bson;
use futures::{Stream, TryStreamExt, stream};
use std::marker::PhantomData;
use tracing::debug;

use crate::{
    backend::StoreBackend,
    document::{Document, DocumentExt},
    error::{DocumentStoreError, DocumentStoreResult},
    page::{ContinuationToken, Page},
    query::Query,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorState {
    Fresh,
    Open,
    Exhausted,
}

/// Paginated execution of one query over raw BSON documents.
#[derive(Debug)]
pub struct QueryCursor<'a, B: StoreBackend> {
    backend: &'a B,
    database: String,
    collection: String,
    query: Query,
    page_size: usize,
    continuation: Option<ContinuationToken>,
    state: CursorState,
}

impl<'a, B: StoreBackend> QueryCursor<'a, B> {
    /// Fails with `Validation` when `page_size` is zero. No round trip is made.
    pub(crate) fn new(
        backend: &'a B,
        database: String,
        collection: String,
        query: Query,
        page_size: usize,
    ) -> DocumentStoreResult<Self> {
        if page_size == 0 {
            return Err(DocumentStoreError::Validation("page size must be at least 1".into()));
        }

        Ok(Self {
            backend,
            database,
            collection,
            query,
            page_size,
            continuation: None,
            state: CursorState::Fresh,
        })
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// True before the first fetch, then whether the last page had a continuation.
    pub fn has_more_results(&self) -> bool {
        self.state != CursorState::Exhausted
    }

    /// Fetches the next page.
    ///
    /// Returns `Ok(None)` once the cursor is exhausted, without a round trip. A page may
    /// be empty; that is an ordinary result, typically the only page of a query with no
    /// matches.
    ///
    /// # Errors
    ///
    /// Backend errors propagate unchanged. The cursor position is not advanced on error.
    pub async fn next_page(&mut self) -> DocumentStoreResult<Option<Page<Bson>>> {
        let Some(page) = self.fetch().await? else {
            return Ok(None);
        };
        self.advance(page.continuation.clone());

        Ok(Some(page))
    }

    /// Fetches the page at the current position without moving past it.
    async fn fetch(&self) -> DocumentStoreResult<Option<Page<Bson>>> {
        if !self.has_more_results() {
            return Ok(None);
        }

        let page = self
            .backend
            .query_page(
                &self.database,
                &self.collection,
                &self.query,
                self.continuation.as_ref(),
                self.page_size,
            )
            .await?;

        debug!(
            database = %self.database,
            collection = %self.collection,
            items = page.len(),
            more = page.more_available(),
            "fetched query page"
        );

        Ok(Some(page))
    }

    fn advance(&mut self, continuation: Option<ContinuationToken>) {
        self.state = if continuation.is_some() {
            CursorState::Open
        } else {
            CursorState::Exhausted
        };
        self.continuation = continuation;
    }

    /// Drains every remaining page into one vector.
    pub async fn collect_all(mut self) -> DocumentStoreResult<Vec<Bson>> {
        let mut items = Vec::new();
        while let Some(page) = self.next_page().await? {
            items.extend(page.items);
        }
        Ok(items)
    }

    /// Yields matches one at a time, fetching pages as they are needed.
    pub fn into_stream(self) -> impl Stream<Item = DocumentStoreResult<Bson>> + 'a {
        stream::try_unfold(self, |mut cursor| async move {
            Ok::<_, DocumentStoreError>(cursor
                .next_page()
                .await?
                .map(|page| (stream::iter(page.items.into_iter().map(Ok)), cursor)))
        })
        .try_flatten()
    }
}

/// [`QueryCursor`] that deserializes every match into `D`.
#[derive(Debug)]
pub struct TypedQueryCursor<'a, B: StoreBackend, D: Document> {
    inner: QueryCursor<'a, B>,
    _marker: PhantomData<D>,
}

impl<'a, B: StoreBackend, D: Document> TypedQueryCursor<'a, B, D> {
    pub(crate) fn new(inner: QueryCursor<'a, B>) -> Self {
        Self { inner, _marker: PhantomData }
    }

    pub fn has_more_results(&self) -> bool {
        self.inner.has_more_results()
    }

    /// See [`QueryCursor::next_page`]. A match that does not deserialize into `D` fails
    /// the page with a `Serialization` error and leaves the cursor on that page.
    pub async fn next_page(&mut self) -> DocumentStoreResult<Option<Page<D>>> {
        let Some(page) = self.inner.fetch().await? else {
            return Ok(None);
        };
        let continuation = page.continuation.clone();
        let page = page.try_map(D::from_bson)?;
        self.inner.advance(continuation);

        Ok(Some(page))
    }

    pub async fn collect_all(mut self) -> DocumentStoreResult<Vec<D>> {
        let mut items = Vec::new();
        while let Some(page) = self.next_page().await? {
            items.extend(page.items);
        }
        Ok(items)
    }

    pub fn into_stream(self) -> impl Stream<Item = DocumentStoreResult<D>> + 'a {
        self.inner
            .into_stream()
            .and_then(|doc| async move { D::from_bson(doc) })
    }

    /// Drops the typing.
    pub fn into_untyped(self) -> QueryCursor<'a, B> {
        self.inner
    }
}
