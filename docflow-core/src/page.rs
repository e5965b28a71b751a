//! Result pages and continuation tokens.
//!
//! A query runs as a series of round trips. Each round trip returns a [`Page`]: up to the
//! requested number of items plus, when more results remain, a [`ContinuationToken`] that
//! resumes the query where this page stopped.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// Page size used when the caller does not pick one.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Opaque position of a paginated query.
///
/// Callers only hand tokens back to the backend that issued them. Backends in this
/// workspace encode the number of results already delivered.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ContinuationToken(String);

impl ContinuationToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Token resuming after `offset` delivered results.
    pub fn from_offset(offset: usize) -> Self {
        Self(format!("+{offset}"))
    }

    /// Decodes a token produced by [`ContinuationToken::from_offset`].
    pub fn to_offset(&self) -> DocumentStoreResult<usize> {
        self.0
            .strip_prefix('+')
            .and_then(|digits| digits.parse().ok())
            .ok_or_else(|| {
                DocumentStoreError::Validation(format!("malformed continuation token {:?}", self.0))
            })
    }
}

impl fmt::Display for ContinuationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One round trip's worth of query results.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Matches delivered by this round trip; may be empty.
    pub items: Vec<T>,
    /// Where the next round trip resumes. `None` on the last page.
    pub continuation: Option<ContinuationToken>,
}

impl<T> Page<T> {
    pub fn builder(items: Vec<T>) -> PageBuilder<T> {
        PageBuilder::new(items)
    }

    /// Whether another round trip can return further results.
    pub fn more_available(&self) -> bool {
        self.continuation.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Converts every item, keeping the continuation.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            items: self
                .items
                .into_iter()
                .map(f)
                .collect::<Result<Vec<U>, E>>()?,
            continuation: self.continuation,
        })
    }

    /// Cuts one page out of a fully materialized, ordered result set.
    ///
    /// Resumes at the offset encoded in `continuation` (or at the start) and emits a
    /// continuation only if results remain past this page.
    pub fn slice(
        mut results: Vec<T>,
        continuation: Option<&ContinuationToken>,
        page_size: usize,
    ) -> DocumentStoreResult<Page<T>> {
        if page_size == 0 {
            return Err(DocumentStoreError::Validation("page size must be at least 1".into()));
        }

        let offset = match continuation {
            Some(token) => token.to_offset()?,
            None => 0,
        };

        if offset >= results.len() {
            return Ok(Page::default());
        }

        let end = offset.saturating_add(page_size).min(results.len());
        let more = end < results.len();
        results.truncate(end);
        let items = results.split_off(offset);

        Ok(Page::builder(items)
            .with_continuation(more.then(|| ContinuationToken::from_offset(end)))
            .build())
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            continuation: None,
        }
    }
}

/// Builder for [`Page`].
pub struct PageBuilder<T> {
    items: Vec<T>,
    continuation: Option<ContinuationToken>,
}

impl<T> PageBuilder<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            continuation: None,
        }
    }

    pub fn with_continuation(mut self, continuation: Option<ContinuationToken>) -> Self {
        self.continuation = continuation;
        self
    }

    pub fn build(self) -> Page<T> {
        Page {
            items: self.items,
            continuation: self.continuation,
        }
    }
}
