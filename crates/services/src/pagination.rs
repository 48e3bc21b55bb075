//! # List/Pagination Controller
//!
//! Offset/limit paging over any [`PageSource`]. The controller owns the list
//! state (accumulated items, offset, `has_more`, loading flags, last error)
//! and is the only thing that mutates it.
//!
//! State lives behind a `tokio` mutex that is never held across a fetch, so a
//! `load_more` issued while another load is in flight is observed and
//! dropped. Each reset bumps a generation counter; a page that arrives for an
//! older generation is discarded instead of being mixed into the new list.

use async_trait::async_trait;
use domains::{AppError, Envelope, Result};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Anything that can produce one page of items for an owner.
#[async_trait]
pub trait PageSource: Send + Sync {
    type Item: Clone + Send + Sync + 'static;

    async fn fetch_page(&self, owner_id: &str, offset: usize, limit: usize) -> Envelope<Vec<Self::Item>>;
}

/// Snapshot of a paginated list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListState<T> {
    pub items: Vec<T>,
    pub offset: usize,
    pub limit: usize,
    pub has_more: bool,
    pub loading: bool,
    pub loading_more: bool,
    pub error: Option<String>,
}

impl<T> ListState<T> {
    fn empty(limit: usize) -> Self {
        Self {
            items: Vec::new(),
            offset: 0,
            limit,
            has_more: false,
            loading: false,
            loading_more: false,
            error: None,
        }
    }
}

struct Inner<T> {
    state: ListState<T>,
    owner_id: Option<String>,
    generation: u64,
}

pub struct PaginatedList<S: PageSource> {
    source: S,
    limit: usize,
    inner: Mutex<Inner<S::Item>>,
}

impl<S: PageSource> PaginatedList<S> {
    /// # Errors
    ///
    /// Returns a validation error when `limit` is zero.
    pub fn new(source: S, limit: usize) -> Result<Self> {
        if limit == 0 {
            return Err(AppError::ValidationError("page size must be greater than zero".into()));
        }
        Ok(Self {
            source,
            limit,
            inner: Mutex::new(Inner { state: ListState::empty(limit), owner_id: None, generation: 0 }),
        })
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn snapshot(&self) -> ListState<S::Item> {
        self.inner.lock().await.state.clone()
    }

    /// Drops everything loaded so far and fetches the first page for `owner_id`.
    pub async fn reset_and_fetch(&self, owner_id: &str) -> ListState<S::Item> {
        let generation = {
            let mut inner = self.inner.lock().await;
            inner.generation += 1;
            inner.owner_id = Some(owner_id.to_string());
            inner.state = ListState { loading: true, ..ListState::empty(self.limit) };
            inner.generation
        };

        let page = self.source.fetch_page(owner_id, 0, self.limit).await;

        let mut inner = self.inner.lock().await;
        if inner.generation != generation {
            debug!(owner_id, "discarding first page of a superseded reset");
            return inner.state.clone();
        }
        inner.state.loading = false;
        if page.success {
            let items = self.clamp(owner_id, 0, page.data.unwrap_or_default());
            inner.state.has_more = items.len() == self.limit;
            inner.state.items = items;
        } else {
            inner.state.error = Some(page.failure_message().to_string());
        }
        inner.state.clone()
    }

    /// Fetches the next page and appends it. Does nothing when there is no
    /// next page, nothing has been loaded yet, or a load is already running.
    pub async fn load_more(&self) -> ListState<S::Item> {
        let (generation, owner_id, next_offset) = {
            let mut inner = self.inner.lock().await;
            let state = &inner.state;
            if !state.has_more || state.loading || state.loading_more {
                return inner.state.clone();
            }
            let Some(owner_id) = inner.owner_id.clone() else {
                return inner.state.clone();
            };
            let next_offset = inner.state.offset + self.limit;
            inner.state.loading_more = true;
            inner.state.error = None;
            (inner.generation, owner_id, next_offset)
        };

        let page = self.source.fetch_page(&owner_id, next_offset, self.limit).await;

        let mut inner = self.inner.lock().await;
        if inner.generation != generation {
            debug!(owner_id, next_offset, "discarding page of a superseded list");
            return inner.state.clone();
        }
        inner.state.loading_more = false;
        if page.success {
            let items = self.clamp(&owner_id, next_offset, page.data.unwrap_or_default());
            inner.state.has_more = items.len() == self.limit;
            inner.state.offset = next_offset;
            inner.state.items.extend(items);
        } else {
            inner.state.error = Some(page.failure_message().to_string());
        }
        inner.state.clone()
    }

    /// Drops anything past `limit` from a page the source over-filled.
    fn clamp(&self, owner_id: &str, offset: usize, mut items: Vec<S::Item>) -> Vec<S::Item> {
        if items.len() > self.limit {
            warn!(owner_id, offset, limit = self.limit, got = items.len(), "backend returned an oversized page");
            items.truncate(self.limit);
        }
        items
    }
}
