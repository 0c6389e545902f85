// src/store.rs
//! Storage gateway contract over a partitioned key-range store.

use crate::error::StorageError;
use crate::models::{TradeKey, TradeRecord};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, Stream};

pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Opaque continuation token handed back by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor(pub Bytes);

#[derive(Debug, Clone, Default)]
pub struct Page {
    pub items: Vec<TradeRecord>,
    /// `None` once the partition is exhausted.
    pub next: Option<PageCursor>,
}

#[async_trait]
pub trait TradeStore: Send + Sync {
    /// Upsert keyed by `(user_id, trade_id)`.
    async fn put(&self, record: &TradeRecord) -> Result<(), StorageError>;

    /// Removing a key that does not exist succeeds.
    async fn delete(&self, key: &TradeKey) -> Result<(), StorageError>;

    /// Fetches one page of the `user_id` partition, in sort-key order,
    /// resuming after `cursor` when given.
    async fn query_page(
        &self,
        user_id: &str,
        page_size: usize,
        cursor: Option<PageCursor>,
    ) -> Result<Page, StorageError>;
}

enum PageState {
    Start,
    Resume(PageCursor),
    Exhausted,
}

/// Lazily walks every page of a partition. Each call starts a fresh query and
/// pages are fetched one after another, each only once the previous one has
/// been consumed.
pub fn pages<'a, S>(
    store: &'a S,
    user_id: &'a str,
    page_size: usize,
) -> impl Stream<Item = Result<Vec<TradeRecord>, StorageError>> + Send + 'a
where
    S: TradeStore + ?Sized,
{
    stream::try_unfold(PageState::Start, move |state| async move {
        let cursor = match state {
            PageState::Exhausted => return Ok(None),
            PageState::Start => None,
            PageState::Resume(cursor) => Some(cursor),
        };

        let page = store.query_page(user_id, page_size, cursor).await?;
        let next = match page.next {
            Some(cursor) => PageState::Resume(cursor),
            None => PageState::Exhausted,
        };
        Ok::<_, StorageError>(Some((page.items, next)))
    })
}
