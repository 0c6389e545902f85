// src/memory.rs
//! In-process `TradeStore`.
//!
//! Items are kept in their encoded attribute form, one ordered map per
//! partition, so reads go through the same schema decoding as a remote
//! store. Suitable for tests and single-instance development runs; data is
//! lost on restart.

use crate::error::StorageError;
use crate::models::{TradeKey, TradeRecord};
use crate::schema::{AttributeValue, TableSchema, STOCKS_PORTFOLIO_TABLE};
use crate::store::{Page, PageCursor, TradeStore};
use async_trait::async_trait;
use bytes::Bytes;
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::Arc;
use tokio::sync::RwLock;

type Partition = BTreeMap<String, Vec<AttributeValue>>;

#[derive(Clone)]
pub struct InMemoryTradeStore {
    schema: TableSchema,
    partitions: Arc<RwLock<HashMap<String, Partition>>>,
}

impl InMemoryTradeStore {
    pub fn new() -> Self {
        Self::with_schema(STOCKS_PORTFOLIO_TABLE)
    }

    pub fn with_schema(schema: TableSchema) -> Self {
        Self {
            schema,
            partitions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of items stored under `user_id`.
    pub async fn partition_len(&self, user_id: &str) -> usize {
        self.partitions
            .read()
            .await
            .get(user_id)
            .map_or(0, |p| p.len())
    }
}

impl Default for InMemoryTradeStore {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_cursor(cursor: &PageCursor) -> Result<String, StorageError> {
    String::from_utf8(cursor.0.to_vec()).map_err(|e| StorageError::InvalidCursor(e.to_string()))
}

#[async_trait]
impl TradeStore for InMemoryTradeStore {
    async fn put(&self, record: &TradeRecord) -> Result<(), StorageError> {
        let item = self.schema.encode(record)?;
        let key = record.key();
        debug!("Storing trade {} for user {}", key.trade_id, key.user_id);
        self.partitions
            .write()
            .await
            .entry(key.user_id)
            .or_default()
            .insert(key.trade_id, item);
        Ok(())
    }

    async fn delete(&self, key: &TradeKey) -> Result<(), StorageError> {
        let mut partitions = self.partitions.write().await;
        if let Some(partition) = partitions.get_mut(&key.user_id) {
            partition.remove(&key.trade_id);
            if partition.is_empty() {
                partitions.remove(&key.user_id);
            }
        }
        debug!("Deleted trade {} for user {}", key.trade_id, key.user_id);
        Ok(())
    }

    async fn query_page(
        &self,
        user_id: &str,
        page_size: usize,
        cursor: Option<PageCursor>,
    ) -> Result<Page, StorageError> {
        if page_size == 0 {
            return Err(StorageError::Query("page size must be positive".into()));
        }
        let after = cursor.as_ref().map(decode_cursor).transpose()?;

        let partitions = self.partitions.read().await;
        let Some(partition) = partitions.get(user_id) else {
            return Ok(Page::default());
        };

        let start = match &after {
            Some(last) => Bound::Excluded(last.clone()),
            None => Bound::Unbounded,
        };
        let mut remaining = partition.range((start, Bound::Unbounded));

        let mut items = Vec::with_capacity(page_size.min(partition.len()));
        let mut last_key = None;
        for (trade_id, values) in remaining.by_ref().take(page_size) {
            let values = values.iter().cloned().map(Some).collect();
            items.push(self.schema.decode(values)?);
            last_key = Some(trade_id.clone());
        }

        let next = match (last_key, remaining.next()) {
            (Some(last), Some(_)) => Some(PageCursor(Bytes::from(last))),
            _ => None,
        };
        debug!(
            "Fetched page of {} trades for user {} (more: {})",
            items.len(),
            user_id,
            next.is_some()
        );
        Ok(Page { items, next })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewTrade, Sector};

    fn record(user_id: &str, trade_id: &str, ticker: &str) -> TradeRecord {
        TradeRecord::from_new_trade(NewTrade {
            user_id: user_id.into(),
            trade_id: trade_id.into(),
            ticker: ticker.into(),
            price: 42.0,
            count: 3.0,
            sector: Sector::Finance,
        })
    }

    fn key(user_id: &str, trade_id: &str) -> TradeKey {
        TradeKey {
            user_id: user_id.into(),
            trade_id: trade_id.into(),
        }
    }

    #[tokio::test]
    async fn test_put_overwrites_same_key() {
        let store = InMemoryTradeStore::new();
        store.put(&record("u1", "t1", "JPM")).await.unwrap();
        store.put(&record("u1", "t1", "GS")).await.unwrap();

        let page = store.query_page("u1", 10, None).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].ticker, "GS");
        assert!(page.next.is_none());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = InMemoryTradeStore::new();
        store.put(&record("u1", "t1", "JPM")).await.unwrap();

        store.delete(&key("u1", "t1")).await.unwrap();
        store.delete(&key("u1", "t1")).await.unwrap();
        store.delete(&key("ghost", "t9")).await.unwrap();

        assert_eq!(store.partition_len("u1").await, 0);
    }

    #[tokio::test]
    async fn test_partitions_are_isolated() {
        let store = InMemoryTradeStore::new();
        store.put(&record("u1", "t1", "JPM")).await.unwrap();
        store.put(&record("u2", "t1", "GS")).await.unwrap();

        let page = store.query_page("u2", 10, None).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].user_id, "u2");
    }

    #[tokio::test]
    async fn test_query_pages_in_sort_key_order() {
        let store = InMemoryTradeStore::new();
        for id in ["c", "a", "b"] {
            store.put(&record("u1", id, "JPM")).await.unwrap();
        }

        let first = store.query_page("u1", 2, None).await.unwrap();
        let ids: Vec<&str> = first.items.iter().map(|r| r.trade_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        let second = store.query_page("u1", 2, first.next).await.unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].trade_id, "c");
        assert!(second.next.is_none());
    }

    #[tokio::test]
    async fn test_exact_page_boundary_has_no_cursor() {
        let store = InMemoryTradeStore::new();
        store.put(&record("u1", "a", "JPM")).await.unwrap();
        store.put(&record("u1", "b", "JPM")).await.unwrap();

        let page = store.query_page("u1", 2, None).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.next.is_none());
    }

    #[tokio::test]
    async fn test_rejects_garbled_cursor() {
        let store = InMemoryTradeStore::new();
        store.put(&record("u1", "a", "JPM")).await.unwrap();

        let cursor = PageCursor(Bytes::from_static(&[0xff, 0xfe]));
        let result = store.query_page("u1", 2, Some(cursor)).await;
        assert!(matches!(result, Err(StorageError::InvalidCursor(_))));
    }
}
