// src/db.rs
use crate::error::StorageError;
use crate::models::{TradeKey, TradeRecord};
use crate::schema::{AttributeKind, AttributeValue, TableSchema, STOCKS_PORTFOLIO_TABLE};
use crate::store::{Page, PageCursor, TradeStore};
use async_trait::async_trait;
use log::{debug, info};
use scylla::frame::response::result::{CqlValue, Row};
use scylla::frame::value::{Value, ValueTooBig};
use scylla::query::Query;
use scylla::{Session, SessionBuilder};
use std::sync::Arc;

impl Value for AttributeValue {
    fn serialize(&self, buf: &mut Vec<u8>) -> Result<(), ValueTooBig> {
        match self {
            AttributeValue::Text(text) => text.serialize(buf),
            AttributeValue::Number(number) => number.serialize(buf),
        }
    }
}

fn quoted(name: &str) -> String {
    format!("\"{}\"", name)
}

fn cql_type(kind: AttributeKind) -> &'static str {
    match kind {
        AttributeKind::Text => "text",
        AttributeKind::Number => "double",
    }
}

/// CQL statements generated from a [`TableSchema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statements {
    pub create_keyspace: String,
    pub create_table: String,
    pub insert: String,
    pub delete: String,
    pub select_partition: String,
}

impl Statements {
    pub fn new(keyspace: &str, schema: &TableSchema) -> Result<Self, StorageError> {
        let table = format!("{}.{}", keyspace, schema.table);
        let partition = quoted(schema.partition_key()?.name);
        let sort = quoted(schema.sort_key()?.name);

        let columns: Vec<String> = schema.fields.iter().map(|f| quoted(f.name)).collect();
        let definitions: Vec<String> = schema
            .fields
            .iter()
            .map(|f| format!("{} {}", quoted(f.name), cql_type(f.kind)))
            .collect();
        let markers = vec!["?"; schema.fields.len()].join(", ");

        Ok(Self {
            create_keyspace: format!(
                "CREATE KEYSPACE IF NOT EXISTS {} WITH REPLICATION = {{'class': 'SimpleStrategy', 'replication_factor': 1}}",
                keyspace
            ),
            create_table: format!(
                "CREATE TABLE IF NOT EXISTS {} ({}, PRIMARY KEY ({}, {})) WITH CLUSTERING ORDER BY ({} ASC)",
                table,
                definitions.join(", "),
                partition,
                sort,
                sort
            ),
            insert: format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table,
                columns.join(", "),
                markers
            ),
            delete: format!(
                "DELETE FROM {} WHERE {} = ? AND {} = ?",
                table, partition, sort
            ),
            select_partition: format!(
                "SELECT {} FROM {} WHERE {} = ?",
                columns.join(", "),
                table,
                partition
            ),
        })
    }
}

/// `TradeStore` backed by a ScyllaDB table. The session is shared and carries
/// no per-request state.
#[derive(Clone)]
pub struct ScyllaTradeStore {
    session: Arc<Session>,
    schema: TableSchema,
    statements: Arc<Statements>,
}

pub async fn connect(node: &str) -> Result<Session, StorageError> {
    let session = SessionBuilder::new()
        .known_node(node)
        .build()
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;
    info!("Successfully connected to ScyllaDB at {}.", node);
    Ok(session)
}

impl ScyllaTradeStore {
    pub fn new(session: Arc<Session>, keyspace: &str) -> Result<Self, StorageError> {
        let schema = STOCKS_PORTFOLIO_TABLE;
        let statements = Statements::new(keyspace, &schema)?;
        Ok(Self {
            session,
            schema,
            statements: Arc::new(statements),
        })
    }

    /// Creates the keyspace and table if they don't exist.
    pub async fn init(&self) -> Result<(), StorageError> {
        self.session
            .query(self.statements.create_keyspace.as_str(), &[])
            .await
            .map_err(|e| StorageError::Query(e.to_string()))?;
        self.session
            .query(self.statements.create_table.as_str(), &[])
            .await
            .map_err(|e| StorageError::Query(e.to_string()))?;
        info!("Table {} is ready.", self.schema.table);
        Ok(())
    }

    fn decode_row(&self, row: Row) -> Result<TradeRecord, StorageError> {
        let values = self
            .schema
            .fields
            .iter()
            .zip(row.columns)
            .map(|(field, column)| match (field.kind, column) {
                (_, None) => Ok(None),
                (AttributeKind::Text, Some(CqlValue::Text(text)))
                | (AttributeKind::Text, Some(CqlValue::Ascii(text))) => {
                    Ok(Some(AttributeValue::Text(text)))
                }
                (AttributeKind::Number, Some(CqlValue::Double(number))) => {
                    Ok(Some(AttributeValue::Number(number)))
                }
                (kind, Some(other)) => Err(StorageError::Decode(format!(
                    "column {} holds {:?}, expected {:?}",
                    field.name, other, kind
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.schema.decode(values)
    }
}

#[async_trait]
impl TradeStore for ScyllaTradeStore {
    async fn put(&self, record: &TradeRecord) -> Result<(), StorageError> {
        let values = self.schema.encode(record)?;
        self.session
            .query(self.statements.insert.as_str(), values)
            .await
            .map_err(|e| StorageError::Query(e.to_string()))?;
        debug!("Stored trade {} for user {}", record.trade_id, record.user_id);
        Ok(())
    }

    async fn delete(&self, key: &TradeKey) -> Result<(), StorageError> {
        let values = self.schema.encode_key(key)?;
        self.session
            .query(self.statements.delete.as_str(), values)
            .await
            .map_err(|e| StorageError::Query(e.to_string()))?;
        debug!("Deleted trade {} for user {}", key.trade_id, key.user_id);
        Ok(())
    }

    async fn query_page(
        &self,
        user_id: &str,
        page_size: usize,
        cursor: Option<PageCursor>,
    ) -> Result<Page, StorageError> {
        let page_size = i32::try_from(page_size)
            .ok()
            .filter(|size| *size > 0)
            .ok_or_else(|| StorageError::Query(format!("invalid page size {}", page_size)))?;

        let mut query = Query::new(self.statements.select_partition.clone());
        query.set_page_size(page_size);

        let result = self
            .session
            .query_paged(query, (user_id,), cursor.map(|c| c.0))
            .await
            .map_err(|e| StorageError::Query(e.to_string()))?;

        let items = result
            .rows
            .unwrap_or_default()
            .into_iter()
            .map(|row| self.decode_row(row))
            .collect::<Result<Vec<_>, _>>()?;
        // Cursor handling in `store::pages` is tested against the memory store;
        // `test_paging_state_walks_whole_partition` runs it against a live node.
        let next = result.paging_state.map(PageCursor);

        debug!(
            "Fetched page of {} trades for user {} (more: {})",
            items.len(),
            user_id,
            next.is_some()
        );
        Ok(Page { items, next })
    }
}
