// src/schema.rs
//! Table layout of the portfolio store and the mapping between trade
//! entities and stored attribute values.
//!
//! Store adapters consume [`TableSchema`] to build their statements and call
//! [`TableSchema::encode`] / [`TableSchema::decode`] to move between
//! `TradeRecord` and a flat list of attribute values, so the entity types
//! never describe their own persistence.

use crate::error::StorageError;
use crate::models::{Sector, TradeKey, TradeRecord};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    Partition,
    Sort,
    Attribute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Text,
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub role: KeyRole,
    pub kind: AttributeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Text(String),
    Number(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub table: &'static str,
    pub fields: &'static [Field],
}

pub const USER_ID: &str = "user_id";
pub const TRADE_ID: &str = "trade_id";
pub const TICKER: &str = "ticker";
pub const PRICE: &str = "price";
pub const COUNT: &str = "count";
pub const SECTOR: &str = "sector";
pub const CREATED_AT: &str = "created_at";

const fn field(name: &'static str, role: KeyRole, kind: AttributeKind) -> Field {
    Field { name, role, kind }
}

pub const STOCKS_PORTFOLIO_TABLE: TableSchema = TableSchema {
    table: "stocks_portfolio_data",
    fields: &[
        field(USER_ID, KeyRole::Partition, AttributeKind::Text),
        field(TRADE_ID, KeyRole::Sort, AttributeKind::Text),
        field(TICKER, KeyRole::Attribute, AttributeKind::Text),
        field(PRICE, KeyRole::Attribute, AttributeKind::Number),
        field(COUNT, KeyRole::Attribute, AttributeKind::Number),
        field(SECTOR, KeyRole::Attribute, AttributeKind::Text),
        field(CREATED_AT, KeyRole::Attribute, AttributeKind::Text),
    ],
};

impl TableSchema {
    pub fn partition_key(&self) -> Result<&Field, StorageError> {
        self.key(KeyRole::Partition)
    }

    pub fn sort_key(&self) -> Result<&Field, StorageError> {
        self.key(KeyRole::Sort)
    }

    fn key(&self, role: KeyRole) -> Result<&Field, StorageError> {
        self.fields.iter().find(|f| f.role == role).ok_or_else(|| {
            StorageError::Query(format!("table {} has no {:?} key", self.table, role))
        })
    }

    /// Attribute values of `record`, in field order.
    pub fn encode(&self, record: &TradeRecord) -> Result<Vec<AttributeValue>, StorageError> {
        self.fields
            .iter()
            .map(|f| {
                let value = match f.name {
                    USER_ID => AttributeValue::Text(record.user_id.clone()),
                    TRADE_ID => AttributeValue::Text(record.trade_id.clone()),
                    TICKER => AttributeValue::Text(record.ticker.clone()),
                    PRICE => AttributeValue::Number(record.price),
                    COUNT => AttributeValue::Number(record.count),
                    SECTOR => AttributeValue::Text(record.sector.as_str().to_string()),
                    CREATED_AT => AttributeValue::Text(record.created_at_iso()),
                    other => return Err(unknown_field(other)),
                };
                Ok(value)
            })
            .collect()
    }

    /// Partition then sort key values of `key`. No other attribute is read.
    pub fn encode_key(&self, key: &TradeKey) -> Result<Vec<AttributeValue>, StorageError> {
        [self.partition_key()?, self.sort_key()?]
            .iter()
            .map(|f| match f.name {
                USER_ID => Ok(AttributeValue::Text(key.user_id.clone())),
                TRADE_ID => Ok(AttributeValue::Text(key.trade_id.clone())),
                other => Err(StorageError::Decode(format!(
                    "key attribute {} is not part of a trade key",
                    other
                ))),
            })
            .collect()
    }

    /// Rebuilds a record from values in field order. `None` marks a missing
    /// attribute.
    pub fn decode(&self, values: Vec<Option<AttributeValue>>) -> Result<TradeRecord, StorageError> {
        if values.len() != self.fields.len() {
            return Err(StorageError::Decode(format!(
                "expected {} attributes, got {}",
                self.fields.len(),
                values.len()
            )));
        }

        let mut item = Item::default();
        for (field, value) in self.fields.iter().zip(values) {
            let value = value.ok_or_else(|| {
                StorageError::Decode(format!("missing attribute {}", field.name))
            })?;
            item.set(field, value)?;
        }
        item.into_record()
    }
}

#[derive(Default)]
struct Item {
    user_id: Option<String>,
    trade_id: Option<String>,
    ticker: Option<String>,
    price: Option<f64>,
    count: Option<f64>,
    sector: Option<String>,
    created_at: Option<String>,
}

impl Item {
    fn set(&mut self, field: &Field, value: AttributeValue) -> Result<(), StorageError> {
        match (field.kind, value) {
            (AttributeKind::Text, AttributeValue::Text(text)) => {
                let slot = match field.name {
                    USER_ID => &mut self.user_id,
                    TRADE_ID => &mut self.trade_id,
                    TICKER => &mut self.ticker,
                    SECTOR => &mut self.sector,
                    CREATED_AT => &mut self.created_at,
                    other => return Err(unknown_field(other)),
                };
                *slot = Some(text);
            }
            (AttributeKind::Number, AttributeValue::Number(number)) => {
                let slot = match field.name {
                    PRICE => &mut self.price,
                    COUNT => &mut self.count,
                    other => return Err(unknown_field(other)),
                };
                *slot = Some(number);
            }
            (kind, value) => {
                return Err(StorageError::Decode(format!(
                    "attribute {} should be {:?}, got {:?}",
                    field.name, kind, value
                )))
            }
        }
        Ok(())
    }

    fn into_record(self) -> Result<TradeRecord, StorageError> {
        let missing = |name: &str| StorageError::Decode(format!("missing attribute {}", name));

        let sector = self.sector.ok_or_else(|| missing(SECTOR))?;
        let sector = sector
            .parse::<Sector>()
            .map_err(|e| StorageError::Decode(e.to_string()))?;
        let created_at = self.created_at.ok_or_else(|| missing(CREATED_AT))?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| StorageError::Decode(format!("created_at '{}': {}", created_at, e)))?
            .with_timezone(&Utc);

        Ok(TradeRecord {
            user_id: self.user_id.ok_or_else(|| missing(USER_ID))?,
            trade_id: self.trade_id.ok_or_else(|| missing(TRADE_ID))?,
            ticker: self.ticker.ok_or_else(|| missing(TICKER))?,
            price: self.price.ok_or_else(|| missing(PRICE))?,
            count: self.count.ok_or_else(|| missing(COUNT))?,
            sector,
            created_at,
        })
    }
}

fn unknown_field(name: &str) -> StorageError {
    StorageError::Decode(format!("unmapped attribute {}", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewTrade;

    fn record() -> TradeRecord {
        TradeRecord::from_new_trade(NewTrade {
            user_id: "u1".into(),
            trade_id: "t1".into(),
            ticker: "XOM".into(),
            price: 101.25,
            count: 4.0,
            sector: Sector::Energy,
        })
    }

    #[test]
    fn test_schema_keys() {
        assert_eq!(STOCKS_PORTFOLIO_TABLE.partition_key().unwrap().name, "user_id");
        assert_eq!(STOCKS_PORTFOLIO_TABLE.sort_key().unwrap().name, "trade_id");
    }

    #[test]
    fn test_encode_key_follows_key_roles() {
        let key = TradeKey {
            user_id: "u1".into(),
            trade_id: "t1".into(),
        };
        assert_eq!(
            STOCKS_PORTFOLIO_TABLE.encode_key(&key).unwrap(),
            vec![
                AttributeValue::Text("u1".into()),
                AttributeValue::Text("t1".into())
            ]
        );

        // Sort key declared first still binds partition then sort.
        const REORDERED: TableSchema = TableSchema {
            table: "reordered",
            fields: &[
                field(TRADE_ID, KeyRole::Sort, AttributeKind::Text),
                field(USER_ID, KeyRole::Partition, AttributeKind::Text),
            ],
        };
        assert_eq!(
            REORDERED.encode_key(&key).unwrap()[0],
            AttributeValue::Text("u1".into())
        );

        const FOREIGN_KEY: TableSchema = TableSchema {
            table: "foreign",
            fields: &[
                field(TICKER, KeyRole::Partition, AttributeKind::Text),
                field(TRADE_ID, KeyRole::Sort, AttributeKind::Text),
            ],
        };
        assert!(FOREIGN_KEY.encode_key(&key).is_err());
    }

    #[test]
    fn test_encode_follows_field_order() {
        let values = STOCKS_PORTFOLIO_TABLE.encode(&record()).unwrap();
        assert_eq!(values.len(), STOCKS_PORTFOLIO_TABLE.fields.len());
        assert_eq!(values[0], AttributeValue::Text("u1".into()));
        assert_eq!(values[3], AttributeValue::Number(101.25));
        assert_eq!(values[5], AttributeValue::Text("Energy".into()));
    }

    #[test]
    fn test_decode_restores_record() {
        let original = record();
        let values = STOCKS_PORTFOLIO_TABLE
            .encode(&original)
            .unwrap()
            .into_iter()
            .map(Some)
            .collect();
        let decoded = STOCKS_PORTFOLIO_TABLE.decode(values).unwrap();

        assert_eq!(decoded.key(), original.key());
        assert_eq!(decoded.sector, Sector::Energy);
        assert_eq!(
            decoded.created_at.timestamp_millis(),
            original.created_at.timestamp_millis()
        );
    }

    #[test]
    fn test_decode_rejects_missing_and_mistyped_attributes() {
        let mut values: Vec<Option<AttributeValue>> = STOCKS_PORTFOLIO_TABLE
            .encode(&record())
            .unwrap()
            .into_iter()
            .map(Some)
            .collect();
        values[2] = None;
        assert!(matches!(
            STOCKS_PORTFOLIO_TABLE.decode(values.clone()),
            Err(StorageError::Decode(_))
        ));

        values[2] = Some(AttributeValue::Number(1.0));
        assert!(STOCKS_PORTFOLIO_TABLE.decode(values).is_err());
    }

    #[test]
    fn test_decode_rejects_out_of_band_sector() {
        let mut values: Vec<Option<AttributeValue>> = STOCKS_PORTFOLIO_TABLE
            .encode(&record())
            .unwrap()
            .into_iter()
            .map(Some)
            .collect();
        values[5] = Some(AttributeValue::Text("Crypto".into()));
        assert!(STOCKS_PORTFOLIO_TABLE.decode(values).is_err());
    }
}
