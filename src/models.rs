// src/models.rs
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sector {
    Tech,
    Finance,
    Bonds,
    #[serde(rename = "Real Estate")]
    RealEstate,
    Energy,
    Unknown,
}

impl Sector {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sector::Tech => "Tech",
            Sector::Finance => "Finance",
            Sector::Bonds => "Bonds",
            Sector::RealEstate => "Real Estate",
            Sector::Energy => "Energy",
            Sector::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sector '{0}'")]
pub struct UnknownSector(pub String);

impl FromStr for Sector {
    type Err = UnknownSector;

    // Exact match only; "Unknown" is a real member, not a fallback.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Tech" => Ok(Sector::Tech),
            "Finance" => Ok(Sector::Finance),
            "Bonds" => Ok(Sector::Bonds),
            "Real Estate" => Ok(Sector::RealEstate),
            "Energy" => Ok(Sector::Energy),
            "Unknown" => Ok(Sector::Unknown),
            other => Err(UnknownSector(other.to_string())),
        }
    }
}

/// Public representation of a trade, as returned by list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    pub trade_id: String,
    pub ticker: String,
    pub price: f64,
    pub count: f64,
    pub sector: Sector,
}

/// Composite key of a stored trade: partition `user_id`, sort `trade_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TradeKey {
    pub user_id: String,
    pub trade_id: String,
}

/// A validated create payload, before the server stamps it.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrade {
    pub user_id: String,
    pub trade_id: String,
    pub ticker: String,
    pub price: f64,
    pub count: f64,
    pub sector: Sector,
}

/// The persisted entity.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub user_id: String,
    pub trade_id: String,
    pub ticker: String,
    pub price: f64,
    pub count: f64,
    pub sector: Sector,
    pub created_at: DateTime<Utc>,
}

impl TradeRecord {
    /// Builds the record for a create, stamping `created_at` with the current time.
    pub fn from_new_trade(trade: NewTrade) -> Self {
        Self::with_created_at(trade, Utc::now())
    }

    pub fn with_created_at(trade: NewTrade, created_at: DateTime<Utc>) -> Self {
        Self {
            user_id: trade.user_id,
            trade_id: trade.trade_id,
            ticker: trade.ticker,
            price: trade.price,
            count: trade.count,
            sector: trade.sector,
            created_at,
        }
    }

    pub fn key(&self) -> TradeKey {
        TradeKey {
            user_id: self.user_id.clone(),
            trade_id: self.trade_id.clone(),
        }
    }

    pub fn created_at_iso(&self) -> String {
        self.created_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn into_stock(self) -> Stock {
        Stock {
            trade_id: self.trade_id,
            ticker: self.ticker,
            price: self.price,
            count: self.count,
            sector: self.sector,
        }
    }
}

// Request bodies keep every field optional so that absent values reach the
// validator instead of failing deserialization.

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockPayload {
    pub trade_id: Option<String>,
    pub ticker: Option<String>,
    pub price: Option<f64>,
    pub count: Option<f64>,
    pub sector: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTickerRequestBody {
    pub user_id: Option<String>,
    pub stock: Option<StockPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTickerRequestBody {
    pub user_id: Option<String>,
    pub trade_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListStocksRequestBody {
    pub user_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn new_trade() -> NewTrade {
        NewTrade {
            user_id: "u1".into(),
            trade_id: "t1".into(),
            ticker: "AAPL".into(),
            price: 150.0,
            count: 10.0,
            sector: Sector::Tech,
        }
    }

    #[test]
    fn test_sector_parses_exact_names_only() {
        assert_eq!("Real Estate".parse::<Sector>(), Ok(Sector::RealEstate));
        assert_eq!("Unknown".parse::<Sector>(), Ok(Sector::Unknown));
        assert!("tech".parse::<Sector>().is_err());
        assert_eq!(
            "Crypto".parse::<Sector>().unwrap_err().to_string(),
            "unknown sector 'Crypto'"
        );
    }

    #[test]
    fn test_sector_serializes_display_name() {
        assert_eq!(serde_json::to_value(Sector::RealEstate).unwrap(), json!("Real Estate"));
        for sector in [Sector::Tech, Sector::Bonds, Sector::RealEstate] {
            assert_eq!(sector.to_string().parse::<Sector>(), Ok(sector));
        }
    }

    #[test]
    fn test_record_stamps_creation_time() {
        let before = Utc::now();
        let record = TradeRecord::from_new_trade(new_trade());
        assert!(record.created_at >= before);
        assert!(record.created_at <= Utc::now());
    }

    #[test]
    fn test_created_at_is_iso_8601() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let record = TradeRecord::with_created_at(new_trade(), at);
        assert_eq!(record.created_at_iso(), "2024-03-01T12:30:00.000Z");
    }

    #[test]
    fn test_stock_strips_user_and_timestamp() {
        let stock = TradeRecord::from_new_trade(new_trade()).into_stock();
        let value = serde_json::to_value(&stock).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 5);
        assert_eq!(object["tradeId"], json!("t1"));
        assert_eq!(object["sector"], json!("Tech"));
        assert!(!object.contains_key("userId"));
        assert!(!object.contains_key("createdAt"));
    }

    #[test]
    fn test_create_body_tolerates_missing_fields() {
        let body: CreateTickerRequestBody =
            serde_json::from_value(json!({ "userId": "u1" })).unwrap();
        assert_eq!(body.user_id.as_deref(), Some("u1"));
        assert!(body.stock.is_none());
    }
}
