// src/validation.rs
//! Per-operation payload rules.
//!
//! A field counts as present only when it is set, is not an empty string and,
//! for numbers, is not exactly zero. A zero price or count is therefore
//! rejected as missing rather than accepted as a zero amount.

use crate::error::ValidationError;
use crate::models::{
    CreateTickerRequestBody, DeleteTickerRequestBody, ListStocksRequestBody, NewTrade, Sector,
    TradeKey,
};

/// Checks a request body and yields the value the handler works with.
pub trait Validate {
    type Valid;

    fn validate(self) -> Result<Self::Valid, ValidationError>;
}

fn present_text(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn present_number(value: Option<f64>) -> Option<f64> {
    value.filter(|n| *n != 0.0)
}

impl Validate for CreateTickerRequestBody {
    type Valid = NewTrade;

    fn validate(self) -> Result<NewTrade, ValidationError> {
        let invalid = ValidationError::create_body;

        let user_id = present_text(self.user_id).ok_or_else(invalid)?;
        let stock = self.stock.ok_or_else(invalid)?;
        let trade_id = present_text(stock.trade_id).ok_or_else(invalid)?;
        let ticker = present_text(stock.ticker).ok_or_else(invalid)?;
        let sector = present_text(stock.sector).ok_or_else(invalid)?;
        let count = present_number(stock.count)
            .filter(|n| *n > 0.0)
            .ok_or_else(invalid)?;
        let price = present_number(stock.price)
            .filter(|n| *n > 0.0)
            .ok_or_else(invalid)?;
        let sector = sector.parse::<Sector>().map_err(|_| invalid())?;

        Ok(NewTrade {
            user_id,
            trade_id,
            ticker,
            price,
            count,
            sector,
        })
    }
}

impl Validate for DeleteTickerRequestBody {
    type Valid = TradeKey;

    fn validate(self) -> Result<TradeKey, ValidationError> {
        let user_id = present_text(self.user_id).ok_or_else(ValidationError::request)?;
        let trade_id = present_text(self.trade_id).ok_or_else(ValidationError::request)?;
        Ok(TradeKey { user_id, trade_id })
    }
}

impl Validate for ListStocksRequestBody {
    /// The partition to list.
    type Valid = String;

    fn validate(self) -> Result<String, ValidationError> {
        present_text(self.user_id).ok_or_else(ValidationError::request)
    }
}
