// src/handlers.rs
use crate::error::{HandlerError, ValidationError};
use crate::models::{
    CreateTickerRequestBody, DeleteTickerRequestBody, ListStocksRequestBody, Stock, TradeRecord,
};
use crate::store::{pages, TradeStore};
use crate::validation::Validate;
use futures_util::TryStreamExt;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Reads a request body; a field of the wrong JSON type fails the same way an
/// absent one does.
fn parse_body<T: DeserializeOwned>(
    payload: Value,
    invalid: fn() -> ValidationError,
) -> Result<T, ValidationError> {
    serde_json::from_value(payload).map_err(|e| {
        debug!("Request body did not match expected shape: {}", e);
        invalid()
    })
}

pub async fn create_trade<S>(store: &S, payload: Value) -> Result<(), HandlerError>
where
    S: TradeStore + ?Sized,
{
    let body: CreateTickerRequestBody = parse_body(payload, ValidationError::create_body)?;
    let trade = body.validate()?;
    let record = TradeRecord::from_new_trade(trade);

    store.put(&record).await?;
    info!(
        "Created trade {} ({}) for user {}",
        record.trade_id, record.ticker, record.user_id
    );
    Ok(())
}

pub async fn delete_trade<S>(store: &S, payload: Value) -> Result<(), HandlerError>
where
    S: TradeStore + ?Sized,
{
    let body: DeleteTickerRequestBody = parse_body(payload, ValidationError::request)?;
    let key = body.validate()?;

    store.delete(&key).await?;
    info!("Deleted trade {} for user {}", key.trade_id, key.user_id);
    Ok(())
}

/// Lists every trade of a user, fetching all pages before returning. Items
/// keep the store's order.
pub async fn list_trades<S>(
    store: &S,
    payload: Value,
    page_size: usize,
) -> Result<Vec<Stock>, HandlerError>
where
    S: TradeStore + ?Sized,
{
    let body: ListStocksRequestBody = parse_body(payload, ValidationError::request)?;
    let user_id = body.validate()?;

    let records: Vec<TradeRecord> = pages(store, &user_id, page_size).try_concat().await?;
    info!("Listed {} trades for user {}", records.len(), user_id);

    Ok(records.into_iter().map(TradeRecord::into_stock).collect())
}
