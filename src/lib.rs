// src/lib.rs
//! Request handling for a stock-portfolio tracker: routes create, delete and
//! list requests onto a per-user keyed trade store and renders a uniform
//! response envelope.

pub mod api;
pub mod config;
pub mod db;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod schema;
pub mod store;
pub mod validation;

pub use dispatcher::{ApiRequest, ApiResponse, Dispatcher, ResponseBody, Route};
pub use error::{HandlerError, StorageError, ValidationError};
pub use models::{Sector, Stock, TradeKey, TradeRecord};
pub use store::{Page, PageCursor, TradeStore};
