// src/dispatcher.rs
//! Routes an inbound request to its operation handler and renders every
//! outcome as a response envelope.
//!
//! Only two error messages ever leave the dispatcher: requests that cannot be
//! routed get [`INVALID_ARGUMENTS`], and any failure raised while handling a
//! routed request gets [`UNKNOWN_ERROR`]. The underlying detail is logged.

use crate::handlers::{create_trade, delete_trade, list_trades};
use crate::models::Stock;
use crate::store::{TradeStore, DEFAULT_PAGE_SIZE};
use log::{error, info};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const INVALID_ARGUMENTS: &str = "Invalid Arguments Provided";
pub const UNKNOWN_ERROR: &str = "Unknown Error Occurred";
pub const SUCCESS: &str = "SUCCESS";

pub const STATUS_OK: u16 = 200;
pub const STATUS_ERROR: u16 = 500;

/// Headers carried by every response.
pub const DEFAULT_HEADERS: [(&str, &str); 1] = [("Access-Control-Allow-Origin", "*")];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Create,
    Delete,
    List,
}

impl Route {
    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            "/stock/create" => Some(Route::Create),
            "/stock/delete" => Some(Route::Delete),
            "/stock/list" => Some(Route::List),
            _ => None,
        }
    }
}

/// Transport-independent inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiRequest {
    pub route: Option<String>,
    pub body: Option<String>,
}

impl ApiRequest {
    pub fn new(route: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            route: Some(route.into()),
            body: Some(body.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Message { message: String },
    Items { items: Vec<Stock> },
}

impl ResponseBody {
    pub fn message(message: &str) -> Self {
        ResponseBody::Message {
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: ResponseBody,
}

impl ApiResponse {
    fn with_body(status_code: u16, body: ResponseBody) -> Self {
        Self {
            status_code,
            headers: DEFAULT_HEADERS
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            body,
        }
    }

    pub fn ok(body: ResponseBody) -> Self {
        Self::with_body(STATUS_OK, body)
    }

    pub fn success() -> Self {
        Self::ok(ResponseBody::message(SUCCESS))
    }

    pub fn error(message: &str) -> Self {
        Self::with_body(STATUS_ERROR, ResponseBody::message(message))
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn TradeStore>,
    page_size: usize,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn TradeStore>) -> Self {
        Self::with_page_size(store, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(store: Arc<dyn TradeStore>, page_size: usize) -> Self {
        Self { store, page_size }
    }

    pub async fn handle(&self, request: ApiRequest) -> ApiResponse {
        info!(
            "Received request: route={:?}, body_len={}",
            request.route,
            request.body.as_ref().map_or(0, |b| b.len())
        );

        let (route, payload) = match parse_request(&request) {
            Some(parsed) => parsed,
            None => {
                error!("Request route and body should be present and well formed.");
                return ApiResponse::error(INVALID_ARGUMENTS);
            }
        };
        let route = match Route::from_path(route) {
            Some(route) => route,
            None => {
                error!("Unrecognized route: {}", route);
                return ApiResponse::error(INVALID_ARGUMENTS);
            }
        };
        info!("Dispatching to {:?}", route);

        let store = self.store.as_ref();
        let outcome = match route {
            Route::Create => create_trade(store, payload)
                .await
                .map(|_| ResponseBody::message(SUCCESS)),
            Route::Delete => delete_trade(store, payload)
                .await
                .map(|_| ResponseBody::message(SUCCESS)),
            Route::List => list_trades(store, payload, self.page_size)
                .await
                .map(|items| ResponseBody::Items { items }),
        };

        match outcome {
            Ok(body) => {
                info!("Successfully handled {:?}", route);
                ApiResponse::ok(body)
            }
            Err(e) => {
                error!("Failed to handle {:?}: {}", route, e);
                ApiResponse::error(UNKNOWN_ERROR)
            }
        }
    }
}

/// Splits out a non-empty route and a body that is a JSON object.
fn parse_request(request: &ApiRequest) -> Option<(&str, Value)> {
    let route = request.route.as_deref().filter(|r| !r.is_empty())?;
    let body = request.body.as_deref().filter(|b| !b.trim().is_empty())?;
    match serde_json::from_str::<Value>(body) {
        Ok(payload) if payload.is_object() => Some((route, payload)),
        Ok(_) => None,
        Err(e) => {
            error!("Request body is not valid JSON: {}", e);
            None
        }
    }
}
