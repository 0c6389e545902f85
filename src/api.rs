// src/api.rs
use crate::dispatcher::{ApiRequest, ApiResponse, Dispatcher, DEFAULT_HEADERS, INVALID_ARGUMENTS};
use bytes::Bytes;
use log::warn;
use std::convert::Infallible;
use warp::http::header::{HeaderName, HeaderValue};
use warp::http::StatusCode;
use warp::path::FullPath;
use warp::{Filter, Rejection, Reply};

const MAX_BODY_BYTES: u64 = 16 * 1024;

/// Extra headers answering a CORS preflight.
const PREFLIGHT_HEADERS: [(&str, &str); 2] = [
    ("Access-Control-Allow-Methods", "POST, OPTIONS"),
    ("Access-Control-Allow-Headers", "Content-Type"),
];

/// Every POST is forwarded to the dispatcher, which decides whether the path
/// names a known route. Anything warp refuses on its own (oversized body,
/// missing length, other methods) still gets the error envelope.
pub fn routes(
    dispatcher: Dispatcher,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    let dispatch = warp::post()
        .and(warp::path::full())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::bytes())
        .and(with_dispatcher(dispatcher))
        .and_then(dispatch_handler);

    let preflight = warp::options().map(preflight_reply);

    dispatch.or(preflight).recover(handle_rejection)
}

fn with_dispatcher(
    dispatcher: Dispatcher,
) -> impl Filter<Extract = (Dispatcher,), Error = Infallible> + Clone {
    warp::any().map(move || dispatcher.clone())
}

fn into_request(path: &FullPath, body: Bytes) -> ApiRequest {
    let body = match String::from_utf8(body.to_vec()) {
        Ok(text) => Some(text),
        Err(e) => {
            warn!("Discarding non UTF-8 request body: {}", e);
            None
        }
    };
    ApiRequest {
        route: Some(path.as_str().to_string()),
        body,
    }
}

fn insert_headers<'a>(
    reply: &mut warp::reply::Response,
    headers: impl IntoIterator<Item = (&'a str, &'a str)>,
) {
    for (name, value) in headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            reply.headers_mut().insert(name, value);
        }
    }
}

fn into_reply(response: ApiResponse) -> warp::reply::Response {
    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut reply = warp::reply::with_status(warp::reply::json(&response.body), status)
        .into_response();
    insert_headers(
        &mut reply,
        response
            .headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str())),
    );
    reply
}

fn preflight_reply() -> warp::reply::Response {
    let mut reply = warp::reply().into_response();
    insert_headers(&mut reply, DEFAULT_HEADERS);
    insert_headers(&mut reply, PREFLIGHT_HEADERS);
    reply
}

async fn handle_rejection(err: Rejection) -> Result<warp::reply::Response, Infallible> {
    warn!("Request rejected before dispatch: {:?}", err);
    Ok(into_reply(ApiResponse::error(INVALID_ARGUMENTS)))
}

async fn dispatch_handler(
    path: FullPath,
    body: Bytes,
    dispatcher: Dispatcher,
) -> Result<impl Reply, Rejection> {
    let response = dispatcher.handle(into_request(&path, body)).await;
    Ok(into_reply(response))
}
