//! Request forwarding to a selected backend.
//!
//! # Responsibilities
//! - Rewrite the request target to the backend's scheme and authority
//! - Drop hop-by-hop headers in both directions
//! - Stream the upstream response back without buffering

use std::time::Duration;

use axum::body::Body;
use axum::http::uri::{Parts, PathAndQuery, Scheme};
use axum::http::{HeaderMap, Request, Response, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::balance::backend::Backend;

/// Shared egress client.
pub type HttpClient = Client<HttpConnector, Body>;

/// Build the egress client with a bounded connect timeout.
pub fn build_client(connect_timeout: Duration) -> HttpClient {
    let mut connector = HttpConnector::new();
    connector.set_connect_timeout(Some(connect_timeout));
    Client::builder(TokioExecutor::new()).build(connector)
}

/// Headers consumed by each hop, never retransmitted.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

/// Failure while proxying to a backend.
#[derive(Debug)]
pub enum ForwardError {
    InvalidTarget(axum::http::uri::InvalidUriParts),
    Upstream(hyper_util::client::legacy::Error),
}

impl std::fmt::Display for ForwardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForwardError::InvalidTarget(e) => write!(f, "invalid forwarding target: {}", e),
            ForwardError::Upstream(e) => write!(f, "upstream request failed: {}", e),
        }
    }
}

impl std::error::Error for ForwardError {}

/// Forward `request` to `backend`, streaming the upstream response back.
///
/// Method, path, query, remaining headers, and body pass through unchanged;
/// only scheme and authority are rewritten to the backend URL.
pub async fn forward(
    client: &HttpClient,
    backend: &Backend,
    mut request: Request<Body>,
) -> Result<Response<Body>, ForwardError> {
    strip_hop_by_hop(request.headers_mut());

    let mut parts = Parts::default();
    parts.scheme = Some(backend.url().scheme().cloned().unwrap_or(Scheme::HTTP));
    parts.authority = backend.url().authority().cloned();
    parts.path_and_query = request
        .uri()
        .path_and_query()
        .cloned()
        .or_else(|| Some(PathAndQuery::from_static("/")));
    let target = Uri::from_parts(parts).map_err(ForwardError::InvalidTarget)?;
    *request.uri_mut() = target;

    let response = client
        .request(request)
        .await
        .map_err(ForwardError::Upstream)?;

    let (mut head, body) = response.into_parts();
    strip_hop_by_hop(&mut head.headers);
    Ok(Response::from_parts(head, Body::new(body)))
}
