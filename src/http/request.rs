//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4) for requests that lack one
//! - Buffer the inbound request so it can be replayed across retries
//! - Prepare request for forwarding to a backend
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Hop-by-hop headers stripped once, at capture time
//! - The captured request is immutable; each forward builds a fresh copy

use axum::body::{Body, Bytes};
use axum::http::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    request::Parts,
    Method, Request, Uri,
};
use std::net::SocketAddr;
use tower_http::request_id::{MakeRequestId, RequestId};
use url::Url;
use uuid::Uuid;

use crate::http::response::strip_hop_by_hop;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Header listing the client addresses a request passed through.
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Generates `x-request-id` values for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// A fully buffered client request that can be forwarded any number of times.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
}

impl ProxyRequest {
    /// Capture an inbound request.
    ///
    /// Hop-by-hop headers are removed and the client IP, when known, is
    /// appended to `X-Forwarded-For`.
    pub fn from_parts(parts: Parts, body: Bytes, client: Option<SocketAddr>) -> Self {
        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);

        if let Some(addr) = client {
            let forwarded = match headers.get(&X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
                Some(prior) => format!("{}, {}", prior, addr.ip()),
                None => addr.ip().to_string(),
            };
            if let Ok(value) = HeaderValue::from_str(&forwarded) {
                headers.insert(X_FORWARDED_FOR, value);
            }
        }

        Self {
            method: parts.method,
            uri: parts.uri,
            headers,
            body,
        }
    }

    /// Minimal request with an empty body, used where no client is involved.
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Path used in log lines.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// The URI this request maps to on the given backend.
    ///
    /// The backend's own path, if any, is joined in front of the request path.
    pub fn upstream_uri(&self, target: &Url) -> Result<Uri, axum::http::Error> {
        let base = target.as_str().trim_end_matches('/');
        let path_and_query = self
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let path_and_query = if path_and_query.starts_with('/') {
            path_and_query.to_string()
        } else {
            format!("/{}", path_and_query)
        };

        Ok(Uri::try_from(format!("{}{}", base, path_and_query))?)
    }

    /// Build the outgoing request for one forward to `target`.
    pub fn to_upstream(&self, target: &Url) -> Result<Request<Body>, axum::http::Error> {
        let mut builder = Request::builder()
            .method(self.method.clone())
            .uri(self.upstream_uri(target)?);

        if let Some(headers) = builder.headers_mut() {
            headers.extend(self.headers.iter().map(|(k, v)| (k.clone(), v.clone())));
            if !headers.contains_key(header::HOST) {
                if let Some(authority) = self.uri.authority() {
                    if let Ok(value) = HeaderValue::from_str(authority.as_str()) {
                        headers.insert(header::HOST, value);
                    }
                }
            }
        }

        builder.body(Body::from(self.body.clone()))
    }
}
