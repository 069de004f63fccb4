//! Upstream transport subsystem.
//!
//! # Data Flow
//! ```text
//! ProxyForwarder
//!     → InterceptingTransport (intercept.rs)
//!         → HyperTransport (network round-trip)
//!         ← response
//!     ← decode, buffer, rewrite, reframe (decode.rs, intercept.rs)
//! ```
//!
//! # Design Decisions
//! - `RoundTrip` is the seam: the interceptor wraps any implementation,
//!   which keeps the rewriting pipeline testable without a socket
//! - One attempt per request, no retries

pub mod decode;
pub mod intercept;

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use futures_util::future::BoxFuture;
use hyper::body::Incoming;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

use crate::error::TransportError;

pub use intercept::InterceptingTransport;

/// Performs one request/response exchange with the backend.
pub trait RoundTrip: Send + Sync + 'static {
    fn round_trip(&self, request: Request<Body>) -> BoxFuture<'_, Result<Response<Body>, TransportError>>;
}

/// Network transport backed by the pooled hyper client.
#[derive(Clone)]
pub struct HyperTransport {
    client: Client<HttpConnector, Body>,
    timeout: Option<Duration>,
}

impl HyperTransport {
    /// Create a transport. `timeout` bounds the wait for response headers.
    pub fn new(timeout: Option<Duration>) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client, timeout }
    }
}

impl RoundTrip for HyperTransport {
    fn round_trip(&self, request: Request<Body>) -> BoxFuture<'_, Result<Response<Body>, TransportError>> {
        Box::pin(async move {
            let pending = self.client.request(request);
            let response: Response<Incoming> = match self.timeout {
                Some(limit) => tokio::time::timeout(limit, pending)
                    .await
                    .map_err(|_| TransportError::Timeout(limit))??,
                None => pending.await?,
            };
            Ok(response.map(Body::new))
        })
    }
}
