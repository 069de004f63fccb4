//! Response interception and rewriting.
//!
//! # Responsibilities
//! - Delegate the round-trip to the wrapped transport
//! - Pass excluded extensions through untouched (streamed)
//! - Decode gzip, buffer the body, apply the response table
//! - Rewrite response headers and recompute `Content-Length`
//!
//! # Design Decisions
//! - The whole body is buffered: a pattern may straddle chunk boundaries
//! - Rewritten bodies are sent uncompressed
//! - Gzip decoding runs on the blocking pool
//! - Any failure after the upstream answered aborts this request only

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderValue, Method, Request, Response, StatusCode};
use futures_util::future::BoxFuture;
use futures_util::StreamExt;

use crate::error::TransportError;
use crate::observability::metrics;
use crate::rewrite::RewriteRules;
use crate::transport::decode::{gunzip, BodyEncoding};
use crate::transport::RoundTrip;

/// Wraps a transport and rewrites every response it returns.
pub struct InterceptingTransport<T> {
    inner: T,
    rules: Arc<RewriteRules>,
    max_body_bytes: Option<usize>,
}

impl<T: RoundTrip> InterceptingTransport<T> {
    pub fn new(inner: T, rules: Arc<RewriteRules>, max_body_bytes: Option<usize>) -> Self {
        Self {
            inner,
            rules,
            max_body_bytes,
        }
    }

    async fn intercept(&self, request: Request<Body>) -> Result<Response<Body>, TransportError> {
        let method = request.method().clone();
        let uri = request.uri().clone();

        let response = self.inner.round_trip(request).await?;

        tracing::info!(
            method = %method,
            uri = %uri,
            status = response.status().as_u16(),
            "Request forwarded"
        );

        if self.rules.excluded.is_excluded(uri.path()) {
            tracing::debug!(path = %uri.path(), "Excluded extension, passing body through");
            metrics::record_bypass();
            return Ok(response);
        }

        let (mut parts, body) = response.into_parts();

        if !carries_body(&method, parts.status) {
            self.rules.response.rewrite_headers(&mut parts.headers);
            return Ok(Response::from_parts(parts, body));
        }

        let encoding = BodyEncoding::from_headers(&parts.headers);
        let raw = self.buffer(body).await?;
        let decoded = match encoding {
            BodyEncoding::Gzip => {
                parts.headers.remove(header::CONTENT_ENCODING);
                let limit = self.max_body_bytes;
                tokio::task::spawn_blocking(move || gunzip(&raw, limit))
                    .await
                    .map_err(|e| TransportError::Decode(std::io::Error::other(e)))??
            }
            BodyEncoding::Raw => raw,
        };

        let rewritten = self.rules.response.apply(&decoded);
        self.rules.response.rewrite_headers(&mut parts.headers);

        tracing::debug!(
            original_bytes = decoded.len(),
            rewritten_bytes = rewritten.len(),
            gzip = encoding == BodyEncoding::Gzip,
            "Response body rewritten"
        );
        metrics::record_rewrite(rewritten.len());

        parts.headers.remove(header::TRANSFER_ENCODING);
        parts
            .headers
            .insert(header::CONTENT_LENGTH, HeaderValue::from(rewritten.len()));

        Ok(Response::from_parts(parts, Body::from(rewritten)))
    }

    /// Collect the whole body, honoring the configured size cap.
    async fn buffer(&self, body: Body) -> Result<Vec<u8>, TransportError> {
        let mut stream = body.into_data_stream();
        let mut buf = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(TransportError::Body)?;
            if let Some(limit) = self.max_body_bytes {
                if buf.len() + chunk.len() > limit {
                    return Err(TransportError::BodyTooLarge { limit });
                }
            }
            buf.extend_from_slice(&chunk);
        }
        Ok(buf)
    }
}

impl<T: RoundTrip> RoundTrip for InterceptingTransport<T> {
    fn round_trip(&self, request: Request<Body>) -> BoxFuture<'_, Result<Response<Body>, TransportError>> {
        Box::pin(self.intercept(request))
    }
}

/// Responses to HEAD and 1xx/204/304 never have a body to rewrite.
fn carries_body(method: &Method, status: StatusCode) -> bool {
    !(method == Method::HEAD
        || status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED)
}
