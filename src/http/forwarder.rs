//! Request forwarding to the single backend.
//!
//! # Responsibilities
//! - Address the outbound request to the backend (scheme, authority, path)
//! - Apply request-header substitutions
//! - Point `Host` at the backend
//! - Hand the request to the intercepting transport and relay the result
//!
//! # Design Decisions
//! - The backend URL is parsed once; a bad URL never reaches this point
//! - One attempt per request; failures become 502 (504 on timeout)
//! - Paths and query strings are forwarded unchanged, only prefixed by
//!   the backend's own base path and query

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::uri::{Authority, Scheme};
use axum::http::{header, HeaderValue, Request, StatusCode, Uri, Version};
use axum::response::{IntoResponse, Response};
use url::Url;

use crate::http::headers::{append_forwarded_for, remove_hop_by_hop_headers};
use crate::http::request::request_id;
use crate::observability::metrics;
use crate::rewrite::RewriteRules;
use crate::transport::RoundTrip;

/// The backend every request is sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendTarget {
    scheme: Scheme,
    authority: Authority,
    base_path: String,
    base_query: Option<String>,
}

impl BackendTarget {
    /// Parse a backend base URL such as `http://api.internal:8080`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let url = Url::parse(raw).map_err(|e| format!("{raw:?} is not a valid URL: {e}"))?;
        if url.scheme() != "http" {
            return Err(format!(
                "unsupported scheme {:?}, only http backends are supported",
                url.scheme()
            ));
        }
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| format!("{raw:?} has no host"))?;
        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let authority = Authority::from_str(&authority)
            .map_err(|e| format!("{authority:?} is not a valid authority: {e}"))?;

        Ok(Self {
            scheme: Scheme::HTTP,
            authority,
            base_path: url.path().to_string(),
            base_query: url.query().filter(|q| !q.is_empty()).map(str::to_string),
        })
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Rewrite an inbound request URI to point at the backend.
    pub fn target_uri(&self, inbound: &Uri) -> Result<Uri, axum::http::Error> {
        let path = join_paths(&self.base_path, inbound.path());
        let base = self.base_query.as_deref().unwrap_or("");
        let query = inbound.query().unwrap_or("");
        let query = if base.is_empty() || query.is_empty() {
            format!("{base}{query}")
        } else {
            format!("{base}&{query}")
        };
        let path_and_query = if query.is_empty() {
            path
        } else {
            format!("{path}?{query}")
        };

        Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
    }
}

impl std::fmt::Display for BackendTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.authority, self.base_path)
    }
}

/// Join two path segments with exactly one slash between them.
fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{base}{}", &path[1..]),
        (false, false) => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}

/// Forwards inbound requests through the configured transport.
pub struct ProxyForwarder {
    backend: BackendTarget,
    rules: Arc<RewriteRules>,
    transport: Arc<dyn RoundTrip>,
}

impl ProxyForwarder {
    pub fn new(backend: BackendTarget, rules: Arc<RewriteRules>, transport: Arc<dyn RoundTrip>) -> Self {
        Self {
            backend,
            rules,
            transport,
        }
    }

    /// Build the outbound request for `request`.
    pub fn prepare(
        &self,
        request: Request<Body>,
        client_addr: Option<SocketAddr>,
    ) -> Result<Request<Body>, axum::http::Error> {
        let (mut parts, body) = request.into_parts();

        parts.uri = self.backend.target_uri(&parts.uri)?;
        // The pooled client speaks HTTP/1.1 to the backend whatever the client used.
        parts.version = Version::HTTP_11;

        self.rules.request.rewrite_headers(&mut parts.headers);
        parts
            .headers
            .insert(header::HOST, HeaderValue::from_str(self.backend.authority.as_str())?);

        remove_hop_by_hop_headers(&mut parts.headers);
        if let Some(addr) = client_addr {
            append_forwarded_for(&mut parts.headers, addr.ip());
        }

        Ok(Request::from_parts(parts, body))
    }

    /// Forward `request` and produce the response for the client.
    pub async fn serve(&self, request: Request<Body>, client_addr: Option<SocketAddr>) -> Response {
        let start = Instant::now();
        let method = request.method().clone();
        let id = request_id(request.headers()).to_string();

        let outbound = match self.prepare(request, client_addr) {
            Ok(outbound) => outbound,
            Err(e) => {
                tracing::error!(request_id = %id, error = %e, "Failed to build upstream request");
                metrics::record_request(method.as_str(), 502, start);
                return StatusCode::BAD_GATEWAY.into_response();
            }
        };

        tracing::debug!(
            request_id = %id,
            method = %method,
            uri = %outbound.uri(),
            "Proxying request"
        );

        match self.transport.round_trip(outbound).await {
            Ok(response) => {
                let (mut parts, body) = response.into_parts();
                remove_hop_by_hop_headers(&mut parts.headers);
                metrics::record_request(method.as_str(), parts.status.as_u16(), start);
                Response::from_parts(parts, body)
            }
            Err(e) => {
                let status = e.status_code();
                tracing::error!(request_id = %id, error = %e, status = status.as_u16(), "Upstream error");
                metrics::record_request(method.as_str(), status.as_u16(), start);
                status.into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::rewrite::SubstitutionTable;
    use futures_util::future::BoxFuture;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Captures the outbound request and answers 200.
    #[derive(Default)]
    struct RecordingUpstream {
        seen: Mutex<Option<Request<()>>>,
    }

    impl RoundTrip for RecordingUpstream {
        fn round_trip(&self, request: Request<Body>) -> BoxFuture<'_, Result<Response<Body>, TransportError>> {
            let (parts, _) = request.into_parts();
            *self.seen.lock().unwrap() = Some(Request::from_parts(parts, ()));
            Box::pin(async {
                Ok(Response::builder()
                    .header("connection", "close")
                    .header("x-upstream", "yes")
                    .body(Body::from("ok"))
                    .unwrap())
            })
        }
    }

    struct TimingOutUpstream;

    impl RoundTrip for TimingOutUpstream {
        fn round_trip(&self, _request: Request<Body>) -> BoxFuture<'_, Result<Response<Body>, TransportError>> {
            Box::pin(async { Err(TransportError::Timeout(Duration::from_secs(3))) })
        }
    }

    fn forwarder(backend: &str, request_pairs: &[(&str, &str)], transport: Arc<dyn RoundTrip>) -> ProxyForwarder {
        let rules = RewriteRules {
            request: SubstitutionTable::from_pairs(request_pairs.iter().copied()),
            ..RewriteRules::default()
        };
        ProxyForwarder::new(BackendTarget::parse(backend).unwrap(), Arc::new(rules), transport)
    }

    #[test]
    fn test_backend_parse() {
        let target = BackendTarget::parse("http://api.internal:3000").unwrap();
        assert_eq!(target.authority().as_str(), "api.internal:3000");
        assert_eq!(target.to_string(), "http://api.internal:3000/");

        let default_port = BackendTarget::parse("http://example.com:80").unwrap();
        assert_eq!(default_port.authority().as_str(), "example.com");
    }

    #[test]
    fn test_backend_parse_rejects() {
        assert!(BackendTarget::parse("not a url").is_err());
        assert!(BackendTarget::parse("https://secure.example.com").is_err());
        assert!(BackendTarget::parse("unix:/var/run/app.sock").is_err());
    }

    #[test]
    fn test_target_uri_keeps_path_and_query() {
        let target = BackendTarget::parse("http://backend:8080").unwrap();
        let uri = target.target_uri(&"/a/b.html?x=1&y=2".parse().unwrap()).unwrap();
        assert_eq!(uri.to_string(), "http://backend:8080/a/b.html?x=1&y=2");
    }

    #[test]
    fn test_target_uri_joins_base_path_and_query() {
        let target = BackendTarget::parse("http://backend/app/?token=t").unwrap();
        let uri = target.target_uri(&"/page?x=1".parse().unwrap()).unwrap();
        assert_eq!(uri.to_string(), "http://backend/app/page?token=t&x=1");

        let uri = target.target_uri(&"/page".parse().unwrap()).unwrap();
        assert_eq!(uri.to_string(), "http://backend/app/page?token=t");
    }

    #[test]
    fn test_join_paths() {
        assert_eq!(join_paths("/", "/x"), "/x");
        assert_eq!(join_paths("/base", "/x"), "/base/x");
        assert_eq!(join_paths("/base/", "/x"), "/base/x");
        assert_eq!(join_paths("/base", "x"), "/base/x");
    }

    #[test]
    fn test_prepare_rewrites_headers_and_host() {
        let fwd = forwarder(
            "http://backend.internal:8080",
            &[("public.example.com", "backend.internal")],
            Arc::new(RecordingUpstream::default()),
        );
        let request = Request::builder()
            .uri("/login?next=/home")
            .header("host", "public.example.com")
            .header("referer", "https://public.example.com/start")
            .header("cookie", "a=1")
            .header("cookie", "b=public.example.com")
            .header("accept", "text/html")
            .header("connection", "keep-alive")
            .body(Body::empty())
            .unwrap();

        let outbound = fwd
            .prepare(request, Some("192.0.2.7:4000".parse().unwrap()))
            .unwrap();

        assert_eq!(outbound.uri().to_string(), "http://backend.internal:8080/login?next=/home");
        assert_eq!(outbound.version(), Version::HTTP_11);
        let headers = outbound.headers();
        assert_eq!(headers["host"], "backend.internal:8080");
        assert_eq!(headers["referer"], "https://backend.internal/start");
        let cookies: Vec<_> = headers.get_all("cookie").iter().collect();
        assert_eq!(cookies, vec!["a=1", "b=backend.internal"]);
        assert_eq!(headers["accept"], "text/html");
        assert!(headers.get("connection").is_none());
        assert_eq!(headers["x-forwarded-for"], "192.0.2.7");
    }

    #[test]
    fn test_prepare_without_rules_leaves_headers() {
        let fwd = forwarder("http://backend", &[], Arc::new(RecordingUpstream::default()));
        let request = Request::builder()
            .uri("/")
            .header("authorization", "Bearer abc")
            .header("x-custom", "value")
            .body(Body::empty())
            .unwrap();

        let outbound = fwd.prepare(request, None).unwrap();
        assert_eq!(outbound.headers()["authorization"], "Bearer abc");
        assert_eq!(outbound.headers()["x-custom"], "value");
        assert_eq!(outbound.headers()["host"], "backend");
        assert!(outbound.headers().get("x-forwarded-for").is_none());
    }

    #[tokio::test]
    async fn test_serve_relays_response() {
        let upstream = Arc::new(RecordingUpstream::default());
        let fwd = forwarder("http://backend:9000", &[], upstream.clone());
        let request = Request::builder().uri("/x").body(Body::empty()).unwrap();

        let response = fwd.serve(request, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-upstream"], "yes");
        assert!(response.headers().get("connection").is_none());

        let seen = upstream.seen.lock().unwrap();
        let seen = seen.as_ref().unwrap();
        assert_eq!(seen.uri().to_string(), "http://backend:9000/x");
    }

    #[tokio::test]
    async fn test_serve_maps_timeout_to_504() {
        let fwd = forwarder("http://backend", &[], Arc::new(TimingOutUpstream));
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let response = fwd.serve(request, None).await;
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
