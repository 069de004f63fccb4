//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: `/ping` health check, everything else proxied
//! - Wire up middleware (request ID, tracing)
//! - Assemble forwarder → intercepting transport → network transport
//! - Serve with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::Settings;
use crate::http::forwarder::ProxyForwarder;
use crate::http::request::UuidRequestId;
use crate::lifecycle::shutdown::ShutdownListener;
use crate::transport::{HyperTransport, InterceptingTransport, RoundTrip};

/// Health check path. Never proxied.
pub const PING_PATH: &str = "/ping";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Arc<ProxyForwarder>,
}

/// HTTP server for the forwarder.
pub struct HttpServer {
    router: Router,
    settings: Arc<Settings>,
}

impl HttpServer {
    /// Create a server that talks to the backend over the network.
    pub fn new(settings: Settings) -> Self {
        let transport = HyperTransport::new(settings.upstream_timeout);
        Self::with_transport(settings, transport)
    }

    /// Create a server on top of an arbitrary transport.
    pub fn with_transport<T: RoundTrip>(settings: Settings, transport: T) -> Self {
        let rules = Arc::new(settings.rules.clone());
        let intercepting = InterceptingTransport::new(transport, rules.clone(), settings.max_body_bytes);
        let forwarder = ProxyForwarder::new(settings.backend.clone(), rules, Arc::new(intercepting));

        let state = AppState {
            forwarder: Arc::new(forwarder),
        };
        Self {
            router: build_router(state),
            settings: Arc::new(settings),
        }
    }

    /// The fully layered router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, shutdown: ShutdownListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backend = %self.settings.backend,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.recv())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route(PING_PATH, any(ping_handler))
        .fallback(proxy_handler)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}

async fn ping_handler() -> &'static str {
    "pong"
}

/// Forward everything that isn't the health check.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let client_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    state.forwarder.serve(request, client_addr).await
}
