//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build one target per configured function (rules + invoker)
//! - Create the Axum router with middleware (request ID, tracing, timeout)
//! - Resolve route and client address, then hand off to `dispatch`
//! - Serve plain TCP or TLS with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::dispatch::{dispatch, DispatchContext, FunctionTarget};
use crate::http::request::{request_span, MakeRequestUuid};
use crate::http::rules::RuleError;
use crate::invoke::{Invoker, LambdaInvoker};
use crate::lifecycle::shutdown;
use crate::net::ClientIpResolver;
use crate::observability::metrics;
use crate::routing::Router as ProxyRouter;

/// How long in-flight requests may drain after a TLS shutdown signal.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Error building the server from configuration.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid header rules for function {function}: {source}")]
    Rules {
        function: String,
        source: RuleError,
    },
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<ProxyRouter<FunctionTarget>>,
    pub client_ip: Arc<ClientIpResolver>,
    pub tls: bool,
    pub max_body_bytes: usize,
}

/// HTTP front end that turns requests into function invocations.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a server with one Lambda client per configured function.
    pub async fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let mut invokers: Vec<Arc<dyn Invoker>> = Vec::with_capacity(config.functions.len());
        for function in &config.functions {
            invokers.push(Arc::new(LambdaInvoker::from_config(function).await));
        }
        Self::build(config, invokers)
    }

    /// Create a server where every function is served by `invoker`.
    pub fn with_invoker(config: ProxyConfig, invoker: Arc<dyn Invoker>) -> Result<Self, ServerError> {
        let invokers = vec![invoker; config.functions.len()];
        Self::build(config, invokers)
    }

    fn build(config: ProxyConfig, invokers: Vec<Arc<dyn Invoker>>) -> Result<Self, ServerError> {
        let targets = config
            .functions
            .iter()
            .zip(invokers)
            .map(|(function, invoker)| {
                FunctionTarget::from_config(function, invoker)
                    .map(|target| (function, target))
                    .map_err(|source| ServerError::Rules {
                        function: function.name.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let state = AppState {
            routes: Arc::new(ProxyRouter::from_routes(targets)),
            client_ip: Arc::new(ClientIpResolver::from_config(&config.client_ip)),
            tls: config.listener.tls.is_some(),
            max_body_bytes: config.limits.max_body_bytes,
        };

        for target in state.routes.targets() {
            tracing::info!(
                function = %target.name,
                header_up = !target.header_up.is_empty(),
                header_down = !target.header_down.is_empty(),
                "Function route registered"
            );
        }

        let router = Self::build_router(&config, state);
        Ok(Self { router })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(lambda_handler))
            .route("/{*path}", any(lambda_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| request_span(request)))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The configured router, for embedding or in-process testing.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serve plain HTTP on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS on `addr` until `shutdown` fires.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, "HTTPS server starting");

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            shutdown::wait(shutdown).await;
            drain.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(app)
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Route the request to a function and dispatch it.
async fn lambda_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let (parts, body) = request.into_parts();

    let Some(target) = state.routes.match_request(&parts) else {
        tracing::warn!(path = %parts.uri.path(), "No function route matched");
        metrics::record_request(&method, 404, "none", start_time);
        return (StatusCode::NOT_FOUND, "No matching function").into_response();
    };

    let client_addr = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(peer)| state.client_ip.resolve(*peer, &parts.headers))
        .unwrap_or_default();

    let ctx = DispatchContext {
        client_addr,
        tls: state.tls,
        max_body_bytes: state.max_body_bytes,
    };

    let response = match dispatch(Request::from_parts(parts, body), &ctx, target).await {
        Ok(response) => response,
        Err(e) => {
            let status = e.status();
            if status.is_server_error() {
                tracing::error!(function = %target.name, status = %status, error = %e, "Dispatch failed");
            } else {
                tracing::warn!(function = %target.name, status = %status, error = %e, "Rejected request");
            }
            e.into_response()
        }
    };

    metrics::record_request(&method, response.status().as_u16(), &target.name, start_time);
    response
}
