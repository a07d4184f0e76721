//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum app forwarding every request to the component router
//! - Wire up middleware (tracing, request ID, timeout, body limit, headers)
//! - Bind server to listener, shut down gracefully
//! - Apply document root changes from config reloads

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::handlers::HandlerPlugins;
use crate::http::{Reply, Request};
use crate::observability::metrics;
use crate::routing::{DocumentRootTable, RootError, Router};

const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<Router>,
    pub max_body_size: usize,
}

/// HTTP front end of the component router.
pub struct HttpServer {
    app: axum::Router,
    router: Arc<Router>,
    config: ServerConfig,
}

impl HttpServer {
    /// Build the router and its handlers from `config`.
    pub fn new(config: ServerConfig, plugins: HandlerPlugins) -> Result<Self, RootError> {
        let router = Router::new(&config, plugins)?;
        let state = AppState {
            router: Arc::clone(&router),
            max_body_size: config.security.max_body_size,
        };
        let app = Self::build_app(&config, state);
        Ok(Self { app, router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_app(config: &ServerConfig, state: AppState) -> axum::Router {
        let mut app = axum::Router::new()
            .route("/", any(dispatch_handler))
            .route("/{*path}", any(dispatch_handler))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::SERVER,
                HeaderValue::from_static(concat!("component-server/", env!("CARGO_PKG_VERSION"))),
            ));
        if config.security.enable_headers {
            app = app.layer(SetResponseHeaderLayer::if_not_present(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ));
        }
        app.layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ServerConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        let registry = self.router.registry();
        tracing::info!(
            address = %addr,
            roots = self.router.document_roots().len(),
            mime_types = ?registry.mime_types().collect::<Vec<_>>(),
            schemes = ?registry.schemes().collect::<Vec<_>>(),
            "HTTP server starting"
        );

        let router = Arc::clone(&self.router);
        let current = self.config.clone();
        tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                apply_reload(&router, &current, &config);
            }
        });

        axum::serve(listener, self.app.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn apply_reload(router: &Router, current: &ServerConfig, new: &ServerConfig) {
    match DocumentRootTable::from_config(&new.contents, &new.base_dir) {
        Ok(table) => {
            if !router.set_document_roots(table) {
                tracing::debug!("Config reloaded, document roots unchanged");
            }
        }
        Err(e) => tracing::error!(error = %e, "Reloaded document roots rejected"),
    }

    let restart_only = current.listener != new.listener
        || current.components != new.components
        || current.errors != new.errors
        || current.remote != new.remote
        || current.timeouts != new.timeouts
        || current.security != new.security
        || current.mime != new.mime;
    if restart_only {
        tracing::warn!("Only document roots are reloaded; other changes need a restart");
    }
}

/// Hand the request to the router and wait for its reply to close.
async fn dispatch_handler(State(state): State<AppState>, request: axum::extract::Request) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let (parts, body) = request.into_parts();

    let body = match to_bytes(body, state.max_body_size).await {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!(error = %e, "Request body rejected");
            metrics::record_request(&method, 413, start);
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let request = match Request::from_parts(&parts, body) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(error = %e, "Request target rejected");
            metrics::record_request(&method, 400, start);
            return (StatusCode::BAD_REQUEST, "Invalid request target").into_response();
        }
    };

    let (reply, rx) = Reply::channel();
    let router = Arc::clone(&state.router);
    tokio::spawn(async move {
        router.dispatch(request, reply).await;
    });

    let response = rx.recv().await;
    tracing::debug!(method = %method, status = response.status().as_u16(), "Request answered");
    metrics::record_request(&method, response.status().as_u16(), start);
    response.map(Body::from)
}
