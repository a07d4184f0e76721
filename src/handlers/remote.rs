//! Protocol handler forwarding requests to `http://` document roots.
//!
//! The inbound method, headers and body are replayed against the rewritten
//! URL; the upstream status, headers and body become the reply. Upstream
//! `Set-Cookie` headers are forwarded verbatim.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, HeaderName, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use url::Url;

use crate::config::ServerConfig;
use crate::error::PipelineError;
use crate::handlers::{
    Exchange, HandlerError, HandlerOutcome, ProtocolHandler, ProtocolHandlerPlugin,
};
use crate::http::Request;
use crate::routing::RouterHandle;

/// Headers that describe one connection and are not forwarded.
static HOP_BY_HOP: [HeaderName; 9] = [
    header::CONNECTION,
    header::HOST,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::PROXY_AUTHORIZATION,
    header::PROXY_AUTHENTICATE,
    header::CONTENT_LENGTH,
];

pub struct HttpForwarderPlugin {
    enabled: bool,
    timeout: Duration,
    max_body_bytes: usize,
}

impl HttpForwarderPlugin {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            enabled: config.remote.enabled,
            timeout: Duration::from_secs(config.components.pending_timeout_secs),
            max_body_bytes: config.remote.max_body_bytes,
        }
    }
}

impl ProtocolHandlerPlugin for HttpForwarderPlugin {
    fn name(&self) -> &str {
        "http-forwarder"
    }

    // No TLS connector in the stack, so only plain http.
    fn keys(&self) -> Vec<String> {
        vec!["http".into()]
    }

    fn handler(&self, owner: RouterHandle) -> Result<Arc<dyn ProtocolHandler>, HandlerError> {
        if !self.enabled {
            return Err(HandlerError {
                plugin: self.name().to_string(),
                reason: "remote document roots are disabled".into(),
            });
        }
        Ok(Arc::new(HttpForwarder {
            owner,
            client: Client::builder(TokioExecutor::new()).build(HttpConnector::new()),
            timeout: self.timeout,
            max_body_bytes: self.max_body_bytes,
        }))
    }
}

pub struct HttpForwarder {
    owner: RouterHandle,
    client: Client<HttpConnector, Body>,
    timeout: Duration,
    max_body_bytes: usize,
}

impl ProtocolHandler for HttpForwarder {
    fn load(&self, url: &Url, exchange: Exchange) -> HandlerOutcome {
        if url.scheme() != "http" {
            return HandlerOutcome::Declined(exchange);
        }

        let upstream = Upstream {
            owner: self.owner.clone(),
            client: self.client.clone(),
            timeout: self.timeout,
            max_body_bytes: self.max_body_bytes,
        };
        let url = url.clone();
        tokio::spawn(async move {
            upstream.forward(url, exchange).await;
        });
        HandlerOutcome::Handled
    }
}

struct Upstream {
    owner: RouterHandle,
    client: Client<HttpConnector, Body>,
    timeout: Duration,
    max_body_bytes: usize,
}

impl Upstream {
    async fn forward(self, url: Url, mut exchange: Exchange) {
        let request = Arc::clone(&exchange.request);
        tracing::debug!(url = %url, method = %request.method(), "Forwarding to upstream");

        let upstream_request = match build_request(&url, &request) {
            Ok(req) => req,
            Err(e) => return self.owner.error(PipelineError::Upstream(format!("{url}: {e}")), exchange),
        };

        let fetch = async {
            let response: hyper::Response<hyper::body::Incoming> = self
                .client
                .request(upstream_request)
                .await
                .map_err(|e| e.to_string())?;
            let (parts, body) = response.into_parts();
            let bytes = to_bytes(Body::new(body), self.max_body_bytes)
                .await
                .map_err(|e| e.to_string())?;
            Ok::<_, String>((parts, bytes))
        };

        let (parts, bytes) = match tokio::time::timeout(self.timeout, fetch).await {
            Ok(Ok(fetched)) => fetched,
            Ok(Err(e)) => {
                tracing::warn!(url = %url, error = %e, "Upstream request failed");
                return self.owner.error(PipelineError::Upstream(format!("{url}: {e}")), exchange);
            }
            Err(_) => {
                tracing::warn!(url = %url, "Upstream request timed out");
                return self.owner.error(PipelineError::Timeout(url.to_string()), exchange);
            }
        };

        // Set-Cookie values pass through untouched, attributes and all.
        let reply = &mut exchange.reply;
        reply.set_status(parts.status);
        for (name, value) in &parts.headers {
            if !HOP_BY_HOP.contains(name) {
                reply.append_header(name.clone(), value.clone());
            }
        }

        if let Err(e) = reply.write(&bytes).and_then(|_| reply.close()) {
            tracing::warn!(url = %url, error = %e, "Upstream reply already closed");
        }
    }
}

fn build_request(url: &Url, request: &Request) -> Result<axum::http::Request<Body>, axum::http::Error> {
    let uri: Uri = url.as_str().parse()?;
    let mut builder = axum::http::Request::builder()
        .method(request.method().clone())
        .uri(uri);
    if let Some(headers) = builder.headers_mut() {
        copy_end_to_end(request.headers(), headers);
    }
    builder.body(Body::from(request.body().clone()))
}

fn copy_end_to_end(from: &HeaderMap, to: &mut HeaderMap) {
    for (name, value) in from {
        if !HOP_BY_HOP.contains(name) {
            to.append(name.clone(), value.clone());
        }
    }
}
