//! Pluggable content handlers.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     HandlerPlugins (explicit list)
//!     → plugin.keys() + plugin.handler(owner)
//!     → HandlerRegistry (MIME type → handler, scheme → handler)
//!
//! Per request:
//!     Router → registry lookup → handler.load(resource, exchange)
//!         → Handled: the handler now owns the exchange and closes it
//!         → Declined(exchange): router falls back (static file / 403)
//! ```
//!
//! # Design Decisions
//! - Registry is built once and never mutated, so lookups take no locks
//! - Ownership of the exchange moves into the handler; a declined request
//!   hands it back, which makes double handling unrepresentable

pub mod registry;
pub mod remote;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use url::Url;

use crate::component::ScriptEngine;
use crate::config::ServerConfig;
use crate::execution::ComponentPlugin;
use crate::http::{Reply, Request};
use crate::routing::RouterHandle;

pub use registry::HandlerRegistry;
pub use remote::{HttpForwarder, HttpForwarderPlugin};

/// One in-flight HTTP transaction as it moves through the pipeline.
#[derive(Debug)]
pub struct Exchange {
    pub request: Arc<Request>,
    pub reply: Reply,
    /// Context for the next component, e.g. the URL an error document
    /// is rendered for.
    pub message: Option<String>,
    /// Number of error documents already entered for this request.
    pub(crate) error_depth: u8,
}

impl Exchange {
    pub fn new(request: Request, reply: Reply) -> Self {
        Self {
            request: Arc::new(request),
            reply,
            message: None,
            error_depth: 0,
        }
    }
}

/// Result of offering an exchange to a handler.
#[derive(Debug)]
pub enum HandlerOutcome {
    Handled,
    Declined(Exchange),
}

/// A resolved local resource offered to a mime handler.
#[derive(Debug, Clone)]
pub struct Resource {
    path: PathBuf,
    url: Url,
    mime: String,
}

impl Resource {
    /// `None` when `path` cannot be expressed as a `file://` URL.
    pub fn new(path: PathBuf, mime: impl Into<String>) -> Option<Self> {
        let url = Url::from_file_path(&path).ok()?;
        Some(Self {
            path,
            url,
            mime: mime.into(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
    }
}

/// Answers requests for files of the MIME types it was registered under.
pub trait MimeHandler: Send + Sync {
    fn load(&self, resource: &Resource, exchange: Exchange) -> HandlerOutcome;
}

/// Answers requests whose document root lives behind a URL scheme.
pub trait ProtocolHandler: Send + Sync {
    fn load(&self, url: &Url, exchange: Exchange) -> HandlerOutcome;
}

/// Error creating a handler instance from a plugin.
#[derive(Debug, thiserror::Error)]
#[error("handler plugin {plugin}: {reason}")]
pub struct HandlerError {
    pub plugin: String,
    pub reason: String,
}

/// Factory registered at startup for one or more MIME types.
pub trait MimeHandlerPlugin: Send + Sync {
    fn name(&self) -> &str;
    fn keys(&self) -> Vec<String>;
    fn handler(&self, owner: RouterHandle) -> Result<Arc<dyn MimeHandler>, HandlerError>;
}

/// Factory registered at startup for one or more URL schemes.
pub trait ProtocolHandlerPlugin: Send + Sync {
    fn name(&self) -> &str;
    fn keys(&self) -> Vec<String>;
    fn handler(&self, owner: RouterHandle) -> Result<Arc<dyn ProtocolHandler>, HandlerError>;
}

/// The handler factories a server is started with.
#[derive(Default)]
pub struct HandlerPlugins {
    pub(crate) mime: Vec<Box<dyn MimeHandlerPlugin>>,
    pub(crate) protocol: Vec<Box<dyn ProtocolHandlerPlugin>>,
}

impl HandlerPlugins {
    pub fn new() -> Self {
        Self::default()
    }

    /// Component execution through `engine`, plus the `http://` forwarder.
    pub fn standard(config: &ServerConfig, engine: Arc<dyn ScriptEngine>) -> Self {
        Self::new()
            .with_mime(ComponentPlugin::new(engine, &config.components))
            .with_protocol(HttpForwarderPlugin::new(config))
    }

    pub fn with_mime(mut self, plugin: impl MimeHandlerPlugin + 'static) -> Self {
        self.mime.push(Box::new(plugin));
        self
    }

    pub fn with_protocol(mut self, plugin: impl ProtocolHandlerPlugin + 'static) -> Self {
        self.protocol.push(Box::new(plugin));
        self
    }
}
