//! Component server library.
//!
//! Resolves requests against per-host document roots and serves them as
//! static files, executed components or forwarded upstream requests.

pub mod component;
pub mod config;
pub mod error;
pub mod execution;
pub mod handlers;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::ServerConfig;
pub use error::PipelineError;
pub use handlers::HandlerPlugins;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::Router;
