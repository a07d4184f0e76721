//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, record config directory)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!
//! On file change (--watch):
//!     watcher.rs detects change in the file's directory
//!     → loader.rs loads new config
//!     → validation.rs validates (rejections logged per field)
//!     → pushed only if it differs from the last config
//!     → HttpServer swaps in the new document root table
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; only document roots are hot-reloaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ComponentsConfig, ErrorsConfig, ListenerConfig, ObservabilityConfig, RemoteConfig,
    SecurityConfig, ServerConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
pub use watcher::ConfigWatcher;
