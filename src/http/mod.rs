//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, body limit, request id, timeout)
//!     → request.rs (absolute URL, parsed cookies)
//!     → Router::dispatch (routing layer)
//!     → reply.rs (status, headers, cookies, body, closed once)
//!     → Send to client
//! ```

pub mod cookie;
pub mod reply;
pub mod request;
pub mod server;

pub use cookie::Cookie;
pub use reply::{Reply, ReplyError, ReplyReceiver};
pub use request::{Request, RequestError};
pub use server::{AppState, HttpServer};

/// IMF-fixdate, used for `Last-Modified` and cookie expiry.
pub const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";
