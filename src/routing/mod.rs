//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path)
//!     → docroot.rs (host → local directory | remote URL | built-in)
//!     → router.rs resolve:
//!         local:  path safety → directory index / redirect → mime.rs
//!         remote: path + query rewritten onto the base URL
//!     → Resolution: Static | Dynamic | Remote | Redirect | Error
//!
//! Execution:
//!     Dynamic → mime handler (declined → static file)
//!     Remote  → protocol handler (declined → 403)
//!     Error   → errors/<status>.<ext> from the root, then the built-in
//!               error root, then errors.rs fallback page
//! ```
//!
//! # Design Decisions
//! - Document roots are swapped wholesale on reload
//! - Error documents are depth-limited per request
//! - Handlers hold a `RouterHandle` (weak) to re-enter the error path

pub mod docroot;
pub mod errors;
pub mod mime;
pub mod router;

pub use docroot::{DocumentRootTable, DocumentRoots, RootError, RootLocator, WILDCARD_HOST};
pub use mime::{MimeDatabase, DEFAULT_MIME};
pub use router::{Resolution, Router, RouterHandle};
