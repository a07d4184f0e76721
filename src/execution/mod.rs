//! Dynamic execution of components.
//!
//! # Data Flow
//! ```text
//! Router::load (component MIME type)
//!     → handler.rs guards (dotfile 403, Library.cmp declined, unreadable 403)
//!     → ComponentCache::get(url)
//!     → exec by status:
//!         Loading → correlator (Compiling) → wait → exec again
//!         Error   → evict, 500 through the router's error path
//!         Ready   → instantiate → ready(inbound)
//!                     idle    → drain.rs → reply closed
//!                     working → correlator (Executing) → wait → drain.rs
//!     → teardown on its own task
//! ```

pub mod correlator;
pub mod drain;
pub mod handler;

pub use correlator::{Correlator, Transaction, TxHandle};
pub use handler::{ComponentHandler, ComponentPlugin};
