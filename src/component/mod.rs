//! Compiled components and the script engine contract.
//!
//! # Data Flow
//! ```text
//! ComponentCache::get(url)
//!     → hit: shared Arc<Component> (any status)
//!     → miss: ScriptEngine::compile(url)
//!
//! Component status (watch channel):
//!     Loading ──ComponentLoader::ready──▶ Ready(Program)
//!        └─────ComponentLoader::fail───▶ Error(diagnostic)
//!
//! Program::instantiate() → ExecutionObject (one per request)
//!     → ready(inbound, activity)
//!     → drain() → Outbound
//! ```
//!
//! # Design Decisions
//! - The loader is consumed by its transition, so an attempt settles once
//! - Components are shared read-only once ready
//! - Execution objects are owned by exactly one request

pub mod cache;
pub mod engine;
pub mod projection;
pub mod template;

use std::sync::Arc;

use tokio::sync::watch;
use url::Url;

pub use cache::ComponentCache;
pub use engine::{Activity, ActivityWatch, ExecutionObject, Program, ScriptEngine};
pub use projection::{CookieFields, Inbound, Outbound};
pub use template::TemplateEngine;

/// Observable status of a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentStatus {
    Loading,
    Ready,
    Error(String),
}

enum State {
    Loading,
    Ready(Arc<dyn Program>),
    Error(String),
}

impl State {
    fn status(&self) -> ComponentStatus {
        match self {
            State::Loading => ComponentStatus::Loading,
            State::Ready(_) => ComponentStatus::Ready,
            State::Error(diagnostic) => ComponentStatus::Error(diagnostic.clone()),
        }
    }
}

/// The loader was dropped while the component was still loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("component loader dropped before settling")]
pub struct LoaderDropped;

/// A compiled (or compiling) unit identified by its source URL.
pub struct Component {
    url: Url,
    state: watch::Receiver<State>,
}

/// Settles a loading component. Held by the script engine.
pub struct ComponentLoader {
    url: Url,
    tx: watch::Sender<State>,
}

impl Component {
    /// A component whose compilation is still outstanding.
    pub fn loading(url: Url) -> (Arc<Component>, ComponentLoader) {
        let (tx, rx) = watch::channel(State::Loading);
        let component = Arc::new(Component {
            url: url.clone(),
            state: rx,
        });
        (component, ComponentLoader { url, tx })
    }

    /// A component that compiled synchronously.
    pub fn ready(url: Url, program: Arc<dyn Program>) -> Arc<Component> {
        let (_tx, rx) = watch::channel(State::Ready(program));
        Arc::new(Component { url, state: rx })
    }

    /// A component that failed synchronously.
    pub fn failed(url: Url, diagnostic: impl Into<String>) -> Arc<Component> {
        let (_tx, rx) = watch::channel(State::Error(diagnostic.into()));
        Arc::new(Component { url, state: rx })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn status(&self) -> ComponentStatus {
        self.state.borrow().status()
    }

    /// The executable program, once ready.
    pub fn program(&self) -> Option<Arc<dyn Program>> {
        match &*self.state.borrow() {
            State::Ready(program) => Some(Arc::clone(program)),
            _ => None,
        }
    }

    /// Wait until the component leaves `Loading`.
    pub async fn settled(&self) -> Result<ComponentStatus, LoaderDropped> {
        let mut rx = self.state.clone();
        let state = rx
            .wait_for(|state| !matches!(state, State::Loading))
            .await
            .map_err(|_| LoaderDropped)?;
        Ok(state.status())
    }
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("url", &self.url.as_str())
            .field("status", &self.status())
            .finish()
    }
}

impl ComponentLoader {
    /// Mark the component ready.
    pub fn ready(self, program: Arc<dyn Program>) {
        tracing::debug!(url = %self.url, "Component ready");
        self.tx.send_replace(State::Ready(program));
    }

    /// Mark the component failed with a compiler diagnostic.
    pub fn fail(self, diagnostic: impl Into<String>) {
        let diagnostic = diagnostic.into();
        tracing::debug!(url = %self.url, %diagnostic, "Component failed to compile");
        self.tx.send_replace(State::Error(diagnostic));
    }
}
