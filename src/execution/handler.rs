//! Mime handler that executes components.
//!
//! # Responsibilities
//! - Guard component files (dotfiles, library components, readability)
//! - Drive a component through `Loading → Ready → execute → complete`
//! - Park suspended requests in the correlator and resume them once
//! - Bound every suspension with the pending timeout
//!
//! # Design Decisions
//! - Waiting is a spawned task per suspended request, awaiting a watch
//!   channel, never a poll loop
//! - Every way out of a suspension takes the correlator record first; the
//!   loser of a race finds nothing and returns
//! - Failed compilations are evicted so the next request retries

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::component::{
    Activity, ActivityWatch, Component, ComponentCache, ComponentStatus, ExecutionObject, Inbound,
    ScriptEngine,
};
use crate::config::ComponentsConfig;
use crate::error::PipelineError;
use crate::execution::correlator::{Correlator, Transaction, TxHandle};
use crate::execution::drain;
use crate::handlers::{
    Exchange, HandlerError, HandlerOutcome, MimeHandler, MimeHandlerPlugin, Resource,
};
use crate::routing::RouterHandle;

/// Registers a [`ComponentHandler`] for the component MIME type.
pub struct ComponentPlugin {
    engine: Arc<dyn ScriptEngine>,
    mime_type: String,
    cache_enabled: bool,
    pending_timeout: Duration,
}

impl ComponentPlugin {
    pub fn new(engine: Arc<dyn ScriptEngine>, config: &ComponentsConfig) -> Self {
        Self {
            engine,
            mime_type: config.mime_type.clone(),
            cache_enabled: config.cache,
            pending_timeout: Duration::from_secs(config.pending_timeout_secs),
        }
    }

    pub fn with_pending_timeout(mut self, timeout: Duration) -> Self {
        self.pending_timeout = timeout;
        self
    }
}

impl MimeHandlerPlugin for ComponentPlugin {
    fn name(&self) -> &str {
        "component"
    }

    fn keys(&self) -> Vec<String> {
        vec![self.mime_type.clone()]
    }

    fn handler(&self, owner: RouterHandle) -> Result<Arc<dyn MimeHandler>, HandlerError> {
        Ok(Arc::new(ComponentHandler {
            executor: Arc::new(Executor {
                owner,
                cache: ComponentCache::new(Arc::clone(&self.engine), self.cache_enabled),
                correlator: Correlator::new(),
                pending_timeout: self.pending_timeout,
            }),
        }))
    }
}

pub struct ComponentHandler {
    executor: Arc<Executor>,
}

impl MimeHandler for ComponentHandler {
    fn load(&self, resource: &Resource, exchange: Exchange) -> HandlerOutcome {
        let name = resource.file_name();
        if name.starts_with('.') {
            let url = exchange.request.url().to_string();
            self.executor.owner.error(PipelineError::Forbidden(url), exchange);
            return HandlerOutcome::Handled;
        }
        // Capitalised components are libraries, served as plain files.
        if name.chars().next().is_some_and(char::is_uppercase) {
            return HandlerOutcome::Declined(exchange);
        }

        tracing::debug!(url = %resource.url(), mime = resource.mime(), "Loading component");
        let executor = Arc::clone(&self.executor);
        let resource = resource.clone();
        tokio::spawn(async move {
            executor.run(resource, exchange).await;
        });
        HandlerOutcome::Handled
    }
}

struct Executor {
    owner: RouterHandle,
    cache: ComponentCache,
    correlator: Correlator,
    pending_timeout: Duration,
}

impl Executor {
    async fn run(self: Arc<Self>, resource: Resource, exchange: Exchange) {
        if let Err(e) = tokio::fs::File::open(resource.path()).await {
            tracing::debug!(path = %resource.path().display(), error = %e, "Component unreadable");
            let url = exchange.request.url().to_string();
            return self.owner.error(PipelineError::Forbidden(url), exchange);
        }

        let component = self.cache.get(resource.url());
        self.exec(component, exchange);
    }

    fn exec(self: &Arc<Self>, component: Arc<Component>, exchange: Exchange) {
        match component.status() {
            ComponentStatus::Loading => {
                let handle = self.correlator.insert(Transaction::Compiling {
                    component: Arc::clone(&component),
                    exchange,
                });
                tracing::debug!(tx = %handle, url = %component.url(), "Waiting for compilation");
                let this = Arc::clone(self);
                tokio::spawn(async move { this.await_compilation(handle, component).await });
            }
            ComponentStatus::Error(diagnostic) => {
                self.cache.evict(&component);
                self.owner.error(PipelineError::Compilation(diagnostic), exchange);
            }
            ComponentStatus::Ready => self.execute(component, exchange),
        }
    }

    async fn await_compilation(self: Arc<Self>, handle: TxHandle, component: Arc<Component>) {
        let outcome = tokio::time::timeout(self.pending_timeout, component.settled()).await;
        let Some(transaction) = self.correlator.take(handle) else {
            return;
        };
        let (component, exchange) = match transaction {
            Transaction::Compiling { component, exchange } => (component, exchange),
            other => return self.unexpected(handle, other),
        };

        match outcome {
            Ok(Ok(_)) => self.exec(component, exchange),
            Ok(Err(e)) => {
                self.cache.evict(&component);
                self.owner
                    .error(PipelineError::Abandoned(format!("{}: {e}", component.url())), exchange);
            }
            Err(_) => {
                tracing::warn!(tx = %handle, url = %component.url(), "Compilation timed out");
                self.cache.evict(&component);
                self.owner
                    .error(PipelineError::Timeout(exchange.request.url().to_string()), exchange);
            }
        }
    }

    fn execute(self: &Arc<Self>, component: Arc<Component>, exchange: Exchange) {
        let Some(program) = component.program() else {
            let diagnostic = format!("{} is not ready", component.url());
            return self.owner.error(PipelineError::Compilation(diagnostic), exchange);
        };
        let mut object = match program.instantiate() {
            Ok(object) => object,
            Err(diagnostic) => {
                return self.owner.error(PipelineError::Compilation(diagnostic), exchange);
            }
        };

        let inbound = Inbound::from_request(&exchange.request, exchange.message.clone());
        let (activity, watch) = Activity::new();
        object.ready(&inbound, &activity);

        let url = component.url().clone();
        if !activity.is_working() {
            return self.complete(url, object, exchange);
        }

        let handle = self.correlator.insert(Transaction::Executing { url, object, exchange });
        tracing::debug!(
            tx = %handle,
            url = %component.url(),
            pending = self.correlator.len(),
            "Waiting for execution object"
        );
        let this = Arc::clone(self);
        tokio::spawn(async move { this.await_execution(handle, watch).await });
        // Only handles the object kept stay alive past this point.
        drop(activity);
    }

    async fn await_execution(self: Arc<Self>, handle: TxHandle, watch: ActivityWatch) {
        let outcome = tokio::time::timeout(self.pending_timeout, watch.finished()).await;
        let Some(transaction) = self.correlator.take(handle) else {
            return;
        };
        let (url, object, exchange) = match transaction {
            Transaction::Executing { url, object, exchange } => (url, object, exchange),
            other => return self.unexpected(handle, other),
        };

        match outcome {
            Ok(Ok(())) => self.complete(url, object, exchange),
            Ok(Err(e)) => {
                let message = format!("{url}: {e}");
                self.teardown(object);
                self.owner.error(PipelineError::Abandoned(message), exchange);
            }
            Err(_) => {
                tracing::warn!(tx = %handle, url = %url, "Execution timed out");
                self.teardown(object);
                self.owner
                    .error(PipelineError::Timeout(exchange.request.url().to_string()), exchange);
            }
        }
    }

    fn complete(self: &Arc<Self>, url: Url, mut object: Box<dyn ExecutionObject>, mut exchange: Exchange) {
        let outbound = object.drain();
        if let Err(e) = drain::apply(outbound, &exchange.request, &mut exchange.reply) {
            tracing::warn!(url = %url, error = %e, "Component reply already closed");
        }
        self.teardown(object);
    }

    fn unexpected(&self, handle: TxHandle, transaction: Transaction) {
        tracing::warn!(tx = %handle, transaction = ?transaction, "Unexpected transaction kind");
        self.owner.error(
            PipelineError::Abandoned(format!("transaction {handle} resumed in the wrong state")),
            transaction.into_exchange(),
        );
    }

    /// Drop the object off the request path.
    fn teardown(self: &Arc<Self>, object: Box<dyn ExecutionObject>) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            drop(object);
            if !this.cache.is_enabled() {
                this.cache.trim();
            }
        });
    }
}
