//! Compiled component cache keyed by source URL.
//!
//! # Design Decisions
//! - Enabled: concurrent requests for one URL share one component and its
//!   `Loading → Ready` transition; hits return the entry whatever its status
//! - Disabled: every request compiles from source and nothing is retained
//! - Failed components are evicted by the caller so the next request
//!   retries the compilation; eviction matches the instance, so a stale
//!   failure never removes a fresh recompilation of the same URL

use std::sync::Arc;

use dashmap::DashMap;
use url::Url;

use crate::component::engine::ScriptEngine;
use crate::component::Component;
use crate::observability::metrics;

pub struct ComponentCache {
    engine: Arc<dyn ScriptEngine>,
    enabled: bool,
    entries: DashMap<String, Arc<Component>>,
}

impl ComponentCache {
    pub fn new(engine: Arc<dyn ScriptEngine>, enabled: bool) -> Self {
        Self {
            engine,
            enabled,
            entries: DashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Cached component for `url`, compiling on a miss.
    pub fn get(&self, url: &Url) -> Arc<Component> {
        if !self.enabled {
            metrics::record_compilation("uncached");
            return self.engine.compile(url);
        }

        if let Some(entry) = self.entries.get(url.as_str()) {
            metrics::record_compilation("hit");
            return Arc::clone(entry.value());
        }

        let component = self
            .entries
            .entry(url.as_str().to_string())
            .or_insert_with(|| {
                metrics::record_compilation("miss");
                tracing::debug!(url = %url, "Compiling component");
                self.engine.compile(url)
            });
        Arc::clone(component.value())
    }

    /// Remove `component` if it is still the cached entry for its URL.
    pub fn evict(&self, component: &Arc<Component>) -> bool {
        self.entries
            .remove_if(component.url().as_str(), |_, cached| Arc::ptr_eq(cached, component))
            .is_some()
    }

    /// Drop entries no request currently holds, and let the engine trim its
    /// own caches. Returns the number of entries removed.
    pub fn trim(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, component| Arc::strong_count(component) > 1);
        self.engine.trim_cache();
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.entries.contains_key(url.as_str())
    }
}
