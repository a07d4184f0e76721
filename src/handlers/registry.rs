//! Handler lookup tables.
//!
//! # Responsibilities
//! - Instantiate each plugin once and register it under all of its keys
//! - Look up handlers by MIME type or URL scheme
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1) lookups via HashMap
//! - A plugin that fails to instantiate is logged and skipped; requests it
//!   would have handled fall back to static serving

use std::collections::HashMap;
use std::sync::Arc;

use crate::handlers::{HandlerPlugins, MimeHandler, ProtocolHandler};
use crate::routing::RouterHandle;

#[derive(Default)]
pub struct HandlerRegistry {
    mime: HashMap<String, Arc<dyn MimeHandler>>,
    protocol: HashMap<String, Arc<dyn ProtocolHandler>>,
}

impl HandlerRegistry {
    pub fn build(plugins: HandlerPlugins, owner: &RouterHandle) -> Self {
        let mut registry = Self::default();

        for plugin in plugins.mime {
            match plugin.handler(owner.clone()) {
                Ok(handler) => {
                    for key in plugin.keys() {
                        tracing::info!(plugin = plugin.name(), mime = %key, "Registered mime handler");
                        registry.mime.insert(key, Arc::clone(&handler));
                    }
                }
                Err(e) => tracing::warn!(plugin = plugin.name(), error = %e, "Skipping mime handler plugin"),
            }
        }

        for plugin in plugins.protocol {
            match plugin.handler(owner.clone()) {
                Ok(handler) => {
                    for key in plugin.keys() {
                        tracing::info!(plugin = plugin.name(), scheme = %key, "Registered protocol handler");
                        registry.protocol.insert(key, Arc::clone(&handler));
                    }
                }
                Err(e) => {
                    tracing::warn!(plugin = plugin.name(), error = %e, "Skipping protocol handler plugin")
                }
            }
        }

        registry
    }

    pub fn mime_handler_for(&self, mime: &str) -> Option<&Arc<dyn MimeHandler>> {
        self.mime.get(mime)
    }

    pub fn protocol_handler_for(&self, scheme: &str) -> Option<&Arc<dyn ProtocolHandler>> {
        self.protocol.get(scheme)
    }

    pub fn mime_types(&self) -> impl Iterator<Item = &str> {
        self.mime.keys().map(String::as_str)
    }

    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.protocol.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{
        Exchange, HandlerError, HandlerOutcome, MimeHandlerPlugin, ProtocolHandlerPlugin, Resource,
    };
    use url::Url;

    struct Decline;

    impl MimeHandler for Decline {
        fn load(&self, _resource: &Resource, exchange: Exchange) -> HandlerOutcome {
            HandlerOutcome::Declined(exchange)
        }
    }

    impl ProtocolHandler for Decline {
        fn load(&self, _url: &Url, exchange: Exchange) -> HandlerOutcome {
            HandlerOutcome::Declined(exchange)
        }
    }

    struct Markup;

    impl MimeHandlerPlugin for Markup {
        fn name(&self) -> &str {
            "markup"
        }

        fn keys(&self) -> Vec<String> {
            vec!["text/x-a".into(), "text/x-b".into()]
        }

        fn handler(&self, _owner: RouterHandle) -> Result<Arc<dyn MimeHandler>, HandlerError> {
            Ok(Arc::new(Decline))
        }
    }

    struct Broken;

    impl ProtocolHandlerPlugin for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn keys(&self) -> Vec<String> {
            vec!["ftp".into()]
        }

        fn handler(&self, _owner: RouterHandle) -> Result<Arc<dyn ProtocolHandler>, HandlerError> {
            Err(HandlerError {
                plugin: "broken".into(),
                reason: "no network".into(),
            })
        }
    }

    #[test]
    fn one_instance_under_every_key() {
        let plugins = HandlerPlugins::new().with_mime(Markup).with_protocol(Broken);
        let registry = HandlerRegistry::build(plugins, &RouterHandle::detached());

        let a = registry.mime_handler_for("text/x-a").unwrap();
        let b = registry.mime_handler_for("text/x-b").unwrap();
        assert!(Arc::ptr_eq(a, b));
        assert!(registry.mime_handler_for("text/html").is_none());
    }

    #[test]
    fn failed_plugins_are_skipped() {
        let plugins = HandlerPlugins::new().with_protocol(Broken);
        let registry = HandlerRegistry::build(plugins, &RouterHandle::detached());
        assert!(registry.protocol_handler_for("ftp").is_none());
        assert_eq!(registry.schemes().count(), 0);
    }
}
