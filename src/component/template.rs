//! Substitution-template engine bundled with the server.
//!
//! Compiling reads the component file on a background task, so components
//! go through a real `Loading` phase. Every instance renders the source
//! with request placeholders replaced and completes synchronously.
//!
//! | Placeholder   | Value                               |
//! |---------------|-------------------------------------|
//! | `{{method}}`  | request method                      |
//! | `{{scheme}}`  | URL scheme                          |
//! | `{{host}}`    | URL host                            |
//! | `{{path}}`    | URL path                            |
//! | `{{query}}`   | query string                        |
//! | `{{message}}` | router context (error documents)    |
//! | `{{request}}` | whole inbound projection as JSON    |
//!
//! All values except `{{request}}` are HTML-escaped.

use std::sync::Arc;

use url::Url;

use crate::component::engine::{Activity, ExecutionObject, Program, ScriptEngine};
use crate::component::projection::{Inbound, Outbound};
use crate::component::Component;
use crate::routing::errors::escape_html;

/// Engine whose components are plain-text templates.
#[derive(Debug, Default, Clone)]
pub struct TemplateEngine;

impl TemplateEngine {
    pub fn new() -> Self {
        Self
    }
}

impl ScriptEngine for TemplateEngine {
    fn compile(&self, url: &Url) -> Arc<Component> {
        let path = match url.to_file_path() {
            Ok(path) => path,
            Err(()) => return Component::failed(url.clone(), format!("{url}: not a local file")),
        };

        let (component, loader) = Component::loading(url.clone());
        tokio::spawn(async move {
            match tokio::fs::read_to_string(&path).await {
                Ok(source) => loader.ready(Arc::new(Template { source })),
                Err(e) => loader.fail(format!("{}: {e}", path.display())),
            }
        });
        component
    }
}

struct Template {
    source: String,
}

impl Program for Template {
    fn instantiate(&self) -> Result<Box<dyn ExecutionObject>, String> {
        Ok(Box::new(TemplateInstance {
            source: self.source.clone(),
            outbound: Outbound::default(),
        }))
    }
}

struct TemplateInstance {
    source: String,
    outbound: Outbound,
}

impl TemplateInstance {
    fn render(&self, inbound: &Inbound) -> String {
        let request = serde_json::to_string(inbound).unwrap_or_else(|_| "{}".to_string());
        let message = inbound.message.as_deref().unwrap_or_default();
        [
            ("{{method}}", escape_html(&inbound.method)),
            ("{{scheme}}", escape_html(&inbound.scheme)),
            ("{{host}}", escape_html(&inbound.host)),
            ("{{path}}", escape_html(&inbound.path)),
            ("{{query}}", escape_html(&inbound.query)),
            ("{{message}}", escape_html(message)),
            ("{{request}}", request),
        ]
        .iter()
        .fold(self.source.clone(), |acc, (placeholder, value)| {
            acc.replace(placeholder, value)
        })
    }
}

impl ExecutionObject for TemplateInstance {
    fn ready(&mut self, inbound: &Inbound, _activity: &Activity) {
        self.outbound.out = self.render(inbound).into_bytes();
        self.outbound
            .response_header
            .insert("content-type".into(), "text/html; charset=utf-8".into());
    }

    fn drain(&mut self) -> Outbound {
        std::mem::take(&mut self.outbound)
    }
}
