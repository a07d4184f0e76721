//! Extension → MIME type lookup.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Type used when the extension is unknown.
pub const DEFAULT_MIME: &str = "application/octet-stream";

const BUILTIN_TYPES: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("js", "text/javascript"),
    ("mjs", "text/javascript"),
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("txt", "text/plain"),
    ("csv", "text/csv"),
    ("svg", "image/svg+xml"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("ico", "image/vnd.microsoft.icon"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("pdf", "application/pdf"),
    ("wasm", "application/wasm"),
    ("zip", "application/zip"),
];

#[derive(Debug, Clone)]
pub struct MimeDatabase {
    by_extension: HashMap<String, String>,
}

impl MimeDatabase {
    /// Built-in table, then `extra`, then the component extension.
    pub fn new(component_extension: &str, component_mime: &str, extra: &BTreeMap<String, String>) -> Self {
        let mut by_extension: HashMap<String, String> = BUILTIN_TYPES
            .iter()
            .map(|(ext, mime)| (ext.to_string(), mime.to_string()))
            .collect();
        for (ext, mime) in extra {
            by_extension.insert(ext.to_ascii_lowercase(), mime.clone());
        }
        by_extension.insert(component_extension.to_ascii_lowercase(), component_mime.to_string());
        Self { by_extension }
    }

    pub fn for_path(&self, path: &Path) -> &str {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.by_extension.get(&ext.to_ascii_lowercase()))
            .map(String::as_str)
            .unwrap_or(DEFAULT_MIME)
    }
}
