//! Document root table.
//!
//! # Responsibilities
//! - Map request hosts (or `*`) to a local directory or remote base URL
//! - Report hosts without a root as `Builtin`
//! - Swap the whole table atomically on reload
//!
//! # Design Decisions
//! - Host lookup is exact and case-insensitive (hosts are normalised)
//! - Readers only ever see a complete table (`ArcSwap`, copy-on-write)
//! - Values containing `://` are remote roots; anything else is a path
//!   resolved against the configuration directory

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use url::Url;

/// Key matching any host.
pub const WILDCARD_HOST: &str = "*";

static BUILTIN_ROOT: RootLocator = RootLocator::Builtin;

/// Where a document root lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootLocator {
    Local(PathBuf),
    Remote(Url),
    /// No configured root matched; the router's built-in root, if any,
    /// answers instead.
    Builtin,
}

/// Error building a [`RootLocator`] from configuration.
#[derive(Debug, thiserror::Error)]
pub enum RootError {
    #[error("document root for {host:?} is empty")]
    Empty { host: String },
    #[error("document root for {host:?} is not a valid url: {source}")]
    InvalidUrl {
        host: String,
        #[source]
        source: url::ParseError,
    },
    #[error("document root for {host:?} cannot be made absolute: {source}")]
    Path {
        host: String,
        #[source]
        source: std::io::Error,
    },
}

impl RootLocator {
    pub fn parse(host: &str, value: &str, base_dir: &Path) -> Result<Self, RootError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(RootError::Empty { host: host.to_string() });
        }
        if value.contains("://") {
            let url = Url::parse(value).map_err(|source| RootError::InvalidUrl {
                host: host.to_string(),
                source,
            })?;
            return Ok(RootLocator::Remote(url));
        }
        let path = std::path::absolute(base_dir.join(value)).map_err(|source| RootError::Path {
            host: host.to_string(),
            source,
        })?;
        Ok(RootLocator::Local(path))
    }
}

/// Immutable host → root mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentRootTable {
    entries: HashMap<String, RootLocator>,
}

impl DocumentRootTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(contents: &BTreeMap<String, String>, base_dir: &Path) -> Result<Self, RootError> {
        let mut table = Self::new();
        for (host, value) in contents {
            table = table.with_root(host, RootLocator::parse(host, value, base_dir)?);
        }
        Ok(table)
    }

    /// Add `root` for `host`. Local roots are made absolute against the
    /// working directory so every resource under them has a `file://` URL.
    pub fn with_root(mut self, host: &str, root: RootLocator) -> Self {
        let root = match root {
            RootLocator::Local(path) => RootLocator::Local(std::path::absolute(&path).unwrap_or(path)),
            other => other,
        };
        self.entries.insert(host.to_ascii_lowercase(), root);
        self
    }

    /// Root for `host`: exact entry, then wildcard, then built-in.
    pub fn resolve(&self, host: &str) -> &RootLocator {
        self.entries
            .get(&host.to_ascii_lowercase())
            .or_else(|| self.entries.get(WILDCARD_HOST))
            .unwrap_or(&BUILTIN_ROOT)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Shared, atomically replaceable [`DocumentRootTable`].
#[derive(Debug)]
pub struct DocumentRoots {
    current: ArcSwap<DocumentRootTable>,
}

impl DocumentRoots {
    pub fn new(table: DocumentRootTable) -> Self {
        Self {
            current: ArcSwap::from_pointee(table),
        }
    }

    /// Snapshot used for the whole of one request.
    pub fn load(&self) -> Arc<DocumentRootTable> {
        self.current.load_full()
    }

    /// Replace the table. Returns false when it is unchanged.
    pub fn replace(&self, table: DocumentRootTable) -> bool {
        if **self.current.load() == table {
            return false;
        }
        tracing::info!(entries = table.len(), "Document roots replaced");
        self.current.store(Arc::new(table));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn host_then_wildcard_then_builtin() {
        let table = DocumentRootTable::from_config(
            &contents(&[("example.com", "/srv/example"), ("*", "/srv/default")]),
            Path::new("/etc/server"),
        )
        .unwrap();

        assert_eq!(table.resolve("EXAMPLE.com"), &RootLocator::Local("/srv/example".into()));
        assert_eq!(table.resolve("other.org"), &RootLocator::Local("/srv/default".into()));
        assert_eq!(DocumentRootTable::new().resolve("other.org"), &RootLocator::Builtin);
    }

    #[test]
    fn relative_paths_and_remote_roots() {
        let table = DocumentRootTable::from_config(
            &contents(&[("a", "contents"), ("b", "http://upstream:9000/base")]),
            Path::new("/etc/server"),
        )
        .unwrap();

        assert_eq!(table.resolve("a"), &RootLocator::Local("/etc/server/contents".into()));
        assert_eq!(
            table.resolve("b"),
            &RootLocator::Remote(Url::parse("http://upstream:9000/base").unwrap())
        );
    }

    #[test]
    fn local_roots_are_absolute() {
        let table = DocumentRootTable::new().with_root("*", RootLocator::Local("site/public".into()));
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(table.resolve("any"), &RootLocator::Local(cwd.join("site/public")));
    }

    #[test]
    fn rejects_bad_roots() {
        assert!(matches!(
            RootLocator::parse("a", "  ", Path::new("/")),
            Err(RootError::Empty { .. })
        ));
        assert!(matches!(
            RootLocator::parse("a", "http://", Path::new("/")),
            Err(RootError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn replace_is_wholesale() {
        let roots = DocumentRoots::new(DocumentRootTable::new());
        let before = roots.load();

        let table = DocumentRootTable::new().with_root("*", RootLocator::Local("/srv".into()));
        assert!(roots.replace(table.clone()));
        assert!(!roots.replace(table));

        assert_eq!(before.resolve("x"), &RootLocator::Builtin);
        assert_eq!(roots.load().resolve("x"), &RootLocator::Local("/srv".into()));
    }
}
