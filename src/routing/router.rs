//! Request resolution and dispatch.
//!
//! # Responsibilities
//! - Resolve a request against its document root
//! - Hand resolved resources to mime/protocol handlers or serve them
//! - Render every failure through error documents
//!
//! # Design Decisions
//! - Resolution is a pure decision (`Resolution`); execution is separate
//! - Error documents are ordinary resources loaded through `load`
//! - Error rendering is depth-limited and ends in a built-in page, so it
//!   always terminates

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::time::SystemTime;

use axum::http::{header, HeaderValue, StatusCode};
use chrono::{DateTime, Utc};
use url::Url;

use crate::config::ServerConfig;
use crate::error::PipelineError;
use crate::handlers::{Exchange, HandlerOutcome, HandlerPlugins, HandlerRegistry, Resource};
use crate::http::{Reply, Request, HTTP_DATE_FORMAT};
use crate::observability::metrics;
use crate::routing::docroot::{DocumentRootTable, DocumentRoots, RootError, RootLocator};
use crate::routing::errors::{error_document_name, fallback_document};
use crate::routing::mime::MimeDatabase;

pub(crate) type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What the router decided to do with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Static(PathBuf),
    Dynamic { path: PathBuf, mime: String },
    Remote(Url),
    Redirect(String),
    Error(PipelineError),
}

/// Resolves and dispatches requests.
pub struct Router {
    roots: DocumentRoots,
    registry: HandlerRegistry,
    mime: MimeDatabase,
    component_extension: String,
    /// Serves hosts without a document root and holds the fallback
    /// error documents.
    builtin_root: Option<PathBuf>,
    max_error_depth: u8,
}

/// Non-owning reference to the router, given to handlers at registration.
#[derive(Debug, Clone, Default)]
pub struct RouterHandle {
    router: Weak<Router>,
}

impl RouterHandle {
    /// A handle that is not attached to any router.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Re-enter the router's error path for `exchange`.
    ///
    /// If the router is gone the exchange is dropped, which answers 500.
    pub fn error(&self, error: PipelineError, exchange: Exchange) {
        match self.router.upgrade() {
            Some(router) => {
                tokio::spawn(async move {
                    router.render_error(error, exchange).await;
                });
            }
            None => tracing::warn!(error = %error, "Router gone, dropping exchange"),
        }
    }
}

impl Router {
    pub fn new(config: &ServerConfig, plugins: HandlerPlugins) -> Result<Arc<Self>, RootError> {
        let table = DocumentRootTable::from_config(&config.contents, &config.base_dir)?;
        let builtin_root = config
            .errors
            .builtin_root
            .as_ref()
            .map(|root| {
                std::path::absolute(config.base_dir.join(root)).map_err(|source| RootError::Path {
                    host: "errors.builtin_root".to_string(),
                    source,
                })
            })
            .transpose()?;
        let mime = MimeDatabase::new(
            &config.components.extension,
            &config.components.mime_type,
            &config.mime,
        );

        Ok(Arc::new_cyclic(|weak| {
            let owner = RouterHandle {
                router: weak.clone(),
            };
            Router {
                roots: DocumentRoots::new(table),
                registry: HandlerRegistry::build(plugins, &owner),
                mime,
                component_extension: config.components.extension.clone(),
                builtin_root,
                max_error_depth: config.errors.max_depth,
            }
        }))
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn document_roots(&self) -> Arc<DocumentRootTable> {
        self.roots.load()
    }

    /// Replace the document root table wholesale.
    pub fn set_document_roots(&self, table: DocumentRootTable) -> bool {
        self.roots.replace(table)
    }

    /// Handle one request; `reply` is closed exactly once, possibly later.
    pub async fn dispatch(&self, request: Request, reply: Reply) {
        let exchange = Exchange::new(request, reply);
        let resolution = self.resolve(&exchange.request).await;
        tracing::debug!(url = %exchange.request.url(), ?resolution, "Request resolved");

        match resolution {
            Resolution::Static(path) | Resolution::Dynamic { path, .. } => self.load(path, exchange).await,
            Resolution::Remote(url) => self.load_url(url, exchange).await,
            Resolution::Redirect(location) => {
                self.render_error(PipelineError::Redirect(location), exchange).await
            }
            Resolution::Error(error) => self.render_error(error, exchange).await,
        }
    }

    /// Decide what to do with `request` without touching its reply.
    pub async fn resolve(&self, request: &Request) -> Resolution {
        let table = self.roots.load();
        match table.resolve(request.host()) {
            RootLocator::Remote(base) => self.resolve_remote(base, request),
            RootLocator::Local(root) => self.resolve_local(root, request).await,
            RootLocator::Builtin => match &self.builtin_root {
                Some(root) => self.resolve_local(root, request).await,
                None => Resolution::Error(PipelineError::NotFound(request.url().to_string())),
            },
        }
    }

    fn resolve_remote(&self, base: &Url, request: &Request) -> Resolution {
        let mut url = base.clone();
        let prefix = base.path().trim_end_matches('/');
        url.set_path(&format!("{prefix}{}", request.url().path()));
        url.set_query(request.url().query());

        if self.registry.protocol_handler_for(url.scheme()).is_none() {
            return Resolution::Error(PipelineError::NoProtocolHandler {
                scheme: url.scheme().to_string(),
                url: url.to_string(),
            });
        }
        Resolution::Remote(url)
    }

    async fn resolve_local(&self, root: &Path, request: &Request) -> Resolution {
        let request_url = request.url().to_string();
        let raw_path = request.url().path();
        let decoded = match urlencoding::decode(raw_path) {
            Ok(decoded) => decoded,
            Err(_) => return Resolution::Error(PipelineError::NotFound(request_url)),
        };

        let mut candidate = root.to_path_buf();
        for segment in decoded.split('/').filter(|s| !s.is_empty()) {
            // Covers `..` as well as dotfiles and dot-directories.
            if segment.starts_with('.') || segment.contains('\\') {
                return Resolution::Error(PipelineError::Forbidden(request_url));
            }
            candidate.push(segment);
        }

        if is_dir(&candidate).await {
            if raw_path.ends_with('/') {
                candidate.push(format!("index.{}", self.component_extension));
            } else {
                let mut location = request.url().clone();
                location.set_path(&format!("{raw_path}/"));
                return Resolution::Redirect(location.to_string());
            }
        }

        if !is_file(&candidate).await {
            return Resolution::Error(PipelineError::NotFound(request_url));
        }

        let mime = self.mime.for_path(&candidate);
        if self.registry.mime_handler_for(mime).is_some() {
            Resolution::Dynamic {
                mime: mime.to_string(),
                path: candidate,
            }
        } else {
            Resolution::Static(candidate)
        }
    }

    async fn load(&self, path: PathBuf, mut exchange: Exchange) {
        let mime = self.mime.for_path(&path).to_string();
        if let Ok(value) = HeaderValue::from_str(&mime) {
            exchange.reply.set_header(header::CONTENT_TYPE, value);
        }

        if let Some(handler) = self.registry.mime_handler_for(&mime) {
            let Some(resource) = Resource::new(path.clone(), mime) else {
                // Never fall back to serving a handled type as raw bytes.
                tracing::warn!(path = %path.display(), "Resource has no file URL");
                let request_url = exchange.request.url().to_string();
                return self.render_error(PipelineError::Forbidden(request_url), exchange).await;
            };
            match handler.load(&resource, exchange) {
                HandlerOutcome::Handled => return,
                HandlerOutcome::Declined(declined) => exchange = declined,
            }
        }

        self.load_file(&path, exchange).await
    }

    async fn load_file(&self, path: &Path, mut exchange: Exchange) {
        let request_url = exchange.request.url().to_string();
        let dotfile = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with('.'));
        if dotfile {
            return self.render_error(PipelineError::Forbidden(request_url), exchange).await;
        }

        let contents = match tokio::fs::read(path).await {
            Ok(contents) => contents,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Static file unreadable");
                return self.render_error(PipelineError::Forbidden(request_url), exchange).await;
            }
        };

        if let Ok(modified) = tokio::fs::metadata(path).await.and_then(|m| m.modified()) {
            if let Ok(value) = HeaderValue::from_str(&http_date(modified)) {
                exchange.reply.set_header(header::LAST_MODIFIED, value);
            }
        }

        let reply = &mut exchange.reply;
        if let Err(e) = reply.write(&contents).and_then(|_| reply.close()) {
            tracing::warn!(path = %path.display(), error = %e, "Static reply already closed");
        }
    }

    async fn load_url(&self, url: Url, exchange: Exchange) {
        let exchange = match self.registry.protocol_handler_for(url.scheme()) {
            Some(handler) => match handler.load(&url, exchange) {
                HandlerOutcome::Handled => return,
                HandlerOutcome::Declined(declined) => declined,
            },
            None => exchange,
        };
        let request_url = exchange.request.url().to_string();
        self.render_error(PipelineError::Forbidden(request_url), exchange).await
    }

    /// Answer `exchange` with `error`, through an error document if one
    /// exists and the depth limit allows it.
    pub(crate) fn render_error(&self, error: PipelineError, mut exchange: Exchange) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let status = error.status();
            let message = error.message();
            metrics::record_error(status.as_u16());
            tracing::debug!(
                status = status.as_u16(),
                message = %message,
                depth = exchange.error_depth,
                "Rendering error"
            );

            exchange.reply.set_status(status);
            if status.is_redirection() {
                if let Ok(location) = HeaderValue::from_str(&message) {
                    exchange.reply.set_header(header::LOCATION, location);
                }
            }
            exchange.message = Some(message.clone());

            if exchange.error_depth >= self.max_error_depth {
                tracing::warn!(
                    status = status.as_u16(),
                    depth = exchange.error_depth,
                    "Error document depth limit reached, using built-in page"
                );
            } else if let Some(document) = self.find_error_document(&exchange.request, status).await {
                exchange.error_depth += 1;
                return self.load(document, exchange).await;
            }

            render_fallback(status, &message, exchange);
        })
    }

    async fn find_error_document(&self, request: &Request, status: StatusCode) -> Option<PathBuf> {
        let name = error_document_name(status, &self.component_extension);
        let table = self.roots.load();

        let mut candidates = Vec::with_capacity(2);
        if let RootLocator::Local(root) = table.resolve(request.host()) {
            candidates.push(root.join("errors").join(&name));
        }
        if let Some(builtin) = &self.builtin_root {
            let candidate = builtin.join("errors").join(&name);
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }

        for candidate in candidates {
            if is_file(&candidate).await {
                return Some(candidate);
            }
        }
        None
    }
}

fn render_fallback(status: StatusCode, message: &str, mut exchange: Exchange) {
    exchange
        .reply
        .set_header(header::CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
    let body = fallback_document(status, message);
    let reply = &mut exchange.reply;
    if let Err(e) = reply.write(body.as_bytes()).and_then(|_| reply.close()) {
        tracing::warn!(status = status.as_u16(), error = %e, "Error reply already closed");
    }
}

pub(crate) fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(HTTP_DATE_FORMAT).to_string()
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false)
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{
        HandlerError, MimeHandler, MimeHandlerPlugin, ProtocolHandler, ProtocolHandlerPlugin,
    };
    use axum::body::Bytes;
    use axum::http::{HeaderMap, Method};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const COMPONENT_MIME: &str = "application/x-component";

    /// Mime handler that answers every component with a 500 compile error.
    struct Failing {
        owner: RouterHandle,
        calls: Arc<AtomicUsize>,
    }

    impl MimeHandler for Failing {
        fn load(&self, _resource: &Resource, exchange: Exchange) -> HandlerOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.owner
                .error(PipelineError::Compilation("syntax error".into()), exchange);
            HandlerOutcome::Handled
        }
    }

    struct FailingPlugin(Arc<AtomicUsize>);

    impl MimeHandlerPlugin for FailingPlugin {
        fn name(&self) -> &str {
            "failing"
        }

        fn keys(&self) -> Vec<String> {
            vec![COMPONENT_MIME.into()]
        }

        fn handler(&self, owner: RouterHandle) -> Result<Arc<dyn MimeHandler>, HandlerError> {
            Ok(Arc::new(Failing {
                owner,
                calls: Arc::clone(&self.0),
            }))
        }
    }

    struct DeclineRemote;

    impl ProtocolHandler for DeclineRemote {
        fn load(&self, _url: &Url, exchange: Exchange) -> HandlerOutcome {
            HandlerOutcome::Declined(exchange)
        }
    }

    impl ProtocolHandlerPlugin for DeclineRemote {
        fn name(&self) -> &str {
            "decline"
        }

        fn keys(&self) -> Vec<String> {
            vec!["http".into()]
        }

        fn handler(&self, _owner: RouterHandle) -> Result<Arc<dyn ProtocolHandler>, HandlerError> {
            Ok(Arc::new(DeclineRemote))
        }
    }

    fn site() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("blog")).unwrap();
        std::fs::create_dir_all(root.join("docs")).unwrap();
        std::fs::create_dir_all(root.join("errors")).unwrap();
        std::fs::write(root.join("hello.txt"), "hello").unwrap();
        std::fs::write(root.join(".secret"), "hidden").unwrap();
        std::fs::write(root.join("docs/index.cmp"), "index").unwrap();
        std::fs::write(root.join("page.cmp"), "page").unwrap();
        dir
    }

    fn config(root: &Path) -> ServerConfig {
        let mut config = ServerConfig::default();
        config.contents.insert("*".into(), root.display().to_string());
        config
    }

    fn request(path: &str) -> Request {
        let url = Url::parse(&format!("http://example.com{path}")).unwrap();
        Request::new(Method::GET, url, HeaderMap::new(), Bytes::new())
    }

    #[tokio::test]
    async fn resolves_each_outcome() {
        let dir = site();
        let root = dir.path();
        let calls = Arc::new(AtomicUsize::new(0));
        let plugins = HandlerPlugins::new().with_mime(FailingPlugin(calls));
        let router = Router::new(&config(root), plugins).unwrap();

        assert_eq!(
            router.resolve(&request("/hello.txt")).await,
            Resolution::Static(root.join("hello.txt"))
        );
        assert_eq!(
            router.resolve(&request("/page.cmp")).await,
            Resolution::Dynamic {
                path: root.join("page.cmp"),
                mime: COMPONENT_MIME.into()
            }
        );
        assert_eq!(
            router.resolve(&request("/docs/")).await,
            Resolution::Dynamic {
                path: root.join("docs/index.cmp"),
                mime: COMPONENT_MIME.into()
            }
        );
        assert_eq!(
            router.resolve(&request("/docs?x=1")).await,
            Resolution::Redirect("http://example.com/docs/?x=1".into())
        );
        assert_eq!(
            router.resolve(&request("/blog/")).await,
            Resolution::Error(PipelineError::NotFound("http://example.com/blog/".into()))
        );
        assert!(matches!(
            router.resolve(&request("/.secret")).await,
            Resolution::Error(PipelineError::Forbidden(_))
        ));
        assert!(matches!(
            router.resolve(&request("/.does-not-exist")).await,
            Resolution::Error(PipelineError::Forbidden(_))
        ));
        assert!(matches!(
            router.resolve(&request("/blog/%2e%2e%2fhello.txt")).await,
            Resolution::Error(PipelineError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn remote_roots_need_a_protocol_handler() {
        let mut config = ServerConfig::default();
        config.contents.insert("*".into(), "s3://bucket/base".into());
        let router = Router::new(&config, HandlerPlugins::new()).unwrap();
        assert_eq!(
            router.resolve(&request("/key")).await,
            Resolution::Error(PipelineError::NoProtocolHandler {
                scheme: "s3".into(),
                url: "s3://bucket/base/key".into(),
            })
        );

        let mut config = ServerConfig::default();
        config.contents.insert("*".into(), "http://upstream:9000/api".into());
        let router = Router::new(&config, HandlerPlugins::new().with_protocol(DeclineRemote)).unwrap();
        assert_eq!(
            router.resolve(&request("/users?id=7")).await,
            Resolution::Remote(Url::parse("http://upstream:9000/api/users?id=7").unwrap())
        );
    }

    #[tokio::test]
    async fn declined_remote_is_forbidden() {
        let mut config = ServerConfig::default();
        config.contents.insert("*".into(), "http://upstream:9000".into());
        let router = Router::new(&config, HandlerPlugins::new().with_protocol(DeclineRemote)).unwrap();

        let (reply, rx) = Reply::channel();
        router.dispatch(request("/x"), reply).await;
        assert_eq!(rx.recv().await.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn serves_static_files_with_last_modified() {
        let dir = site();
        let router = Router::new(&config(dir.path()), HandlerPlugins::new()).unwrap();

        let (reply, rx) = Reply::channel();
        router.dispatch(request("/hello.txt"), reply).await;
        let response = rx.recv().await;

        let modified = std::fs::metadata(dir.path().join("hello.txt")).unwrap().modified().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
        assert_eq!(response.headers()[header::LAST_MODIFIED], http_date(modified).as_str());
        assert_eq!(response.body().as_ref(), b"hello");
    }

    #[tokio::test]
    async fn components_without_handler_are_static() {
        let dir = site();
        let router = Router::new(&config(dir.path()), HandlerPlugins::new()).unwrap();

        let (reply, rx) = Reply::channel();
        router.dispatch(request("/page.cmp"), reply).await;
        let response = rx.recv().await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_ref(), b"page");
    }

    #[tokio::test]
    async fn redirect_sets_location() {
        let dir = site();
        let router = Router::new(&config(dir.path()), HandlerPlugins::new()).unwrap();

        let (reply, rx) = Reply::channel();
        router.dispatch(request("/docs?page=2"), reply).await;
        let response = rx.recv().await;
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[header::LOCATION], "http://example.com/docs/?page=2");
    }

    #[tokio::test]
    async fn builtin_fallback_when_no_error_document() {
        let dir = site();
        let router = Router::new(&config(dir.path()), HandlerPlugins::new()).unwrap();

        let (reply, rx) = Reply::channel();
        router.dispatch(request("/blog/"), reply).await;
        let response = rx.recv().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = String::from_utf8(response.body().to_vec()).unwrap();
        assert!(body.contains("404 Not Found"));
        assert!(body.contains("http://example.com/blog/"));
    }

    #[tokio::test]
    async fn error_documents_are_depth_limited() {
        let dir = site();
        std::fs::write(dir.path().join("errors/404.cmp"), "404").unwrap();
        std::fs::write(dir.path().join("errors/500.cmp"), "500").unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let plugins = HandlerPlugins::new().with_mime(FailingPlugin(Arc::clone(&calls)));
        let router = Router::new(&config(dir.path()), plugins).unwrap();

        let (reply, rx) = Reply::channel();
        router.dispatch(request("/missing"), reply).await;
        let response = rx.recv().await;

        // 404.cmp and 500.cmp both fail, then the built-in page answers.
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let body = String::from_utf8(response.body().to_vec()).unwrap();
        assert!(body.contains("syntax error"));
    }

    #[tokio::test]
    async fn builtin_error_root_is_second_choice() {
        let dir = site();
        let builtin = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(builtin.path().join("errors")).unwrap();
        std::fs::write(builtin.path().join("errors/404.cmp"), "builtin 404").unwrap();

        let mut config = config(dir.path());
        config.errors.builtin_root = Some(builtin.path().display().to_string());
        // No component handler: the error document is served as a file.
        let router = Router::new(&config, HandlerPlugins::new()).unwrap();

        let (reply, rx) = Reply::channel();
        router.dispatch(request("/missing"), reply).await;
        let response = rx.recv().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.body().as_ref(), b"builtin 404");
    }

    /// Site created under the working directory, with its relative path.
    fn relative_site() -> (TempDir, PathBuf) {
        let cwd = std::env::current_dir().unwrap();
        let dir = tempfile::Builder::new().prefix("site-").tempdir_in(&cwd).unwrap();
        std::fs::create_dir_all(dir.path().join("errors")).unwrap();
        std::fs::write(dir.path().join("page.cmp"), "page").unwrap();
        std::fs::write(dir.path().join("errors/404.cmp"), "404").unwrap();
        let relative = dir.path().strip_prefix(&cwd).unwrap().to_path_buf();
        (dir, relative)
    }

    #[tokio::test]
    async fn relative_roots_still_reach_the_mime_handler() {
        let (_dir, relative) = relative_site();
        let calls = Arc::new(AtomicUsize::new(0));
        let plugins = HandlerPlugins::new().with_mime(FailingPlugin(Arc::clone(&calls)));
        let router = Router::new(&ServerConfig::default(), plugins).unwrap();
        router.set_document_roots(DocumentRootTable::new().with_root("*", RootLocator::Local(relative)));

        let (reply, rx) = Reply::channel();
        router.dispatch(request("/page.cmp"), reply).await;
        let response = rx.recv().await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = String::from_utf8(response.body().to_vec()).unwrap();
        assert!(body.contains("syntax error"), "{body}");
    }

    #[tokio::test]
    async fn relative_builtin_root_error_documents_are_executed() {
        let (_dir, relative) = relative_site();
        let mut config = ServerConfig::default();
        config.errors.builtin_root = Some(relative.display().to_string());
        let calls = Arc::new(AtomicUsize::new(0));
        let plugins = HandlerPlugins::new().with_mime(FailingPlugin(Arc::clone(&calls)));
        let router = Router::new(&config, plugins).unwrap();

        let (reply, rx) = Reply::channel();
        router.dispatch(request("/missing"), reply).await;
        let response = rx.recv().await;

        // 404.cmp went to the handler instead of being sent as source.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_ne!(response.body().as_ref(), b"404");
    }

    #[tokio::test]
    async fn builtin_root_serves_hosts_without_a_root() {
        let dir = site();
        let mut config = ServerConfig::default();
        config.errors.builtin_root = Some(dir.path().display().to_string());
        let router = Router::new(&config, HandlerPlugins::new()).unwrap();

        let (reply, rx) = Reply::channel();
        router.dispatch(request("/hello.txt"), reply).await;
        let response = rx.recv().await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_ref(), b"hello");
    }

    #[tokio::test]
    async fn document_roots_can_be_replaced() {
        let dir = site();
        let router = Router::new(&ServerConfig::default(), HandlerPlugins::new()).unwrap();
        assert!(matches!(
            router.resolve(&request("/hello.txt")).await,
            Resolution::Error(PipelineError::NotFound(_))
        ));

        let table = DocumentRootTable::new().with_root("*", RootLocator::Local(dir.path().to_path_buf()));
        assert!(router.set_document_roots(table));
        assert_eq!(
            router.resolve(&request("/hello.txt")).await,
            Resolution::Static(dir.path().join("hello.txt"))
        );
    }
}
