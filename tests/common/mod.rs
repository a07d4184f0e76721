//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use component_server::component::{
    Activity, Component, ExecutionObject, Inbound, Outbound, Program, ScriptEngine,
};
use component_server::config::ServerConfig;
use component_server::{HandlerPlugins, HttpServer, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use url::Url;

/// A running server; dropping it shuts the server down.
pub struct TestServer {
    pub addr: SocketAddr,
    pub config_updates: mpsc::UnboundedSender<ServerConfig>,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the server on an ephemeral port.
pub async fn start_server(config: ServerConfig, plugins: HandlerPlugins) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config, plugins).unwrap();

    let shutdown = Shutdown::new();
    let (config_updates, updates_rx) = mpsc::unbounded_channel();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, updates_rx, server_shutdown).await;
    });

    TestServer {
        addr,
        config_updates,
        shutdown,
    }
}

/// Client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}

/// Config serving `root` for every host.
pub fn config_for(root: &Path) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.contents.insert("*".into(), root.display().to_string());
    config.base_dir = root.to_path_buf();
    config
}

pub fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

/// Start a mock backend that answers every request with `status` and a
/// body naming the request line it received.
pub async fn start_mock_backend(status: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let head = String::from_utf8_lossy(&buf[..n]);
                let request_line = head.lines().next().unwrap_or_default().to_string();
                let body = format!("backend saw {request_line}");
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Length: {}\r\nSet-Cookie: backend=1; Max-Age=60; SameSite=Lax; Path=/\r\nX-Backend: mock\r\nConnection: close\r\n\r\n{body}",
                    body.len(),
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Engine whose components finish asynchronously after `delay`, echoing
/// the request cookies back incremented.
pub struct DelayedEngine {
    pub delay: Duration,
}

impl ScriptEngine for DelayedEngine {
    fn compile(&self, url: &Url) -> Arc<Component> {
        let (component, loader) = Component::loading(url.clone());
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            loader.ready(Arc::new(DelayedProgram { delay }));
        });
        component
    }
}

struct DelayedProgram {
    delay: Duration,
}

impl Program for DelayedProgram {
    fn instantiate(&self) -> Result<Box<dyn ExecutionObject>, String> {
        Ok(Box::new(DelayedObject {
            delay: self.delay,
            outbound: Arc::new(std::sync::Mutex::new(Outbound::default())),
        }))
    }
}

struct DelayedObject {
    delay: Duration,
    outbound: Arc<std::sync::Mutex<Outbound>>,
}

impl ExecutionObject for DelayedObject {
    fn ready(&mut self, inbound: &Inbound, activity: &Activity) {
        activity.begin();
        let activity = activity.clone();
        let shared = Arc::clone(&self.outbound);
        let delay = self.delay;
        let mut out = Outbound::default();
        for (name, fields) in &inbound.request_cookies {
            let mut fields = fields.clone();
            let next = fields
                .value
                .as_deref()
                .and_then(|v| v.parse::<u32>().ok())
                .map(|n| (n + 1).to_string());
            fields.value = next.or(fields.value);
            out.response_cookies.insert(name.clone(), fields);
        }
        out.out = format!("{} {} done", inbound.method, inbound.path).into_bytes();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            *shared.lock().unwrap() = out;
            activity.finish();
        });
    }

    fn drain(&mut self) -> Outbound {
        std::mem::take(&mut *self.outbound.lock().unwrap())
    }
}
