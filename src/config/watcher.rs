//! Configuration file watcher for hot reload.
//!
//! # Design Decisions
//! - Watches the file's directory, so editors that save by renaming a new
//!   file over the old one keep triggering reloads
//! - Pushes a config only when it differs from the last one pushed; the
//!   burst of events one save produces collapses into a single update
//! - Invalid files are logged field by field and never pushed

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::{load_config, ConfigError};
use crate::config::schema::ServerConfig;

/// Result of re-reading the watched file.
#[derive(Debug)]
enum ReloadOutcome {
    /// Same as the last config pushed, or the file is mid-rewrite.
    Unchanged,
    Pushed,
    Rejected(ConfigError),
}

/// Watches one configuration file and pushes changed configs.
pub struct ConfigWatcher {
    reloader: Reloader,
}

impl ConfigWatcher {
    /// `current` is the config the server started with.
    pub fn new(path: &Path, current: ServerConfig) -> (Self, mpsc::UnboundedReceiver<ServerConfig>) {
        let (updates, update_rx) = mpsc::unbounded_channel();
        let reloader = Reloader {
            path: path.to_path_buf(),
            current,
            updates,
        };
        (Self { reloader }, update_rx)
    }

    /// Start watching. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = std::path::absolute(&self.reloader.path).map_err(notify::Error::io)?;
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
        let mut reloader = self.reloader;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if reloader.concerns(&event) => reloader.reload_and_log(),
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %path.display(), "Config watcher started");
        Ok(watcher)
    }
}

struct Reloader {
    path: PathBuf,
    current: ServerConfig,
    updates: mpsc::UnboundedSender<ServerConfig>,
}

impl Reloader {
    fn concerns(&self, event: &Event) -> bool {
        (event.kind.is_modify() || event.kind.is_create())
            && event
                .paths
                .iter()
                .any(|p| p.file_name() == self.path.file_name())
    }

    fn reload(&mut self) -> ReloadOutcome {
        // Truncated and not yet rewritten.
        if std::fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(false) {
            return ReloadOutcome::Unchanged;
        }
        match load_config(&self.path) {
            Ok(config) if config == self.current => ReloadOutcome::Unchanged,
            Ok(config) => {
                self.current = config.clone();
                if self.updates.send(config).is_err() {
                    tracing::debug!("Config update receiver gone");
                }
                ReloadOutcome::Pushed
            }
            Err(e) => ReloadOutcome::Rejected(e),
        }
    }

    fn reload_and_log(&mut self) {
        match self.reload() {
            ReloadOutcome::Unchanged => {
                tracing::debug!(path = %self.path.display(), "Config event without changes")
            }
            ReloadOutcome::Pushed => {
                tracing::info!(path = %self.path.display(), roots = self.current.contents.len(), "Config reloaded")
            }
            ReloadOutcome::Rejected(ConfigError::Validation(errors)) => {
                for error in &errors {
                    tracing::error!(field = %error.field, reason = %error.reason, "Invalid config value");
                }
                tracing::error!(
                    path = %self.path.display(),
                    errors = errors.len(),
                    "Reloaded config rejected, keeping current configuration"
                );
            }
            ReloadOutcome::Rejected(e) => tracing::error!(
                path = %self.path.display(),
                error = %e,
                "Failed to reload config, keeping current configuration"
            ),
        }
    }
}
