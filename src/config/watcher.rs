//! Settings file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_settings;
use crate::config::schema::RawSettings;

/// A watcher that monitors the settings file for changes.
pub struct SettingsWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<RawSettings>,
}

impl SettingsWatcher {
    /// Create a new SettingsWatcher.
    ///
    /// Returns the watcher and a receiver for parsed settings updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<RawSettings>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!(path = ?path, "Settings change detected, reloading");
                        match load_settings(&path) {
                            Ok(settings) => {
                                if tx.send(settings).is_err() {
                                    tracing::debug!(path = ?path, "Settings receiver closed, dropping update");
                                }
                            }
                            Err(e) => {
                                tracing::error!(
                                    "Failed to reload settings: {}. Keeping current settings.",
                                    e
                                );
                            }
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Settings watcher started");
        Ok(watcher)
    }
}
