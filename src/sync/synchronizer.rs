//! The synchronization pipeline: detect, synthesize, write, reload.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};

use crate::config::{ConfigError, RawSettings, SyncConfig};
use crate::engine::{Engine, EngineState, LifecycleController};
use crate::observability::metrics;
use crate::plugins::synthesizer;
use crate::render::ConfigWriter;
use crate::services::ServiceInstance;
use crate::sync::detector::ChangeDetector;
use crate::sync::SyncError;

/// Result of a [`Synchronizer::write`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The applied configuration is still current.
    Unchanged,
    /// A new config was written and the engine asked to reload.
    Applied { plugins: usize },
}

struct SyncState {
    config: SyncConfig,
    detector: ChangeDetector,
}

/// Keeps the engine's config in step with the service inventory.
///
/// Every entry point that mutates state holds one mutex for its whole
/// duration, so at most one cycle runs at a time.
pub struct Synchronizer {
    state: Mutex<SyncState>,
    writer: ConfigWriter,
    controller: LifecycleController,
}

impl Synchronizer {
    pub fn new(config: SyncConfig, writer: ConfigWriter, engine: Arc<dyn Engine>) -> Self {
        Self {
            state: Mutex::new(SyncState {
                detector: ChangeDetector::new(config.change_detection),
                config,
            }),
            writer,
            controller: LifecycleController::new(engine),
        }
    }

    /// Validate `settings` and build a synchronizer from them.
    pub fn from_settings(
        settings: &RawSettings,
        writer: ConfigWriter,
        engine: Arc<dyn Engine>,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(SyncConfig::from_settings(settings)?, writer, engine))
    }

    /// Apply a new service list, reconfiguring the engine if it is stale.
    ///
    /// The service list only counts as applied once the engine has reloaded.
    /// On failure the next call retries, even with an identical list.
    pub async fn write(&self, services: &[ServiceInstance]) -> Result<SyncOutcome, SyncError> {
        let mut state = self.state.lock().await;

        let Some(trigger) = state.detector.detect(services) else {
            metrics::record_sync_cycle("unchanged");
            return Ok(SyncOutcome::Unchanged);
        };
        tracing::info!(%trigger, services = services.len(), "Reconfiguring engine");

        match self.apply(&mut state, services).await {
            Ok(outcome) => {
                metrics::record_sync_cycle("applied");
                Ok(outcome)
            }
            Err(e) => {
                tracing::error!(error = %e, "Synchronization cycle failed");
                metrics::record_sync_cycle("failed");
                Err(e)
            }
        }
    }

    async fn apply(&self, state: &mut SyncState, services: &[ServiceInstance]) -> Result<SyncOutcome, SyncError> {
        let derived = synthesizer::service_plugins(services, &state.config.template_map);
        let statics = synthesizer::static_plugins(&state.config.static_plugins)?;
        let plugins = synthesizer::merge(statics, derived);

        self.writer.write(&state.config, &plugins)?;
        self.controller
            .reload(state.config.conf_file.clone(), state.config.reload_timeout)
            .await?;
        state.detector.commit(services);

        Ok(SyncOutcome::Applied {
            plugins: plugins.len(),
        })
    }

    /// Replace the working settings and force the next cycle to reconfigure.
    ///
    /// Nothing changes if the new settings fail validation.
    pub async fn reload_settings(&self, settings: &RawSettings) -> Result<(), ConfigError> {
        let config = SyncConfig::from_settings(settings)?;

        let mut state = self.state.lock().await;
        state.detector.set_mode(config.change_detection);
        state.detector.mark_dirty();
        state.config = config;

        tracing::info!("Settings reloaded, next synchronization will reconfigure");
        Ok(())
    }

    /// Write a config holding only the static plugins, then start the engine.
    pub async fn start(&self) -> Result<(), SyncError> {
        let mut state = self.state.lock().await;

        self.controller.ensure_startable().await?;
        state.detector.reset();

        tracing::info!("Configuring static plugins before first start");
        let plugins = synthesizer::static_plugins(&state.config.static_plugins)?;
        self.writer.write(&state.config, &plugins)?;

        self.controller
            .start(state.config.conf_file.clone(), state.config.interval)
            .await?;
        Ok(())
    }

    /// Ask the engine to stop. Returns without waiting for the shutdown.
    pub async fn stop(&self) {
        self.controller.stop().await;
    }

    pub fn state(&self) -> EngineState {
        self.controller.state()
    }

    /// Receiver observing engine state transitions.
    pub fn state_changes(&self) -> watch::Receiver<EngineState> {
        self.controller.subscribe()
    }

    /// Snapshot of the working settings.
    pub async fn config(&self) -> SyncConfig {
        self.state.lock().await.config.clone()
    }
}
