//! Synchronization subsystem.
//!
//! # Data Flow
//! ```text
//! service list update
//!     → detector.rs (dirty flag, length, ID comparison)
//!     → plugins::synthesizer (static ++ service-derived)
//!     → render::ConfigWriter (render + persist)
//!     → engine::LifecycleController::reload (wait until applied)
//!
//! settings update
//!     → Synchronizer::reload_settings (validate, swap, mark dirty)
//! ```
//!
//! # Design Decisions
//! - One mutex serializes whole cycles
//! - The applied list and dirty flag only change after a successful write
//! - No automatic retry; the next update is the retry

pub mod detector;
pub mod synchronizer;

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::RawSettings;
use crate::engine::LifecycleError;
use crate::plugins::PluginError;
use crate::render::WriteError;

pub use detector::{ChangeDetector, Trigger};
pub use synchronizer::{SyncOutcome, Synchronizer};

/// Failure of a synchronization cycle.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// Feed settings updates (e.g. from a `SettingsWatcher`) into `sync` until
/// the channel closes. Invalid settings are logged and ignored.
pub async fn apply_settings_updates(sync: Arc<Synchronizer>, mut updates: mpsc::UnboundedReceiver<RawSettings>) {
    while let Some(settings) = updates.recv().await {
        if let Err(e) = sync.reload_settings(&settings).await {
            tracing::error!("Failed to apply settings: {}. Keeping current settings.", e);
        }
    }
    tracing::debug!("Settings update channel closed");
}
