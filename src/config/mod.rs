//! Settings management subsystem.
//!
//! # Data Flow
//! ```text
//! settings file (TOML)
//!     → loader.rs (read & deserialize into RawSettings)
//!     → validation.rs (required keys, absolute paths)
//!     → templates.rs (template map referenced by the settings)
//!     → SyncConfig (validated, immutable)
//!
//! On change:
//!     watcher.rs detects the edit
//!     → loader.rs parses the new settings
//!     → Synchronizer::reload_settings validates and swaps
//! ```
//!
//! # Design Decisions
//! - SyncConfig is immutable once built; changes require a full reload
//! - A failed reload keeps the previous SyncConfig
//! - Static plugin payloads stay opaque until synthesis

pub mod loader;
pub mod schema;
pub mod templates;
pub mod validation;
pub mod watcher;

pub use loader::{load_settings, ConfigError};
pub use schema::{ChangeDetection, RawSettings, StaticPluginSpec, DEFAULT_INTERVAL_SECS, MAX_INTERVAL_SECS};
pub use templates::TemplateMap;
pub use validation::SyncConfig;
