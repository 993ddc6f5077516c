//! Plugin synthesis subsystem.
//!
//! # Data Flow
//! ```text
//! StaticPlugins settings ──▶ synthesizer::static_plugins ──┐
//!                                                          ├─▶ merge ─▶ [PluginInstance]
//! discovered services ─────▶ synthesizer::service_plugins ─┘
//!                               ▲
//!                               └── TemplateMap overrides
//! ```
//!
//! # Design Decisions
//! - Static declaration errors abort the cycle; bad services are skipped
//! - Instances are created fresh every cycle and never mutated afterwards

pub mod synthesizer;
pub mod types;

pub use types::{PluginError, PluginInstance, PluginType};
