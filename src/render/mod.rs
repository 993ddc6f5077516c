//! Config rendering and persistence subsystem.
//!
//! # Data Flow
//! ```text
//! [PluginInstance] + EngineGlobals + template dirs
//!     → Renderer (engine-native text)
//!     → writer.rs (temp file, fixed mode, rename over conffile)
//! ```
//!
//! # Design Decisions
//! - Rendering is a seam: any `Renderer` can be plugged in
//! - A failed render or write leaves the previous file in place

pub mod template;
pub mod writer;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::plugins::PluginInstance;

pub use template::TemplateRenderer;
pub use writer::{ConfigWriter, WriteError};

/// Engine-wide settings rendered ahead of the plugins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineGlobals {
    /// Advertised hostname. Empty lets the engine determine it.
    pub hostname: String,
    pub interval_secs: u64,
}

/// Everything a renderer needs to produce one config file.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub plugins_dir: &'a Path,
    pub templates_dirs: &'a [PathBuf],
    pub globals: &'a EngineGlobals,
    pub plugins: &'a [PluginInstance],
}

/// Turns a plugin list into engine-native config text.
pub trait Renderer: Send + Sync {
    fn render(&self, ctx: &RenderContext<'_>) -> Result<String, RenderError>;
}

/// Errors raised by a [`Renderer`].
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template {template} for plugin {plugin} not found in any templates dir")]
    TemplateNotFound { template: String, plugin: String },

    #[error("cannot read template {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("render failed: {0}")]
    Other(String),
}
