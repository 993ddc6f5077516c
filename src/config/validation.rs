//! Settings validation and path resolution.
//!
//! # Responsibilities
//! - Reject missing or empty required keys
//! - Convert every configured path to absolute form
//! - Load the template map the settings point at
//!
//! # Design Decisions
//! - Produces a new `SyncConfig` or an error, never a partial one
//! - Paths are resolved once here so later working-directory changes
//!   cannot redirect writes

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::loader::ConfigError;
use crate::config::schema::{ChangeDetection, RawSettings, StaticPluginSpec, DEFAULT_INTERVAL_SECS, MAX_INTERVAL_SECS};
use crate::config::templates::TemplateMap;

/// Validated, fully-resolved synchronizer parameters.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Absolute template directories, in lookup order.
    pub templates_dirs: Vec<PathBuf>,
    /// Absolute path of the generated engine config.
    pub conf_file: PathBuf,
    /// Engine plugin directory. Empty when not configured.
    pub plugins_dir: PathBuf,
    pub template_map: TemplateMap,
    pub static_plugins: BTreeMap<String, StaticPluginSpec>,
    /// Engine read interval.
    pub interval: Duration,
    pub change_detection: ChangeDetection,
    /// Bound on the reload wait. `None` waits indefinitely.
    pub reload_timeout: Option<Duration>,
}

impl SyncConfig {
    /// Validate raw settings and resolve them into a `SyncConfig`.
    pub fn from_settings(settings: &RawSettings) -> Result<Self, ConfigError> {
        if settings.templates_dirs.is_empty() {
            return Err(ConfigError::Missing("templatesDirs"));
        }
        let templates_dirs = settings
            .templates_dirs
            .iter()
            .map(|dir| absolute(Path::new(dir)))
            .collect::<Result<Vec<_>, _>>()?;

        if settings.conf_file.is_empty() {
            return Err(ConfigError::Missing("confFile"));
        }
        let conf_file = absolute(Path::new(&settings.conf_file))?;

        let plugins_dir = if settings.plugins_dir.is_empty() {
            PathBuf::new()
        } else {
            absolute(Path::new(&settings.plugins_dir))?
        };

        if settings.templates_map.is_empty() {
            return Err(ConfigError::Missing("templatesMap"));
        }
        let template_map = TemplateMap::load(Path::new(&settings.templates_map))?;

        let interval_secs = settings.interval.unwrap_or(DEFAULT_INTERVAL_SECS);
        if interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "interval",
                reason: "must be at least one second".to_string(),
            });
        }
        if interval_secs > MAX_INTERVAL_SECS {
            return Err(ConfigError::Invalid {
                key: "interval",
                reason: format!("must not exceed {MAX_INTERVAL_SECS} seconds"),
            });
        }

        Ok(Self {
            templates_dirs,
            conf_file,
            plugins_dir,
            template_map,
            static_plugins: settings.static_plugins.clone(),
            interval: Duration::from_secs(interval_secs),
            change_detection: settings.change_detection,
            reload_timeout: settings.reload_timeout.map(Duration::from_secs),
        })
    }
}

fn absolute(path: &Path) -> Result<PathBuf, ConfigError> {
    std::path::absolute(path).map_err(|source| ConfigError::Path {
        path: path.to_path_buf(),
        source,
    })
}
