//! Settings schema definitions.
//!
//! `RawSettings` mirrors the monitor's settings block exactly as an operator
//! writes it. Nothing here is validated; see `validation.rs` for the checks
//! that turn it into a [`SyncConfig`](super::SyncConfig).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::loader::ConfigError;

/// Default engine read interval in seconds.
pub const DEFAULT_INTERVAL_SECS: u64 = 10;

/// Longest engine read interval accepted, one day.
pub const MAX_INTERVAL_SECS: u64 = 86_400;

/// Root settings for the synchronizer, as read from the settings source.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RawSettings {
    /// Directories searched for plugin templates, in priority order.
    #[serde(rename = "templatesdirs", alias = "templatesDirs", alias = "templates_dirs")]
    pub templates_dirs: Vec<String>,

    /// Path of the generated engine config file.
    #[serde(rename = "conffile", alias = "confFile", alias = "conf_file")]
    pub conf_file: String,

    /// Directory holding engine plugin binaries. May be empty.
    #[serde(rename = "pluginsDir", alias = "pluginsdir", alias = "plugins_dir")]
    pub plugins_dir: String,

    /// Path of the JSON template-map file.
    #[serde(rename = "templatesMap", alias = "templatesmap", alias = "templates_map")]
    pub templates_map: String,

    /// Static plugin declarations keyed by plugin name.
    #[serde(rename = "StaticPlugins", alias = "staticplugins", alias = "static_plugins")]
    pub static_plugins: BTreeMap<String, StaticPluginSpec>,

    /// Engine read interval in seconds.
    #[serde(alias = "Interval")]
    pub interval: Option<u64>,

    /// How a new service list is compared to the applied one.
    #[serde(rename = "changeDetection", alias = "changedetection", alias = "change_detection")]
    pub change_detection: ChangeDetection,

    /// Upper bound in seconds on waiting for an engine reload. Unbounded when absent.
    #[serde(rename = "reloadTimeout", alias = "reloadtimeout", alias = "reload_timeout")]
    pub reload_timeout: Option<u64>,
}

impl RawSettings {
    /// Parse settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }
}

/// A static plugin declaration: `{ plugin = "<type>", ...payload }`.
///
/// Kept as an opaque map so that settings reloads never have to agree with
/// a type-specific schema until the plugin is actually built.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(transparent)]
pub struct StaticPluginSpec(pub Map<String, Value>);

impl StaticPluginSpec {
    /// The raw `plugin` entry, if present.
    pub fn plugin_type(&self) -> Option<&Value> {
        self.0.get("plugin")
    }

    /// Everything except the `plugin` entry.
    pub fn payload(&self) -> Map<String, Value> {
        let mut payload = self.0.clone();
        payload.remove("plugin");
        payload
    }
}

impl<const N: usize> From<[(&str, Value); N]> for StaticPluginSpec {
    fn from(entries: [(&str, Value); N]) -> Self {
        Self(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }
}

/// Strategy used by the change detector.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeDetection {
    /// Compare service IDs index by index. Reordering counts as a change.
    #[default]
    Positional,
    /// Compare the sorted set of service IDs.
    Unordered,
}
