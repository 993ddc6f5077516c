//! Settings loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::RawSettings;

/// Errors raised while loading or validating the synchronizer's settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required settings key is absent or empty.
    #[error("config missing {0} entry")]
    Missing(&'static str),

    /// A configured path could not be made absolute.
    #[error("cannot resolve path {path:?}: {source}")]
    Path {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A settings or template-map file could not be read.
    #[error("cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings text is not valid TOML for [`RawSettings`].
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The template-map file is not a JSON object of string lists.
    #[error("invalid template map {path:?}: {source}")]
    TemplateMap {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A numeric setting is out of range.
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Load settings from a TOML file. No semantic checks are applied here.
pub fn load_settings(path: &Path) -> Result<RawSettings, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    RawSettings::from_toml_str(&content)
}
