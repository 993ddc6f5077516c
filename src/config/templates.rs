//! Service-name to template-list overrides.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::config::loader::ConfigError;

/// Mapping from service name to the ordered templates that replace a
/// plugin's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateMap {
    entries: HashMap<String, Vec<String>>,
}

impl TemplateMap {
    /// Read and parse a template-map file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let path = std::path::absolute(path).map_err(|source| ConfigError::Path {
            path: path.to_path_buf(),
            source,
        })?;
        let data = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&data)
            .map(|entries| Self { entries })
            .map_err(|source| ConfigError::TemplateMap { path, source })
    }

    /// Parse a JSON object of `name -> [template, ...]`.
    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data).map(|entries| Self { entries })
    }

    /// Templates overriding the defaults for `service_name`, if any.
    pub fn templates(&self, service_name: &str) -> Option<&[String]> {
        self.entries.get(service_name).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Vec<String>)> for TemplateMap {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
