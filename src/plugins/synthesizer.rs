//! Plugin synthesis.
//!
//! # Responsibilities
//! - Turn static declarations into plugin instances (fatal on bad input)
//! - Turn discovered services into plugin instances (skip on bad input)
//! - Merge both lists in a fixed order: static first
//!
//! # Design Decisions
//! - Nothing is cached between cycles so settings reloads take effect
//! - Dimension keys are sorted before flattening

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::{StaticPluginSpec, TemplateMap};
use crate::observability::metrics;
use crate::plugins::types::{PluginError, PluginInstance, PluginType};
use crate::services::ServiceInstance;

/// Type-specific payload of a static declaration.
#[derive(Debug, Deserialize)]
struct StaticPayload {
    host: Option<String>,
    port: Option<u16>,
    #[serde(default)]
    dims: BTreeMap<String, String>,
    templates: Option<Vec<String>>,
    #[serde(flatten)]
    config: Map<String, Value>,
}

/// Build plugins from the static declarations, in name order.
///
/// Any malformed declaration fails the whole list.
pub fn static_plugins(
    specs: &BTreeMap<String, StaticPluginSpec>,
) -> Result<Vec<PluginInstance>, PluginError> {
    specs
        .iter()
        .map(|(name, spec)| static_plugin(name, spec))
        .collect()
}

fn static_plugin(name: &str, spec: &StaticPluginSpec) -> Result<PluginInstance, PluginError> {
    let plugin_type = spec
        .plugin_type()
        .ok_or_else(|| PluginError::MissingType(name.to_string()))?
        .as_str()
        .ok_or_else(|| PluginError::TypeNotString(name.to_string()))?;

    let plugin_type: PluginType =
        plugin_type
            .parse()
            .map_err(|_| PluginError::UnsupportedStatic {
                name: name.to_string(),
                plugin_type: plugin_type.to_string(),
            })?;

    let mut plugin = PluginInstance::new(plugin_type, name);

    let payload: StaticPayload = serde_json::from_value(Value::Object(spec.payload()))
        .map_err(|source| PluginError::Decode {
            name: name.to_string(),
            source,
        })?;

    if let Some(host) = payload.host {
        plugin.host = host;
    }
    if let Some(port) = payload.port {
        plugin.port = port;
    }
    if let Some(templates) = payload.templates {
        plugin.templates = templates;
    }
    plugin.dims = flatten_dims(payload.dims.iter());
    plugin.config = payload.config;

    Ok(plugin)
}

/// Build plugins from discovered services.
///
/// Services whose type has no plugin, or whose resolved port is zero, are
/// skipped; the rest keep their input order.
pub fn service_plugins(services: &[ServiceInstance], templates: &TemplateMap) -> Vec<PluginInstance> {
    tracing::debug!(services = services.len(), "Configuring plugins for services");

    let mut plugins = Vec::with_capacity(services.len());

    for service in services {
        let plugin_type: PluginType = match service.service.kind.parse() {
            Ok(t) => t,
            Err(_) => {
                tracing::warn!(
                    id = %service.id,
                    service_type = %service.service.kind,
                    "Unsupported service type, skipping"
                );
                metrics::record_service_skipped("unsupported");
                continue;
            }
        };

        let port = service.resolved_port();
        if port == 0 {
            tracing::debug!(
                id = %service.id,
                pref = ?service.orchestration.port_pref,
                "Service has no routable port yet, skipping"
            );
            metrics::record_service_skipped("no_port");
            continue;
        }

        let mut plugin = PluginInstance::new(plugin_type, service.service.name.clone());
        plugin.dims = flatten_dims(sorted(&service.orchestration.dims));
        plugin.host = service.port.ip.clone();
        plugin.port = port;

        if let Some(overrides) = templates.templates(&service.service.name) {
            tracing::debug!(
                service = %service.service.name,
                from = ?plugin.templates,
                to = ?overrides,
                "Replacing default templates"
            );
            plugin.templates = overrides.to_vec();
        }

        tracing::info!(
            service = %service.service.name,
            service_type = %plugin_type,
            host = %plugin.host,
            port = plugin.port,
            "Configured service plugin"
        );
        plugins.push(plugin);
    }

    plugins
}

/// Static plugins followed by service-derived plugins.
pub fn merge(
    mut statics: Vec<PluginInstance>,
    services: Vec<PluginInstance>,
) -> Vec<PluginInstance> {
    statics.extend(services);
    statics
}

fn sorted(dims: &HashMap<String, String>) -> impl Iterator<Item = (&String, &String)> {
    let mut pairs: Vec<_> = dims.iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    pairs.into_iter()
}

fn flatten_dims<'a>(pairs: impl Iterator<Item = (&'a String, &'a String)>) -> String {
    pairs
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}
