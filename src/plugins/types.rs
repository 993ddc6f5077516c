//! Plugin types, instances and error definitions.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Engine plugin types the synchronizer knows how to configure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginType {
    // System plugins, usually declared statically.
    Cpu,
    Df,
    Disk,
    Interface,
    Load,
    Memory,
    Protocols,
    Uptime,
    Vmem,
    // Service plugins, usually derived from discovery.
    Apache,
    Cassandra,
    Docker,
    Elasticsearch,
    Kafka,
    Memcached,
    Mongodb,
    Mysql,
    Nginx,
    Postgresql,
    Rabbitmq,
    Redis,
    Zookeeper,
}

impl PluginType {
    pub const ALL: [PluginType; 22] = [
        PluginType::Cpu,
        PluginType::Df,
        PluginType::Disk,
        PluginType::Interface,
        PluginType::Load,
        PluginType::Memory,
        PluginType::Protocols,
        PluginType::Uptime,
        PluginType::Vmem,
        PluginType::Apache,
        PluginType::Cassandra,
        PluginType::Docker,
        PluginType::Elasticsearch,
        PluginType::Kafka,
        PluginType::Memcached,
        PluginType::Mongodb,
        PluginType::Mysql,
        PluginType::Nginx,
        PluginType::Postgresql,
        PluginType::Rabbitmq,
        PluginType::Redis,
        PluginType::Zookeeper,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PluginType::Cpu => "cpu",
            PluginType::Df => "df",
            PluginType::Disk => "disk",
            PluginType::Interface => "interface",
            PluginType::Load => "load",
            PluginType::Memory => "memory",
            PluginType::Protocols => "protocols",
            PluginType::Uptime => "uptime",
            PluginType::Vmem => "vmem",
            PluginType::Apache => "apache",
            PluginType::Cassandra => "cassandra",
            PluginType::Docker => "docker",
            PluginType::Elasticsearch => "elasticsearch",
            PluginType::Kafka => "kafka",
            PluginType::Memcached => "memcached",
            PluginType::Mongodb => "mongodb",
            PluginType::Mysql => "mysql",
            PluginType::Nginx => "nginx",
            PluginType::Postgresql => "postgresql",
            PluginType::Rabbitmq => "rabbitmq",
            PluginType::Redis => "redis",
            PluginType::Zookeeper => "zookeeper",
        }
    }

    /// Templates used when nothing overrides them.
    pub fn default_templates(&self) -> Vec<String> {
        vec![format!("{}.conf.tmpl", self.as_str())]
    }
}

impl fmt::Display for PluginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PluginType {
    type Err = PluginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PluginType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| PluginError::Unsupported(s.to_string()))
    }
}

/// One named, typed unit of collection configuration for the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginInstance {
    pub name: String,
    #[serde(rename = "type")]
    pub plugin_type: PluginType,
    pub host: String,
    pub port: u16,
    /// Flattened dimensions, `k1=v1,k2=v2`.
    pub dims: String,
    pub templates: Vec<String>,
    /// Type-specific settings handed through to the renderer untouched.
    pub config: Map<String, Value>,
}

impl PluginInstance {
    /// Create an instance carrying the type's default templates.
    pub fn new(plugin_type: PluginType, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            plugin_type,
            host: String::new(),
            port: 0,
            dims: String::new(),
            templates: plugin_type.default_templates(),
            config: Map::new(),
        }
    }
}

/// Errors raised while building plugin instances.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The type string does not name a supported plugin.
    #[error("unsupported plugin type {0}")]
    Unsupported(String),

    /// A static declaration has no `plugin` entry.
    #[error("static plugin {0} missing plugin type")]
    MissingType(String),

    /// A static declaration's `plugin` entry is not a string.
    #[error("static plugin {0} type is not a string")]
    TypeNotString(String),

    /// A static declaration names an unknown plugin type.
    #[error("static plugin {name}: unsupported plugin type {plugin_type}")]
    UnsupportedStatic { name: String, plugin_type: String },

    /// A static declaration's payload does not fit the plugin.
    #[error("static plugin {name}: invalid configuration: {source}")]
    Decode {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}
