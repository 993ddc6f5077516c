//! Discovered service instances.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Which of a service's ports the collector should connect to.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PortPreference {
    #[default]
    Private,
    Public,
}

/// Service identity as reported by discovery.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct Service {
    /// Human-assigned name. Not unique across instances.
    pub name: String,
    /// Service type, e.g. `redis`. Mapped onto a plugin type during synthesis.
    #[serde(rename = "type")]
    pub kind: String,
}

/// Network location of a service instance.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct PortBinding {
    pub ip: String,
    #[serde(alias = "privatePort")]
    pub private_port: u16,
    #[serde(alias = "publicPort")]
    pub public_port: u16,
}

/// Metadata supplied by the orchestrator.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Orchestration {
    /// Dimensions attached to every metric of the instance.
    pub dims: HashMap<String, String>,
    #[serde(alias = "portPref")]
    pub port_pref: PortPreference,
}

/// A single discovered service instance.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct ServiceInstance {
    /// Unique, stable identity of the instance.
    pub id: String,
    pub service: Service,
    #[serde(default)]
    pub port: PortBinding,
    #[serde(default)]
    pub orchestration: Orchestration,
}

impl ServiceInstance {
    /// The port the collector should use, honoring the orchestrator's
    /// preference. Zero means the instance is not routable yet.
    pub fn resolved_port(&self) -> u16 {
        match self.orchestration.port_pref {
            PortPreference::Private => self.port.private_port,
            PortPreference::Public => self.port.public_port,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(pref: PortPreference) -> ServiceInstance {
        ServiceInstance {
            id: "a".into(),
            service: Service {
                name: "cache1".into(),
                kind: "redis".into(),
            },
            port: PortBinding {
                ip: "10.0.0.5".into(),
                private_port: 6379,
                public_port: 32768,
            },
            orchestration: Orchestration {
                port_pref: pref,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_resolved_port_follows_preference() {
        assert_eq!(instance(PortPreference::Private).resolved_port(), 6379);
        assert_eq!(instance(PortPreference::Public).resolved_port(), 32768);
    }

    #[test]
    fn test_deserialize_from_discovery_json() {
        let json = r#"{
            "id": "a",
            "service": {"name": "cache1", "type": "redis"},
            "port": {"ip": "10.0.0.5", "privatePort": 6379},
            "orchestration": {"dims": {"env": "prod"}, "portPref": "public"}
        }"#;

        let parsed: ServiceInstance = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.service.kind, "redis");
        assert_eq!(parsed.port.private_port, 6379);
        assert_eq!(parsed.port.public_port, 0);
        assert_eq!(parsed.orchestration.port_pref, PortPreference::Public);
        assert_eq!(parsed.resolved_port(), 0);
    }
}
