//! Service inventory as seen by the synchronizer.
//!
//! Instances are owned by the discovery subsystem; the synchronizer only
//! reads them once per synchronization cycle.

pub mod instance;

pub use instance::{Orchestration, PortBinding, PortPreference, Service, ServiceInstance};
