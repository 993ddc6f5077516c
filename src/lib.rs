//! Collection engine config synchronizer.
//!
//! Keeps a running metric-collection engine's configuration in step with a
//! changing inventory of discovered services, and supervises the engine's
//! start, reload and stop.

pub mod config;
pub mod engine;
pub mod observability;
pub mod plugins;
pub mod render;
pub mod services;
pub mod sync;

pub use config::{RawSettings, SyncConfig};
pub use engine::{Engine, EngineState, LifecycleController};
pub use services::ServiceInstance;
pub use sync::{SyncOutcome, Synchronizer};
