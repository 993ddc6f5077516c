//! Collection engine supervision subsystem.
//!
//! # Data Flow
//! ```text
//! Synchronizer ──start/stop/reload──▶ controller.rs
//!                                        │  mpsc (capacity 1): Stop | Reload
//!                                        ▼
//!                               supervision loop (tokio task)
//!                                        │  spawn_blocking
//!                                        ▼
//!                                  dyn Engine (adapter)
//!
//! state.rs: one watch cell, written by the loop and the controller,
//! read the same way by everyone.
//! ```
//!
//! # Design Decisions
//! - Engine calls are blocking and run off the async workers
//! - Signals are only observed between engine calls; an in-flight read
//!   always completes
//! - The tick deadline is taken before each read, so drift never builds up

pub mod controller;
pub mod state;

use std::path::Path;

use thiserror::Error;

pub use controller::LifecycleController;
pub use state::{EngineState, LifecycleError};

/// Failure reported by an engine adapter.
#[derive(Debug, Error)]
#[error("engine {operation} failed: {message}")]
pub struct EngineError {
    pub operation: &'static str,
    pub message: String,
}

impl EngineError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

/// Control surface of the metric-collection engine.
///
/// Every call is synchronous and may block. Calls are only ever made from
/// the supervision loop, one at a time.
pub trait Engine: Send + Sync + 'static {
    fn init_context(&self) -> Result<(), EngineError>;
    fn load_config(&self, path: &Path) -> Result<(), EngineError>;
    fn start_all(&self) -> Result<(), EngineError>;
    /// Run every plugin's read callback once.
    fn read_all(&self) -> Result<(), EngineError>;
    fn shutdown_for_reload(&self) -> Result<(), EngineError>;
    fn reinit_for_reload(&self, path: &Path) -> Result<(), EngineError>;
    fn shutdown_all(&self) -> Result<(), EngineError>;
}
