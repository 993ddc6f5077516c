//! Lifecycle states and errors.
//!
//! # State Transitions
//! ```text
//! Stopped → Running:   supervision loop finished initializing the engine
//! Running → Reloading: reload requested by the synchronization path
//! Reloading → Running: loop finished the engine reload sequence
//! Running/Reloading → Stopped: loop performed the engine shutdown
//! ```

use std::fmt;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    #[default]
    Stopped,
    Running,
    Reloading,
}

impl EngineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineState::Stopped => "stopped",
            EngineState::Running => "running",
            EngineState::Reloading => "reloading",
        }
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from the lifecycle controller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("already running")]
    AlreadyRunning,

    /// The engine did not leave `Reloading` in time. The loop keeps going.
    #[error("reload timed out after {0:?}")]
    ReloadTimedOut(Duration),

    /// The supervision loop is gone.
    #[error("supervision loop exited")]
    LoopExited,
}
