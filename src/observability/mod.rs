//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured log lines)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → logging.rs subscriber in the binary
//!     → whatever recorder the embedding agent installs
//! ```

pub mod logging;
pub mod metrics;
