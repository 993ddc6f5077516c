//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the logging subsystem for the binary
//! - Honor `RUST_LOG`, falling back to a per-crate default
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - The library never installs a subscriber; the embedding agent does

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "collectd_sync=info";

/// Install a global fmt subscriber. Fails if one is already installed.
pub fn init_tracing(verbose: bool) -> Result<(), tracing_subscriber::util::TryInitError> {
    let fallback = if verbose { "collectd_sync=debug" } else { DEFAULT_FILTER };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
}
