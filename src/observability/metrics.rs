//! Metrics collection.
//!
//! # Responsibilities
//! - Define synchronizer metrics (cycles, skipped services, reloads)
//! - Expose the engine lifecycle state as a gauge
//!
//! # Metrics
//! - `collectd_sync_cycles_total` (counter): synchronization cycles by outcome
//! - `collectd_sync_services_skipped_total` (counter): skipped services by reason
//! - `collectd_sync_reload_duration_seconds` (histogram): engine reload latency
//! - `collectd_sync_engine_state` (gauge): 0=stopped, 1=running, 2=reloading
//!
//! # Design Decisions
//! - No recorder is installed here; the embedding agent owns exposition
//! - Without a recorder every call is a no-op

use std::time::Duration;

use crate::engine::EngineState;

pub fn record_sync_cycle(outcome: &'static str) {
    ::metrics::counter!("collectd_sync_cycles_total", "outcome" => outcome).increment(1);
}

pub fn record_service_skipped(reason: &'static str) {
    ::metrics::counter!("collectd_sync_services_skipped_total", "reason" => reason).increment(1);
}

pub fn record_reload(elapsed: Duration) {
    ::metrics::counter!("collectd_sync_reloads_total").increment(1);
    ::metrics::histogram!("collectd_sync_reload_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn record_engine_state(state: EngineState) {
    let value = match state {
        EngineState::Stopped => 0.0,
        EngineState::Running => 1.0,
        EngineState::Reloading => 2.0,
    };
    ::metrics::gauge!("collectd_sync_engine_state").set(value);
}
