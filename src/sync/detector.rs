//! Change detection between synchronization cycles.

use std::fmt;

use crate::config::ChangeDetection;
use crate::services::ServiceInstance;

/// Why a new service list requires reconfiguration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Settings were reloaded since the last applied cycle.
    Dirty,
    LengthChanged { previous: usize, current: usize },
    /// IDs differ at this index.
    Mismatch { index: usize },
    /// Same length, different set of IDs.
    MembershipChanged,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Dirty => write!(f, "settings reloaded"),
            Trigger::LengthChanged { previous, current } => {
                write!(f, "service count changed from {} to {}", previous, current)
            }
            Trigger::Mismatch { index } => write!(f, "service at position {} changed", index),
            Trigger::MembershipChanged => write!(f, "service set changed"),
        }
    }
}

/// Tracks the last applied service IDs and the dirty flag.
#[derive(Debug, Clone, Default)]
pub struct ChangeDetector {
    applied: Vec<String>,
    dirty: bool,
    mode: ChangeDetection,
}

impl ChangeDetector {
    pub fn new(mode: ChangeDetection) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn set_mode(&mut self, mode: ChangeDetection) {
        self.mode = mode;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Force the next cycle to reconfigure.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Forget the applied list and the dirty flag.
    pub fn reset(&mut self) {
        self.applied.clear();
        self.dirty = false;
    }

    /// Decide whether `services` differs from the applied list.
    pub fn detect(&self, services: &[ServiceInstance]) -> Option<Trigger> {
        if self.dirty {
            return Some(Trigger::Dirty);
        }

        if self.applied.len() != services.len() {
            return Some(Trigger::LengthChanged {
                previous: self.applied.len(),
                current: services.len(),
            });
        }

        match self.mode {
            ChangeDetection::Positional => self
                .applied
                .iter()
                .zip(services)
                .position(|(applied, service)| *applied != service.id)
                .map(|index| Trigger::Mismatch { index }),
            ChangeDetection::Unordered => {
                let mut previous: Vec<&str> = self.applied.iter().map(String::as_str).collect();
                let mut current: Vec<&str> = services.iter().map(|s| s.id.as_str()).collect();
                previous.sort_unstable();
                current.sort_unstable();
                (previous != current).then_some(Trigger::MembershipChanged)
            }
        }
    }

    /// Record `services` as applied and clear the dirty flag.
    pub fn commit(&mut self, services: &[ServiceInstance]) {
        self.applied = services.iter().map(|s| s.id.clone()).collect();
        self.dirty = false;
    }
}
