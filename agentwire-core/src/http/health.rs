//! Advisory health state of a transport client

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{info, warn};

/// Snapshot of the client's health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Health {
    /// Whether the last completed exchange succeeded
    pub healthy: bool,
    /// When `healthy` was last written
    pub last_updated: DateTime<Utc>,
}

/// Health behind a read/write lock; starts healthy
#[derive(Debug)]
pub(crate) struct HealthTracker {
    state: RwLock<Health>,
}

impl HealthTracker {
    pub(crate) fn new() -> Self {
        Self {
            state: RwLock::new(Health {
                healthy: true,
                last_updated: Utc::now(),
            }),
        }
    }

    pub(crate) fn snapshot(&self) -> Health {
        *self.state.read()
    }

    pub(crate) fn mark(&self, provider: &str, healthy: bool) {
        let mut state = self.state.write();
        if state.healthy != healthy {
            if healthy {
                info!("Provider {} recovered", provider);
            } else {
                warn!("Provider {} marked unhealthy", provider);
            }
        }
        *state = Health {
            healthy,
            last_updated: Utc::now(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_update_timestamp() {
        let tracker = HealthTracker::new();
        let initial = tracker.snapshot();
        assert!(initial.healthy);

        tracker.mark("local", false);
        let down = tracker.snapshot();
        assert!(!down.healthy);
        assert!(down.last_updated >= initial.last_updated);

        tracker.mark("local", true);
        assert!(tracker.snapshot().healthy);
    }
}
