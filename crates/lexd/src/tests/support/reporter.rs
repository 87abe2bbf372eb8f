//! Test double for [`HealthReporter`] that records structured events for assertions.

use std::sync::Mutex;

use crate::bootstrap::BootstrapError;
use crate::dispatch::{DispatchError, SessionSummary};
use crate::health::HealthReporter;

use lexd_config::Config;

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    /// Bootstrap started.
    BootstrapStarting,
    /// Bootstrap completed successfully.
    BootstrapSucceeded,
    /// Bootstrap failed with an error description.
    BootstrapFailed(String),
    /// The dispatch loop started.
    SessionStarted,
    /// The input stream closed.
    SessionFinished(SessionSummary),
    /// The dispatch loop stopped on a stream failure.
    SessionFailed(String),
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    pub fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn session_started(&self) {
        self.record(HealthEvent::SessionStarted);
    }

    fn session_finished(&self, summary: &SessionSummary) {
        self.record(HealthEvent::SessionFinished(*summary));
    }

    fn session_failed(&self, error: &DispatchError) {
        self.record(HealthEvent::SessionFailed(error.to_string()));
    }
}
