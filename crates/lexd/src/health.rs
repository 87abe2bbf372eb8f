//! Structured health reporting for server lifecycle events.

use std::sync::Arc;

use crate::bootstrap::BootstrapError;
use crate::dispatch::{DispatchError, SessionSummary};

use lexd_config::Config;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked before the dispatch loop starts reading input.
    fn session_started(&self);

    /// Invoked when the input stream closes.
    fn session_finished(&self, summary: &SessionSummary);

    /// Invoked when the dispatch loop stops on a stream failure.
    fn session_failed(&self, error: &DispatchError);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn session_started(&self) {
        (**self).session_started();
    }

    fn session_finished(&self, summary: &SessionSummary) {
        (**self).session_finished(summary);
    }

    fn session_failed(&self, error: &DispatchError) {
        (**self).session_failed(error);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting server bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            log_filter = %config.log_filter(),
            log_format = ?config.log_format(),
            max_frame_bytes = config.max_frame_bytes(),
            word_list = %config.word_list(),
            "server bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "server bootstrap failed"
        );
    }

    fn session_started(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "session_started",
            "serving requests on stdio"
        );
    }

    fn session_finished(&self, summary: &SessionSummary) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "session_finished",
            dispatched = summary.dispatched,
            dropped = summary.dropped,
            unconsumed_bytes = summary.unconsumed_bytes,
            "session finished"
        );
    }

    fn session_failed(&self, error: &DispatchError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "session_failed",
            error = %error,
            "session ended on stream failure"
        );
    }
}
