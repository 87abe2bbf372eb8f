//! Test harness utilities for the bootstrap suite.

mod config_loader;
mod reporter;

pub use config_loader::{FailingConfigLoader, TestConfigLoader};
pub use reporter::{HealthEvent, RecordingHealthReporter};
