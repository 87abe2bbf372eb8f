//! Server bootstrap orchestration.

use std::io::{self, Read, Write};
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;

use lexd_config::{Config, ConfigError};

use crate::dispatch::{DispatchError, Dispatcher, ResponseWriter, SessionSummary};
use crate::handlers::{WordList, default_registry};
use crate::health::HealthReporter;
use crate::registry::MethodRegistry;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the server configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader returning a configuration resolved elsewhere.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already resolved configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Configuration loaded but holds unusable values.
    #[error("invalid configuration: {source}")]
    InvalidConfiguration {
        /// Validation failure.
        #[source]
        source: ConfigError,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
}

/// Result of a successful bootstrap invocation.
pub struct Server {
    config: Config,
    registry: Arc<MethodRegistry>,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl Server {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handlers answering requests.
    #[must_use]
    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Serves requests from `reader` until it reaches end of stream, writing
    /// responses to `writer`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Io`] when either stream fails.
    pub fn serve<R: Read, W: Write>(
        &self,
        mut reader: R,
        writer: W,
    ) -> Result<SessionSummary, DispatchError> {
        let mut dispatcher =
            Dispatcher::new(Arc::clone(&self.registry), self.config.max_frame_bytes());
        let mut writer = ResponseWriter::new(writer);

        self.reporter.session_started();
        match dispatcher.serve(&mut reader, &mut writer, self.config.read_chunk_bytes()) {
            Ok(summary) => {
                self.reporter.session_finished(&summary);
                Ok(summary)
            }
            Err(error) => {
                self.reporter.session_failed(&error);
                Err(error)
            }
        }
    }

    /// Serves requests from standard input, answering on standard output.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Io`] when either stream fails.
    pub fn serve_stdio(&self) -> Result<SessionSummary, DispatchError> {
        self.serve(io::stdin().lock(), io::stdout().lock())
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Server")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Bootstraps the server using the supplied collaborators.
///
/// # Errors
///
/// Returns a [`BootstrapError`] when configuration cannot be loaded or
/// validated, or when telemetry cannot be installed. A missing word list is
/// not an error: completion then offers no candidates.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<Server, BootstrapError> {
    reporter.bootstrap_starting();

    let config = match loader.load() {
        Ok(config) => config,
        Err(source) => {
            let error = BootstrapError::Configuration { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    if let Err(source) = config.validate() {
        let error = BootstrapError::InvalidConfiguration { source };
        reporter.bootstrap_failed(&error);
        return Err(error);
    }

    let telemetry = match telemetry::initialise(&config) {
        Ok(handle) => handle,
        Err(source) => {
            let error = BootstrapError::Telemetry { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let words = WordList::load_or_empty(config.word_list());
    let registry = Arc::new(default_registry(&words));
    reporter.bootstrap_succeeded(&config);

    Ok(Server {
        config,
        registry,
        telemetry,
        reporter,
    })
}
