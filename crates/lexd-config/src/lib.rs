//! Shared configuration for the `lexd` language server.
//!
//! Values are layered by [`ortho_config`]: built-in defaults, then a
//! configuration file, then `LEXD_*` environment variables, then command-line
//! flags. The server only reads the resolved [`Config`].

mod defaults;
mod logging;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_MAX_FRAME_BYTES, DEFAULT_READ_CHUNK_BYTES, DEFAULT_WORD_LIST,
    default_log_filter, default_log_filter_string, default_log_format, default_max_frame_bytes,
    default_read_chunk_bytes, default_word_list,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "LEXD")]
pub struct Config {
    /// `tracing` filter expression, e.g. `info` or `lexd::dispatch=debug`.
    #[serde(default = "defaults::default_log_filter_string")]
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Output format for log records.
    #[serde(default = "defaults::default_log_format")]
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
    /// Append log records to this file instead of stderr.
    #[serde(default)]
    pub log_file: Option<Utf8PathBuf>,
    /// Largest payload, in bytes, accepted in a single frame.
    #[serde(default = "defaults::default_max_frame_bytes")]
    #[ortho_config(default = defaults::default_max_frame_bytes())]
    pub max_frame_bytes: usize,
    /// Number of bytes requested from the input stream per read.
    #[serde(default = "defaults::default_read_chunk_bytes")]
    #[ortho_config(default = defaults::default_read_chunk_bytes())]
    pub read_chunk_bytes: usize,
    /// Newline-separated word list served as completion items.
    #[serde(default = "defaults::default_word_list")]
    #[ortho_config(default = defaults::default_word_list())]
    pub word_list: Utf8PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            log_file: None,
            max_frame_bytes: default_max_frame_bytes(),
            read_chunk_bytes: default_read_chunk_bytes(),
            word_list: default_word_list(),
        }
    }
}

impl Config {
    /// Filter expression handed to the tracing subscriber.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Selected log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Log file path, when logs should not go to stderr.
    #[must_use]
    pub fn log_file(&self) -> Option<&Utf8Path> {
        self.log_file.as_deref()
    }

    /// Frame payload ceiling in bytes.
    #[must_use]
    pub fn max_frame_bytes(&self) -> usize {
        self.max_frame_bytes
    }

    /// Read size for the input stream.
    #[must_use]
    pub fn read_chunk_bytes(&self) -> usize {
        self.read_chunk_bytes
    }

    /// Completion word list location.
    #[must_use]
    pub fn word_list(&self) -> &Utf8Path {
        &self.word_list
    }

    /// Rejects values the server cannot operate with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroLimit`] when a size limit is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_frame_bytes == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "max_frame_bytes",
            });
        }
        if self.read_chunk_bytes == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "read_chunk_bytes",
            });
        }
        Ok(())
    }
}

/// Semantic errors in an otherwise well-formed configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A size limit was configured as zero.
    #[error("{field} must be greater than zero")]
    ZeroLimit {
        /// Name of the offending field.
        field: &'static str,
    },
}
