//! Test configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;
use std::io::Write;
use std::sync::Arc;

use camino::Utf8PathBuf;
use ortho_config::{OrthoConfig, OrthoError};
use tempfile::NamedTempFile;

use lexd_config::Config;

use crate::bootstrap::ConfigLoader;

/// Loader that provisions a word list in a temporary file.
pub struct TestConfigLoader {
    word_list: NamedTempFile,
    max_frame_bytes: usize,
}

impl TestConfigLoader {
    #[must_use]
    pub fn new(words: &[&str]) -> Self {
        let mut word_list = NamedTempFile::new().expect("failed to create word list file");
        for word in words {
            writeln!(word_list, "{word}").expect("failed to write word list");
        }
        Self {
            word_list,
            max_frame_bytes: Config::default().max_frame_bytes,
        }
    }

    /// Overrides the frame size limit.
    #[must_use]
    pub fn with_max_frame_bytes(mut self, max_frame_bytes: usize) -> Self {
        self.max_frame_bytes = max_frame_bytes;
        self
    }

    fn word_list_path(&self) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(self.word_list.path().to_path_buf())
            .expect("temporary word list path was not valid UTF-8")
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(Config {
            word_list: self.word_list_path(),
            max_frame_bytes: self.max_frame_bytes,
            read_chunk_bytes: 7,
            ..Config::default()
        })
    }
}

/// Loader that intentionally fails by passing invalid CLI arguments.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("lexd"),
            OsString::from("--max-frame-bytes"),
            OsString::from("lots"),
        ];
        Config::load_from_iter(args)
    }
}
