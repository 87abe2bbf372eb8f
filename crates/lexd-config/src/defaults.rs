use camino::Utf8PathBuf;

/// Default log filter expression used by the server.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Largest payload accepted in a single frame (100 MiB).
pub const DEFAULT_MAX_FRAME_BYTES: usize = 100 * 1024 * 1024;

/// Number of bytes requested from stdin per read.
pub const DEFAULT_READ_CHUNK_BYTES: usize = 8 * 1024;

/// Word list backing `textDocument/completion`.
pub const DEFAULT_WORD_LIST: &str = "/usr/share/dict/words";

/// Default log filter expression used by the server.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the server.
#[must_use]
pub const fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}

/// Default frame size ceiling.
#[must_use]
pub const fn default_max_frame_bytes() -> usize {
    DEFAULT_MAX_FRAME_BYTES
}

/// Default stdin read size.
#[must_use]
pub const fn default_read_chunk_bytes() -> usize {
    DEFAULT_READ_CHUNK_BYTES
}

/// Default completion word list location.
#[must_use]
pub fn default_word_list() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_WORD_LIST)
}
