//! Configuration error types.

/// Errors raised while loading or saving `terrain.ron`.
///
/// Out-of-range values are never errors; they are clamped by validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("failed to read terrain.ron: {0}")]
    ReadError(#[source] std::io::Error),

    /// The config directory or file could not be written.
    #[error("failed to write terrain.ron: {0}")]
    WriteError(#[source] std::io::Error),

    /// The file is not a valid terrain document.
    #[error("terrain.ron is not valid RON: {0}")]
    ParseError(#[source] ron::error::SpannedError),

    #[error("failed to serialize terrain config: {0}")]
    SerializeError(#[source] ron::Error),
}
