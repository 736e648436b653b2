//! Configuration errors.

use thiserror::Error;

/// Configuration failure (bad environment value, missing data directory).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A value that must be an absolute `http(s)` origin could not be parsed as one.
    #[error("{key}: '{value}' is not an absolute http(s) URL")]
    InvalidUrl { key: String, value: String },

    /// A value was present but empty.
    #[error("{key} must not be empty")]
    Empty { key: String },

    /// No storage directory was configured and the platform has no data directory.
    #[error("no storage directory configured and no platform data directory available")]
    NoStorageDir,
}
