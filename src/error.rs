//! Error types for configuration loading.
//!
//! Only conditions that must abort startup surface as errors. Everything the
//! loader can degrade around (unreadable `file://` targets, bad integers,
//! broken base64) is logged and replaced by a default instead.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal configuration errors raised while building the tree.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration document is not valid YAML.
    #[error("improperly configured: failed to parse {origin}: {source}")]
    ImproperlyConfigured {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// A configuration document parsed, but its top level is not a mapping.
    #[error("improperly configured: {origin} must contain a mapping at the top level")]
    NotAMapping { origin: String },

    /// A configuration file exists but could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error came from malformed configuration content rather
    /// than from the filesystem.
    pub fn is_improperly_configured(&self) -> bool {
        matches!(
            self,
            ConfigError::ImproperlyConfigured { .. } | ConfigError::NotAMapping { .. }
        )
    }
}

/// Result type for configuration loading.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
