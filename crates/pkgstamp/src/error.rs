//! Error types for descriptor parsing and element processing.

use pkgstamp_registry::UnsupportedSource;

/// Invalid stamp configuration, caught before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing package name")]
    MissingPackage,

    #[error("unsupported source: {0}")]
    UnsupportedSource(String),
}

impl From<UnsupportedSource> for ConfigError {
    fn from(e: UnsupportedSource) -> Self {
        Self::UnsupportedSource(e.0)
    }
}

/// Why one element could not be stamped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StampError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no target element matches `{selector}`")]
    NoTarget { selector: String },
}

impl From<UnsupportedSource> for StampError {
    fn from(e: UnsupportedSource) -> Self {
        Self::Config(e.into())
    }
}
