//! Error types for model loading, validation, resolution and generation

use thiserror::Error;

use crate::diagnostics::Diagnostics;

/// Result type for model operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised across the pipeline
#[derive(Error, Debug)]
pub enum ModelError {
    #[error(
        "Invalid default key '{key}': expected one of 'package', 'java.util.List', 'java.util.Set', \
         'java.util.Map', 'java.util.Properties', 'strictXmlAttributes', 'checkDeprecation'"
    )]
    InvalidKey { key: String },

    #[error("Model validation failed with {count} error(s):\n{0}", count = .0.error_count())]
    Validation(Diagnostics),

    #[error(
        "Type conflict on {class}.{member}: declared as '{declared_type}' in {declared_in}, \
         inherited as '{inherited_type}' from {inherited_from}"
    )]
    TypeConflict {
        class: String,
        member: String,
        declared_in: String,
        declared_type: String,
        inherited_from: String,
        inherited_type: String,
    },

    #[error("Resolution error in {entity}: {message}")]
    Resolution { entity: String, message: String },

    #[error("Backend '{backend}' failed at {location}: {source}")]
    Generation {
        backend: String,
        location: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Unknown backend: {0}")]
    UnknownBackend(String),

    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error("Cannot load descriptor {path}: {message}")]
    Descriptor { path: String, message: String },

    #[error("Accessor contract violated on {entity}: {message}")]
    Contract { entity: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl ModelError {
    pub(crate) fn resolution(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resolution {
            entity: entity.into(),
            message: message.into(),
        }
    }

    pub(crate) fn contract(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Contract {
            entity: entity.into(),
            message: message.into(),
        }
    }

    /// The validation report, if this is a validation failure
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            Self::Validation(diagnostics) => Some(diagnostics),
            _ => None,
        }
    }
}
