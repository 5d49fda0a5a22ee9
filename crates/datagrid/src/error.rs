//! Error types for the datagrid crate.

use thiserror::Error;

/// A column or filter was configured in a way that cannot be resolved.
///
/// These are fatal: they surface as soon as an accessor or a data category is
/// needed and are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// Dynamic rows carry no static type information, so every field used
    /// for reading, sorting, grouping or filtering needs a declared type.
    #[error("field '{field}' on dynamic rows requires a declared type")]
    MissingDeclaredType { field: String },

    /// The field is not a member of the static row type.
    #[error("'{row_type}' has no member named '{field}'")]
    UnknownMember {
        field: String,
        row_type: &'static str,
    },

    /// A value type name in configuration could not be parsed.
    #[error("unknown value type: '{0}'")]
    UnknownValueType(String),
}

/// A stored value or filter input could not be converted to the target type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot convert {value} to {target}")]
pub struct ConversionError {
    /// Rendering of the offending value.
    pub value: String,
    /// Name of the requested type.
    pub target: String,
}

impl ConversionError {
    pub(crate) fn new(value: impl std::fmt::Display, target: impl std::fmt::Display) -> Self {
        ConversionError {
            value: value.to_string(),
            target: target.to_string(),
        }
    }
}

/// Errors produced by the grid core.
#[derive(Debug, Error)]
pub enum GridError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// Options or column specs failed to load from JSON.
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// Options or column specs failed to load from YAML.
    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl GridError {
    /// Returns `true` for configuration errors.
    pub fn is_configuration(&self) -> bool {
        matches!(self, GridError::Configuration(_))
    }

    /// Returns `true` for value conversion failures.
    pub fn is_conversion(&self) -> bool {
        matches!(self, GridError::Conversion(_))
    }
}

/// Result type for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;
