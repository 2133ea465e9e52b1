//! Error types for payload validation.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while validating client-authored payloads.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A required field was missing or empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A field carried a value that contradicts another field.
    #[error("invalid field {field}: {reason}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value is invalid.
        reason: &'static str,
    },

    /// A coordinate failed range or finiteness checks.
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(#[from] fieldsync_geo::GeoError),

    /// A field exceeded its allowed length.
    #[error("field {field} exceeds {max} characters")]
    FieldTooLong {
        /// Name of the offending field.
        field: &'static str,
        /// Maximum allowed length.
        max: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            ModelError::MissingField("title").to_string(),
            "missing required field: title"
        );
        assert_eq!(
            ModelError::FieldTooLong {
                field: "description",
                max: 2000
            }
            .to_string(),
            "field description exceeds 2000 characters"
        );
    }
}
