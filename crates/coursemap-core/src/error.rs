//! # Error Types
//!
//! Errors raised by the foundational types. All use `thiserror` for
//! derive-based `Display` and `Error` implementations.
//!
//! Structural mismatches between locales are never errors; they are
//! [`crate::Diagnostic`] values. The errors here cover malformed primitives
//! and serialization failures only.

use thiserror::Error;

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    /// Counts and indices must be integers.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Validation errors for domain primitive newtypes.
///
/// Each error carries the rejected input so content authors can find the
/// offending key without guesswork.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Identifier is empty or blank.
    #[error("invalid id: must be non-empty")]
    EmptyId,

    /// Identifier contains a character that would break path addressing.
    #[error("invalid id \"{value}\": must not contain {reason}")]
    InvalidIdCharacter {
        /// The rejected identifier.
        value: String,
        /// Which character class was found.
        reason: &'static str,
    },

    /// Locale tag outside `[A-Za-z0-9_-]+`.
    #[error("invalid locale tag \"{value}\": use ASCII letters, digits, '-' or '_'")]
    InvalidLocaleTag {
        /// The rejected tag.
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalization_error_float_rejected() {
        let err = CanonicalizationError::FloatRejected(2.5);
        let msg = format!("{err}");
        assert!(msg.contains("float values are not permitted"));
        assert!(msg.contains("2.5"));
    }

    #[test]
    fn validation_error_empty_id_display() {
        assert!(format!("{}", ValidationError::EmptyId).contains("non-empty"));
    }

    #[test]
    fn validation_error_invalid_character_display() {
        let err = ValidationError::InvalidIdCharacter {
            value: "intro.quiz".to_string(),
            reason: "'.'",
        };
        let msg = format!("{err}");
        assert!(msg.contains("intro.quiz"));
        assert!(msg.contains("'.'"));
    }
}
