//! # Canonical Serialization
//!
//! [`CanonicalBytes`] is the only path from a report value to its JSON
//! bytes. Reports are snapshot-tested and diffed in code review, so two
//! builds over identical input must produce identical bytes.
//!
//! ## Rules
//!
//! 1. Reject floats. Counts and indices are integers; float formatting is
//!    the one place RFC 8785 output can drift between producers.
//! 2. Sort object keys lexicographically (RFC 8785 via `serde_jcs`).
//! 3. Compact separators, no trailing whitespace.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// UTF-8 JSON produced exclusively by RFC 8785 canonicalization.
///
/// The inner string is private; the only constructor is
/// [`CanonicalBytes::new()`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(String);

impl CanonicalBytes {
    /// Canonicalize any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::FloatRejected` if the value contains a
    /// non-integer number, `CanonicalizationError::SerializationFailed` if
    /// serialization fails.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        reject_floats(&value)?;
        Ok(Self(serde_jcs::to_string(&value)?))
    }

    /// The canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// The canonical JSON text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Re-render with indentation. Key order stays canonical because the
    /// workspace builds `serde_json` with `preserve_order`.
    pub fn to_pretty(&self) -> Result<String, CanonicalizationError> {
        let value: Value = serde_json::from_str(&self.0)?;
        Ok(serde_json::to_string_pretty(&value)?)
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

fn reject_floats(value: &Value) -> Result<(), CanonicalizationError> {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => Ok(()),
        Value::Number(n) => {
            if n.is_f64() {
                if let Some(f) = n.as_f64() {
                    return Err(CanonicalizationError::FloatRejected(f));
                }
            }
            Ok(())
        }
        Value::Object(map) => map.values().try_for_each(reject_floats),
        Value::Array(arr) => arr.iter().try_for_each(reject_floats),
    }
}
