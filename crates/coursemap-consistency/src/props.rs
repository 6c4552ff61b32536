//! Shape vocabulary for explorer props.
//!
//! Props are free-form JSON whose *shape* is canonical: the same field
//! names, the same value kinds, the same array lengths. Values themselves
//! may be translated.

use std::fmt;

use serde_json::Value;

/// JSON kind of a prop value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropKind {
    /// `null`
    Null,
    /// `true` / `false`
    Bool,
    /// Any number.
    Number,
    /// A string.
    Text,
    /// An array.
    Array,
    /// An object.
    Object,
}

impl PropKind {
    /// Kind of a JSON value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::Text,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }
}

impl fmt::Display for PropKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Null => "null",
            Self::Bool => "boolean",
            Self::Number => "number",
            Self::Text => "string",
            Self::Array => "array",
            Self::Object => "object",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kinds_of_values() {
        assert_eq!(PropKind::of(&json!(null)), PropKind::Null);
        assert_eq!(PropKind::of(&json!(1)), PropKind::Number);
        assert_eq!(PropKind::of(&json!(1.5)), PropKind::Number);
        assert_eq!(PropKind::of(&json!("x")), PropKind::Text);
        assert_eq!(PropKind::of(&json!([])), PropKind::Array);
        assert_eq!(PropKind::of(&json!({})), PropKind::Object);
    }
}
