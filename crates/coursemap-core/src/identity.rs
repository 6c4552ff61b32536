//! # Entity Identifiers
//!
//! Courses, modules, lessons, blocks and questions are addressed by slug
//! ids. Paths are dot-joined id chains, so an id must never contain `.`;
//! whitespace is rejected because it is always an authoring mistake.
//!
//! Locale tags (`en`, `pt-BR`) also name report files, so they are limited
//! to ASCII letters, digits, `-` and `_`.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A validated entity id (course slug, module id, lesson id, block id, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

impl EntityId {
    /// Validate and wrap an identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyId`] for an empty string and
    /// [`ValidationError::InvalidIdCharacter`] if the id contains `.` or
    /// whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if value.contains('.') {
            return Err(ValidationError::InvalidIdCharacter {
                value,
                reason: "'.'",
            });
        }
        if value.chars().any(char::is_whitespace) {
            return Err(ValidationError::InvalidIdCharacter {
                value,
                reason: "whitespace",
            });
        }
        Ok(Self(value))
    }

    /// Access the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EntityId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for EntityId {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Check a locale tag: non-empty, ASCII letters, digits, `-` and `_` only.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidLocaleTag`] otherwise.
pub fn check_locale_tag(tag: &str) -> Result<(), ValidationError> {
    let legal = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_';
    if !tag.is_empty() && tag.chars().all(legal) {
        Ok(())
    } else {
        Err(ValidationError::InvalidLocaleTag {
            value: tag.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_slugs() {
        for ok in ["solana-basics", "m1", "lesson_3", "PDA", "0"] {
            assert!(EntityId::new(ok).is_ok(), "{ok} should be accepted");
        }
    }

    #[test]
    fn rejects_empty_and_blank() {
        assert_eq!(EntityId::new(""), Err(ValidationError::EmptyId));
        assert_eq!(EntityId::new("   "), Err(ValidationError::EmptyId));
    }

    #[test]
    fn rejects_path_separator() {
        assert!(matches!(
            EntityId::new("intro.quiz"),
            Err(ValidationError::InvalidIdCharacter { .. })
        ));
    }

    #[test]
    fn rejects_inner_whitespace() {
        assert!(matches!(
            EntityId::new("intro quiz"),
            Err(ValidationError::InvalidIdCharacter { reason: "whitespace", .. })
        ));
    }

    #[test]
    fn serde_round_trip_validates() {
        let id: EntityId = serde_json::from_str("\"m1\"").unwrap();
        assert_eq!(id.as_str(), "m1");
        assert!(serde_json::from_str::<EntityId>("\"a.b\"").is_err());
    }

    #[test]
    fn locale_tags() {
        for ok in ["en", "pt-BR", "zh_Hant", "es419"] {
            assert!(check_locale_tag(ok).is_ok(), "{ok} should be accepted");
        }
        for bad in ["", "../escaped", "a/b", "a\\b", "..", "en.json", "pt BR", "ру"] {
            assert_eq!(
                check_locale_tag(bad),
                Err(ValidationError::InvalidLocaleTag { value: bad.to_string() }),
                "{bad:?} should be rejected"
            );
        }
    }
}
