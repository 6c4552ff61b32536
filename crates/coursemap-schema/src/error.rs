//! # Load Errors
//!
//! A locale that does not shape-check cannot be compared at all, so shape
//! violations are fatal for that locale. They are still accumulated: one
//! load pass reports every malformed node it can reach, each with the path
//! of the node, the entity kind expected there, and what was wrong.

use std::fmt;

use coursemap_core::EntityPath;
use thiserror::Error;

use crate::loader::SourceFormat;
use crate::registry::{EntityKind, FieldType};

/// What was wrong with a raw node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeProblem {
    /// The node is not a JSON object.
    NotAnObject {
        /// JSON type actually found.
        found: &'static str,
    },
    /// A required field is absent (or `null`).
    MissingField {
        /// Field name.
        field: String,
    },
    /// A field has the wrong JSON type.
    WrongType {
        /// Field name, with an element index for list members.
        field: String,
        /// Type the registry expects.
        expected: FieldType,
        /// JSON type actually found.
        found: &'static str,
    },
    /// A block `type` discriminant the registry does not know.
    UnknownDiscriminant {
        /// The discriminant found.
        found: String,
    },
    /// An explorer variant outside the configured allow-list.
    UnknownExplorer {
        /// The variant found.
        found: String,
    },
    /// An id that cannot be used as a path segment.
    InvalidId {
        /// The rejected id.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
    /// A document `locale` tag that is not a safe file stem.
    InvalidLocale {
        /// The rejected tag.
        value: String,
    },
    /// Any other schema rule the node breaks.
    Violation {
        /// Offending field, empty for the node itself.
        field: String,
        /// Validator message.
        message: String,
    },
    /// An inner `id` field that disagrees with its map key.
    IdKeyMismatch {
        /// The map key.
        key: String,
        /// The inner `id` value.
        id: String,
    },
}

impl fmt::Display for ShapeProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject { found } => write!(f, "expected an object, found {found}"),
            Self::MissingField { field } => write!(f, "missing required field `{field}`"),
            Self::WrongType {
                field,
                expected,
                found,
            } => write!(f, "field `{field}` must be {expected}, found {found}"),
            Self::UnknownDiscriminant { found } => {
                write!(f, "unknown block type \"{found}\" (expected quiz, explorer or terminal)")
            }
            Self::UnknownExplorer { found } => write!(f, "unknown explorer variant \"{found}\""),
            Self::InvalidId { value, reason } => write!(f, "invalid id \"{value}\": {reason}"),
            Self::InvalidLocale { value } => write!(
                f,
                "invalid locale tag \"{value}\" (use ASCII letters, digits, '-' or '_')"
            ),
            Self::Violation { field, message } if field.is_empty() => f.write_str(message),
            Self::Violation { field, message } => write!(f, "field `{field}`: {message}"),
            Self::IdKeyMismatch { key, id } => {
                write!(f, "inner id \"{id}\" does not match its key \"{key}\"")
            }
        }
    }
}

/// A bundled schema that does not parse or compile.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("schema {name} is invalid: {reason}")]
pub struct SchemaError {
    /// Schema name.
    pub name: &'static str,
    /// Parser or compiler message.
    pub reason: String,
}

/// A shape violation at one node.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{path}: {kind}: {problem}")]
pub struct ShapeError {
    /// Address of the malformed node.
    pub path: EntityPath,
    /// Entity kind expected at that address.
    pub kind: EntityKind,
    /// What was wrong.
    pub problem: ShapeProblem,
}

impl ShapeError {
    /// Create a shape error.
    pub fn new(path: EntityPath, kind: EntityKind, problem: ShapeProblem) -> Self {
        Self {
            path,
            kind,
            problem,
        }
    }
}

/// Why a locale could not be loaded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The document could not be read at all.
    #[error("cannot read {source_name}: {reason}")]
    Unreadable {
        /// File name or other label of the document.
        source_name: String,
        /// Underlying I/O message.
        reason: String,
    },

    /// The document text is not valid JSON/YAML.
    #[error("{format} parse error: {reason}")]
    Parse {
        /// Format the text was parsed as.
        format: SourceFormat,
        /// Parser message.
        reason: String,
    },

    /// The document parsed but does not match the registry.
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

/// Every load error found during one pass.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct LoadErrors(Vec<LoadError>);

impl LoadErrors {
    /// Wrap a non-empty error list.
    pub fn new(errors: Vec<LoadError>) -> Self {
        Self(errors)
    }

    /// Returns the number of errors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no errors.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a slice of all errors.
    pub fn errors(&self) -> &[LoadError] {
        &self.0
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<LoadError> {
        self.0
    }
}

impl From<LoadError> for LoadErrors {
    fn from(err: LoadError) -> Self {
        Self(vec![err])
    }
}

impl fmt::Display for LoadErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} load error(s)", self.0.len())?;
        for err in &self.0 {
            write!(f, "\n  {err}")?;
        }
        Ok(())
    }
}
