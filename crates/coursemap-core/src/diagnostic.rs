//! # Diagnostics
//!
//! One [`Diagnostic`] per structural or invariant violation. The comparator
//! and the invariant validator both emit this shape so the report builder
//! can merge them uniformly.
//!
//! Diagnostics order by path first (lexicographic), then kind, then
//! message. Report output is sorted with this ordering, which makes it
//! stable across runs and diffable in review.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::path::EntityPath;

/// How a diagnostic affects the locale's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocking: the locale fails.
    Error,
    /// Non-blocking unless strict mode promotes it.
    Warning,
}

impl Severity {
    /// Lowercase label used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which component a diagnostic kind belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticClass {
    /// Canonical-vs-locale comparison.
    Structural,
    /// Single-tree self-consistency.
    Invariant,
}

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Present in the canonical tree, absent in the locale.
    MissingInLocale,
    /// Present in the locale, absent in the canonical tree.
    ExtraInLocale,
    /// Same id, different block discriminant, explorer variant or prop kind.
    TypeMismatch,
    /// Same id, different array length.
    CardinalityMismatch,
    /// Same id set, different relative order.
    OrderMismatch,
    /// Same question, different correct option.
    AnswerIndexMismatch,
    /// `answerIndex` outside the question's own options.
    AnswerIndexOutOfBounds,
    /// Id repeated within a lesson scope.
    DuplicateId,
    /// Question with fewer than two options.
    DegenerateQuiz,
    /// Required display text is empty.
    EmptyText,
}

impl DiagnosticKind {
    /// Every kind, in declaration order.
    pub const ALL: [DiagnosticKind; 10] = [
        Self::MissingInLocale,
        Self::ExtraInLocale,
        Self::TypeMismatch,
        Self::CardinalityMismatch,
        Self::OrderMismatch,
        Self::AnswerIndexMismatch,
        Self::AnswerIndexOutOfBounds,
        Self::DuplicateId,
        Self::DegenerateQuiz,
        Self::EmptyText,
    ];

    /// Name used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingInLocale => "MissingInLocale",
            Self::ExtraInLocale => "ExtraInLocale",
            Self::TypeMismatch => "TypeMismatch",
            Self::CardinalityMismatch => "CardinalityMismatch",
            Self::OrderMismatch => "OrderMismatch",
            Self::AnswerIndexMismatch => "AnswerIndexMismatch",
            Self::AnswerIndexOutOfBounds => "AnswerIndexOutOfBounds",
            Self::DuplicateId => "DuplicateId",
            Self::DegenerateQuiz => "DegenerateQuiz",
            Self::EmptyText => "EmptyText",
        }
    }

    /// Severity a freshly emitted diagnostic of this kind carries.
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::EmptyText => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Component that emits this kind.
    pub fn class(&self) -> DiagnosticClass {
        match self {
            Self::MissingInLocale
            | Self::ExtraInLocale
            | Self::TypeMismatch
            | Self::CardinalityMismatch
            | Self::OrderMismatch
            | Self::AnswerIndexMismatch => DiagnosticClass::Structural,
            Self::AnswerIndexOutOfBounds
            | Self::DuplicateId
            | Self::DegenerateQuiz
            | Self::EmptyText => DiagnosticClass::Invariant,
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single reported violation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Address of the offending node.
    pub path: EntityPath,
    /// What went wrong.
    pub kind: DiagnosticKind,
    /// Blocking or not.
    pub severity: Severity,
    /// Human-readable detail.
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic with the kind's default severity.
    pub fn new(kind: DiagnosticKind, path: EntityPath, message: impl Into<String>) -> Self {
        Self {
            path,
            kind,
            severity: kind.default_severity(),
            message: message.into(),
        }
    }

    /// Returns true for blocking diagnostics.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Promote a warning to an error (strict mode).
    pub fn escalated(mut self) -> Self {
        self.severity = Severity::Error;
        self
    }
}

impl Ord for Diagnostic {
    fn cmp(&self, other: &Self) -> Ordering {
        self.path
            .cmp(&other.path)
            .then_with(|| self.kind.cmp(&other.kind))
            .then_with(|| self.message.cmp(&other.message))
            .then_with(|| self.severity.cmp(&other.severity))
    }
}

impl PartialOrd for Diagnostic {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}: {}",
            self.severity, self.kind, self.path, self.message
        )
    }
}
