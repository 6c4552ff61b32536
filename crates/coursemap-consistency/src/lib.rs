//! # coursemap-consistency — Cross-Locale Structural Checks
//!
//! Everything that runs after a locale has loaded:
//!
//! - `fingerprint`: order-independent structural summary of a tree, and the
//!   set of subtrees two fingerprints prove identical.
//! - `compare`: canonical-vs-locale comparison on an explicit work stack,
//!   emitting structural [`Diagnostic`](coursemap_core::Diagnostic)s.
//! - `invariants`: single-tree rules (answer bounds, duplicate ids,
//!   degenerate quizzes, blank text).
//! - `report`: sorted diagnostics, summary and status, rendered to
//!   canonical JSON or Markdown.
//! - `pipeline`: the per-locale sequence above, fanned out over scoped
//!   worker threads.
//!
//! Structural problems are data, never `Err`. The only failures a caller
//! sees come from loading (in `coursemap-schema`) and from serializing a
//! report.

pub mod compare;
pub mod fingerprint;
pub mod invariants;
pub mod pipeline;
pub mod props;
pub mod report;

#[cfg(test)]
mod fixtures;

pub use compare::{compare, Comparator};
pub use fingerprint::{fingerprint, Fingerprint, FingerprintDiff, PathSignature, SignatureKind};
pub use invariants::validate;
pub use pipeline::{check_all, check_locale, Canonical, CheckOptions, LocaleInput, LocaleOutcome};
pub use props::PropKind;
pub use report::{build, Report, ReportBuilder, Status, Summary};
