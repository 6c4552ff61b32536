#![deny(missing_docs)]

//! # coursemap-core — Foundational Types for the Course Content Validator
//!
//! Every other crate in the workspace depends on this one; it depends on
//! nothing internal. Only `serde`, `serde_json`, `serde_jcs` and `thiserror`
//! from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Validated identifiers.** Course, module, lesson, block and question
//!    ids are [`EntityId`] values. An id can never contain the path
//!    separator, so every [`EntityPath`] is unambiguous.
//!
//! 2. **Ordered, keyed children.** Each level of the tree is a [`Keyed`]
//!    collection: lookup by id, iteration in authoring order. Set equality
//!    and order are checked separately by the comparator.
//!
//! 3. **Single [`ContentBlock`] sum type.** One variant per block kind,
//!    exhaustive `match` everywhere. Adding a block kind forces every
//!    consumer to handle it.
//!
//! 4. **Diagnostics are data.** Structural and invariant problems are
//!    [`Diagnostic`] values with a path, kind, severity and message. Only
//!    malformed input is an error.
//!
//! 5. **[`CanonicalBytes`] for reports.** Report JSON flows through RFC 8785
//!    canonicalization so identical reports are byte-identical.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `coursemap-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod diagnostic;
pub mod error;
pub mod identity;
pub mod keyed;
pub mod model;
pub mod path;

// Re-export primary types at crate root for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use diagnostic::{Diagnostic, DiagnosticClass, DiagnosticKind, Severity};
pub use error::{CanonicalizationError, ValidationError};
pub use identity::{check_locale_tag, EntityId};
pub use keyed::{Identified, Keyed};
pub use model::{
    BlockKind, ContentBlock, Course, CourseTree, ExplorerBlock, Lesson, Module, Question,
    QuizBlock, Step, TerminalBlock,
};
pub use path::EntityPath;
