//! # coursemap-schema — Schema Registry & Tree Loader
//!
//! Turns raw per-locale content documents into typed course trees.
//!
//! ## Schema Registry (`registry`)
//!
//! [`SchemaRegistry`] compiles one bundled JSON Schema per entity and block
//! variant (`schemas/*.schema.json`) with `jsonschema` and maps validator
//! errors onto [`ShapeProblem`]. Block variants are dispatched on the `type`
//! discriminant; unknown discriminants are hard shape errors.
//!
//! ## Tree Loader (`loader`)
//!
//! [`TreeLoader::load`] walks a raw [`serde_json::Value`] once, checks every
//! node against the registry, and either returns the typed
//! [`coursemap_core::CourseTree`] or every violation it found
//! ([`LoadErrors`]). JSON and YAML text are accepted through
//! [`parse_document`].
//!
//! ## Crate Policy
//!
//! - Depends only on `coursemap-core` internally.
//! - No filesystem or network access. Callers supply document text.
//! - Shape validation is a trust boundary: nothing downstream sees a tree
//!   that did not pass it.

pub mod error;
pub mod loader;
pub mod registry;

pub use error::{LoadError, LoadErrors, SchemaError, ShapeError, ShapeProblem};
pub use loader::{parse_document, SourceFormat, TreeLoader};
pub use registry::{EntityKind, FieldType, SchemaRegistry};
