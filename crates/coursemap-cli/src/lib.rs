//! # coursemap-cli — `validate-content`
//!
//! Command-line front end for the course content validator:
//!
//! ```bash
//! validate-content --canonical en
//! validate-content --canonical en --targets 'es.*' --strict --format json
//! validate-content --canonical en --report-dir reports -vv
//! ```
//!
//! ## Crate Policy
//!
//! - Argument parsing and configuration live here; checking lives in
//!   `coursemap-consistency`, loading in `coursemap-schema`.
//! - This crate is the only one that touches the filesystem.
//! - Operational failures are `anyhow` errors; content problems are
//!   reports and exit codes.

pub mod config;
pub mod sources;
pub mod validate;

use std::path::{Path, PathBuf};

/// Resolve a path that may be relative to the project root.
///
/// Absolute paths are returned as-is. A relative path that exists under
/// `root` is joined onto it; otherwise it is left relative to the current
/// directory.
pub fn resolve_path(path: &Path, root: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let rooted = root.join(path);
    if rooted.exists() {
        rooted
    } else {
        path.to_path_buf()
    }
}
