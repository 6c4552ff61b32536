//! # Locale Sources
//!
//! Finds locale documents on disk and loads them into course trees.
//! Read failures are reported as load errors for that locale, so one
//! unreadable file never stops the others from being checked.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use coursemap_core::CourseTree;
use coursemap_consistency::LocaleInput;
use coursemap_schema::{LoadError, LoadErrors, SourceFormat, TreeLoader};
use globset::Glob;
use walkdir::WalkDir;

/// Extensions tried, in order, when looking up the canonical document.
pub const EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// One locale document on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleSource {
    /// Path of the document.
    pub path: PathBuf,
    /// Format inferred from the extension.
    pub format: SourceFormat,
    /// File stem, the fallback locale tag.
    pub stem: String,
}

impl LocaleSource {
    /// Describe a file, or `None` if its extension is not a known format.
    pub fn from_path(path: &Path) -> Option<Self> {
        let format = SourceFormat::from_extension(path.extension()?.to_str()?)?;
        let stem = path.file_stem()?.to_str()?.to_string();
        Some(Self {
            path: path.to_path_buf(),
            format,
            stem,
        })
    }

    /// Read and load the document. The locale tag is the document's own
    /// `locale` field when present, otherwise the file stem.
    pub fn load(&self, loader: &TreeLoader<'_>) -> LocaleInput {
        let tree = self.read_tree(loader);
        let locale = tree
            .as_ref()
            .ok()
            .and_then(|tree| tree.locale.clone())
            .unwrap_or_else(|| self.stem.clone());
        LocaleInput { locale, tree }
    }

    fn read_tree(&self, loader: &TreeLoader<'_>) -> Result<CourseTree, LoadErrors> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| LoadError::Unreadable {
            source_name: self.path.display().to_string(),
            reason: e.to_string(),
        })?;
        loader.load_str(&text, self.format)
    }
}

/// Locate `<locale_dir>/<locale>.{json,yaml,yml}`.
pub fn find_canonical(locale_dir: &Path, locale: &str) -> Result<LocaleSource> {
    for ext in EXTENSIONS {
        let path = locale_dir.join(format!("{locale}.{ext}"));
        if path.is_file() {
            if let Some(source) = LocaleSource::from_path(&path) {
                return Ok(source);
            }
        }
    }
    bail!(
        "canonical locale `{locale}` not found: expected {}/{locale}.{{{}}}",
        locale_dir.display(),
        EXTENSIONS.join(",")
    )
}

/// Fail when two documents resolve to the same locale tag.
///
/// Reports are written as `<locale>.json`, so a shared tag would let one
/// document's report overwrite another's.
pub fn ensure_distinct_locales(
    canonical: &str,
    canonical_path: &Path,
    targets: &[LocaleSource],
    inputs: &[LocaleInput],
) -> Result<()> {
    let mut seen: BTreeMap<&str, &Path> = BTreeMap::new();
    seen.insert(canonical, canonical_path);
    for (source, input) in targets.iter().zip(inputs) {
        if let Some(first) = seen.insert(input.locale.as_str(), &source.path) {
            bail!(
                "locale `{}` is claimed by both {} and {}",
                input.locale,
                first.display(),
                source.path.display()
            );
        }
    }
    Ok(())
}

/// Every document under `locale_dir` whose relative path matches
/// `pattern`, except the canonical document. Sorted by path.
pub fn discover_targets(
    locale_dir: &Path,
    pattern: &str,
    canonical: &Path,
) -> Result<Vec<LocaleSource>> {
    let matcher = Glob::new(pattern)
        .with_context(|| format!("invalid target glob: {pattern:?}"))?
        .compile_matcher();

    let mut targets = Vec::new();
    for entry in WalkDir::new(locale_dir).follow_links(false).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walk locale dir: {}", locale_dir.display()))?;
        if !entry.file_type().is_file() || entry.path() == canonical {
            continue;
        }
        let rel = entry.path().strip_prefix(locale_dir).unwrap_or(entry.path());
        if !matcher.is_match(rel) {
            continue;
        }
        match LocaleSource::from_path(entry.path()) {
            Some(source) => targets.push(source),
            None => tracing::warn!(
                path = %entry.path().display(),
                "skipping target with unknown extension"
            ),
        }
    }

    tracing::debug!(count = targets.len(), pattern, "discovered targets");
    Ok(targets)
}
