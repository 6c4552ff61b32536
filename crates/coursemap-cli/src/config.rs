//! # Configuration
//!
//! `validate-content` reads an optional YAML file (`coursemap.yaml` in the
//! project root, or the path given with `--config`). Every field is
//! optional. Command-line flags override file values, and built-in
//! defaults fill whatever is still unset.
//!
//! ```yaml
//! locale_dir: content
//! canonical: en
//! targets: "*.{json,yaml,yml}"
//! strict: false
//! format: text
//! report_dir: reports
//! jobs: 4
//! explorers: [AccountExplorer, PDADerivationExplorer]
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use coursemap_core::check_locale_tag;
use serde::Deserialize;

use crate::resolve_path;
use crate::validate::ValidateArgs;

/// Config file looked up in the project root when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "coursemap.yaml";

/// Directory holding one document per locale.
pub const DEFAULT_LOCALE_DIR: &str = "content";

/// Target pattern used when none is configured.
pub const DEFAULT_TARGETS: &str = "*.{json,yaml,yml}";

/// How results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One status line per locale plus its diagnostics.
    #[default]
    Text,
    /// A single canonical JSON document.
    Json,
    /// Markdown, one section per locale.
    Markdown,
}

/// Contents of the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Directory holding the locale documents.
    pub locale_dir: Option<PathBuf>,
    /// Canonical locale tag.
    pub canonical: Option<String>,
    /// Glob selecting target documents inside the locale directory.
    pub targets: Option<String>,
    /// Promote warnings to errors.
    pub strict: Option<bool>,
    /// Output format.
    pub format: Option<OutputFormat>,
    /// Where per-locale report files are written.
    pub report_dir: Option<PathBuf>,
    /// Worker thread count.
    pub jobs: Option<usize>,
    /// Allowed explorer variants. Any variant is accepted when unset.
    pub explorers: Option<Vec<String>>,
}

impl FileConfig {
    /// Parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        // An empty file is a valid, empty config.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    /// Load the explicit config file, or `coursemap.yaml` in `root` if it
    /// exists, or nothing.
    pub fn discover(explicit: Option<&Path>, root: &Path) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(&resolve_path(path, root)),
            None => {
                let default = root.join(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    tracing::debug!(path = %default.display(), "using project config");
                    Self::load(&default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory holding the locale documents.
    pub locale_dir: PathBuf,
    /// Canonical locale tag.
    pub canonical: String,
    /// Glob selecting target documents.
    pub targets: String,
    /// Promote warnings to errors.
    pub strict: bool,
    /// Output format.
    pub format: OutputFormat,
    /// Where per-locale report files are written, if anywhere.
    pub report_dir: Option<PathBuf>,
    /// Worker thread count (at least 1).
    pub jobs: usize,
    /// Allowed explorer variants.
    pub explorers: Option<Vec<String>>,
}

impl Settings {
    /// Merge flags over the file config over defaults. Relative paths are
    /// resolved against `root`.
    pub fn resolve(args: &ValidateArgs, file: FileConfig, root: &Path) -> Result<Self> {
        let Some(canonical) = args.canonical.clone().or(file.canonical) else {
            bail!("no canonical locale: pass --canonical or set `canonical` in {DEFAULT_CONFIG_FILE}");
        };
        check_locale_tag(&canonical).context("bad canonical locale")?;

        let locale_dir = args
            .locale_dir
            .clone()
            .or(file.locale_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOCALE_DIR));
        let report_dir = args.report_dir.clone().or(file.report_dir);
        let jobs = args
            .jobs
            .or(file.jobs)
            .unwrap_or_else(default_jobs)
            .max(1);

        Ok(Self {
            locale_dir: resolve_path(&locale_dir, root),
            canonical,
            targets: args
                .targets
                .clone()
                .or(file.targets)
                .unwrap_or_else(|| DEFAULT_TARGETS.to_string()),
            strict: args.strict || file.strict.unwrap_or(false),
            format: args.format.or(file.format).unwrap_or_default(),
            report_dir: report_dir.map(|dir| root.join(dir)),
            jobs,
            explorers: file.explorers,
        })
    }
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
