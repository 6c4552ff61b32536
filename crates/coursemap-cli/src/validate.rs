//! # Validate Command
//!
//! Loads the canonical locale, discovers and loads every target locale,
//! checks them in parallel, prints the results and optionally writes one
//! JSON and one Markdown report per locale.
//!
//! Exit codes: `0` when every locale is ok or warn, `1` when any locale
//! fails, `2` when any locale (or the canonical one) cannot be loaded.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use coursemap_consistency::{check_all, Canonical, CheckOptions, LocaleOutcome, Report, Status};
use coursemap_core::{check_locale_tag, CanonicalBytes};
use coursemap_schema::{LoadErrors, SchemaRegistry, TreeLoader};
use serde::Serialize;

use crate::config::{FileConfig, OutputFormat, Settings};
use crate::sources::{discover_targets, ensure_distinct_locales, find_canonical};

/// Every locale is ok or warn.
pub const EXIT_OK: u8 = 0;
/// At least one locale failed.
pub const EXIT_FAIL: u8 = 1;
/// At least one locale could not be loaded.
pub const EXIT_LOAD_ERROR: u8 = 2;

/// Arguments for `validate-content`.
#[derive(Args, Debug, Default, Clone)]
pub struct ValidateArgs {
    /// Canonical locale tag (e.g. `en`); its document is the reference.
    #[arg(long)]
    pub canonical: Option<String>,

    /// Glob selecting target documents inside the locale directory.
    #[arg(long)]
    pub targets: Option<String>,

    /// Treat warnings as errors.
    #[arg(long)]
    pub strict: bool,

    /// Directory holding one document per locale [default: content].
    #[arg(long, value_name = "DIR")]
    pub locale_dir: Option<PathBuf>,

    /// Config file [default: coursemap.yaml in the project root].
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Write `<locale>.json` and `<locale>.md` reports into this directory.
    #[arg(long, value_name = "DIR")]
    pub report_dir: Option<PathBuf>,

    /// Number of worker threads [default: available parallelism].
    #[arg(long)]
    pub jobs: Option<usize>,
}

/// Execute the validate command. Returns the process exit code.
pub fn run_validate(args: &ValidateArgs, root: &Path) -> Result<u8> {
    let file = FileConfig::discover(args.config.as_deref(), root)?;
    let settings = Settings::resolve(args, file, root)?;
    tracing::info!(
        canonical = %settings.canonical,
        locale_dir = %settings.locale_dir.display(),
        jobs = settings.jobs,
        strict = settings.strict,
        "starting content validation"
    );

    let registry = SchemaRegistry::standard().context("loading bundled content schemas")?;
    let registry = match &settings.explorers {
        Some(explorers) => registry.with_explorers(explorers.iter().cloned()),
        None => registry,
    };
    let loader = TreeLoader::new(&registry);
    let options = CheckOptions {
        strict: settings.strict,
    };

    let canonical_source = find_canonical(&settings.locale_dir, &settings.canonical)?;
    let canonical_input = canonical_source.load(&loader);
    let canonical_tree = match canonical_input.tree {
        Ok(tree) => tree,
        Err(errors) => {
            let run = Run {
                canonical: None,
                outcomes: vec![LocaleOutcome::LoadFailed {
                    locale: settings.canonical.clone(),
                    errors,
                }],
            };
            print_run(&run, settings.format)?;
            return Ok(EXIT_LOAD_ERROR);
        }
    };
    let canonical = Canonical::new(settings.canonical.clone(), canonical_tree);

    let targets = discover_targets(&settings.locale_dir, &settings.targets, &canonical_source.path)?;
    if targets.is_empty() {
        tracing::warn!(pattern = %settings.targets, "no target locales matched");
    }
    let inputs: Vec<_> = targets.iter().map(|source| source.load(&loader)).collect();
    ensure_distinct_locales(&settings.canonical, &canonical_source.path, &targets, &inputs)?;

    let run = Run {
        canonical: Some(canonical.self_check(&options)),
        outcomes: check_all(&canonical, inputs, &options, settings.jobs),
    };

    print_run(&run, settings.format)?;
    if let Some(dir) = &settings.report_dir {
        write_reports(&run, dir)?;
    }
    Ok(run.exit_code())
}

/// Results of one run.
#[derive(Debug)]
pub struct Run {
    /// Invariant report for the canonical locale, if it loaded.
    pub canonical: Option<Report>,
    /// One outcome per target locale, in discovery order.
    pub outcomes: Vec<LocaleOutcome>,
}

impl Run {
    /// Every report produced, canonical first.
    pub fn reports(&self) -> impl Iterator<Item = &Report> {
        self.canonical
            .iter()
            .chain(self.outcomes.iter().filter_map(|outcome| match outcome {
                LocaleOutcome::Checked(report) => Some(report),
                LocaleOutcome::LoadFailed { .. } => None,
            }))
    }

    /// Load failures, as `(locale, errors)`.
    pub fn load_failures(&self) -> impl Iterator<Item = (&str, &LoadErrors)> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            LocaleOutcome::LoadFailed { locale, errors } => Some((locale.as_str(), errors)),
            LocaleOutcome::Checked(_) => None,
        })
    }

    /// Process exit code for this run.
    pub fn exit_code(&self) -> u8 {
        if self.canonical.is_none() || self.load_failures().next().is_some() {
            EXIT_LOAD_ERROR
        } else if self.reports().any(|report| report.status == Status::Fail) {
            EXIT_FAIL
        } else {
            EXIT_OK
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonRun<'a> {
    reports: Vec<&'a Report>,
    load_failures: Vec<JsonLoadFailure<'a>>,
}

#[derive(Serialize)]
struct JsonLoadFailure<'a> {
    locale: &'a str,
    errors: Vec<String>,
}

fn print_run(run: &Run, format: OutputFormat) -> Result<()> {
    let rendered = match format {
        OutputFormat::Text => render_text(run),
        OutputFormat::Json => render_json(run)?,
        OutputFormat::Markdown => render_markdown(run),
    };
    print!("{rendered}");
    Ok(())
}

/// Terminal rendering: a status line per locale, diagnostics indented.
pub fn render_text(run: &Run) -> String {
    let mut out = String::new();
    for report in run.reports() {
        let tag = match report.status {
            Status::Ok => "OK",
            Status::Warn => "WARN",
            Status::Fail => "FAIL",
        };
        let _ = writeln!(out, "{tag}: {}", report.summary_line());
        for diagnostic in &report.diagnostics {
            let _ = writeln!(out, "  {diagnostic}");
        }
    }
    for (locale, errors) in run.load_failures() {
        let _ = writeln!(out, "ERROR: {locale} could not be loaded ({} error(s))", errors.len());
        for error in errors.errors() {
            let _ = writeln!(out, "  {error}");
        }
    }
    out
}

/// A single canonical JSON document covering the whole run.
pub fn render_json(run: &Run) -> Result<String> {
    let doc = JsonRun {
        reports: run.reports().collect(),
        load_failures: run
            .load_failures()
            .map(|(locale, errors)| JsonLoadFailure {
                locale,
                errors: errors.errors().iter().map(ToString::to_string).collect(),
            })
            .collect(),
    };
    let bytes = CanonicalBytes::new(&doc).context("failed to serialize run")?;
    let mut pretty = bytes.to_pretty().context("failed to format run")?;
    pretty.push('\n');
    Ok(pretty)
}

/// Markdown rendering: one report section per locale.
pub fn render_markdown(run: &Run) -> String {
    let mut out = String::new();
    for report in run.reports() {
        out.push_str(&report.to_markdown());
        out.push('\n');
    }
    let failures: Vec<_> = run.load_failures().collect();
    if !failures.is_empty() {
        out.push_str("# Load failures\n\n");
        for (locale, errors) in failures {
            let _ = writeln!(out, "## `{locale}`\n");
            for error in errors.errors() {
                let _ = writeln!(out, "- {error}");
            }
            out.push('\n');
        }
    }
    out
}

/// Write `<locale>.json` (canonical bytes) and `<locale>.md` for every report.
pub fn write_reports(run: &Run, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create report dir {}", dir.display()))?;
    for report in run.reports() {
        check_locale_tag(&report.locale)
            .with_context(|| format!("refusing to write report for {:?}", report.locale))?;
        let json = report
            .to_canonical_json()
            .with_context(|| format!("failed to serialize report for {}", report.locale))?;
        let json_path = dir.join(format!("{}.json", report.locale));
        std::fs::write(&json_path, json.as_bytes())
            .with_context(|| format!("failed to write {}", json_path.display()))?;

        let md_path = dir.join(format!("{}.md", report.locale));
        std::fs::write(&md_path, report.to_markdown())
            .with_context(|| format!("failed to write {}", md_path.display()))?;
        tracing::debug!(locale = %report.locale, dir = %dir.display(), "wrote reports");
    }
    Ok(())
}
