//! # validate-content entry point
//!
//! Parses arguments, sets up logging, and runs the validate command.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use coursemap_cli::config::DEFAULT_CONFIG_FILE;
use coursemap_cli::validate::{run_validate, ValidateArgs, EXIT_LOAD_ERROR};

/// Check every locale's course content against the canonical locale.
///
/// Reports ids that are missing or extra, blocks of the wrong type, lists
/// of the wrong length, reordered siblings, and broken quiz invariants.
#[derive(Parser, Debug)]
#[command(name = "validate-content", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(flatten)]
    validate: ValidateArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let root = resolve_project_root().unwrap_or_else(|| {
        tracing::debug!("no {DEFAULT_CONFIG_FILE} found above the current directory");
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    });
    tracing::debug!(root = %root.display(), "resolved project root");

    match run_validate(&cli.validate, &root) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_LOAD_ERROR)
        }
    }
}

/// Walk up from the current directory to the nearest `coursemap.yaml`.
fn resolve_project_root() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    let mut dir = cwd.as_path();
    loop {
        if dir.join(DEFAULT_CONFIG_FILE).is_file() {
            return Some(dir.to_path_buf());
        }
        dir = dir.parent()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coursemap_cli::config::OutputFormat;

    #[test]
    fn parse_minimal() {
        let cli = Cli::try_parse_from(["validate-content", "--canonical", "en"]).unwrap();
        assert_eq!(cli.validate.canonical.as_deref(), Some("en"));
        assert!(!cli.validate.strict);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn parse_everything() {
        let cli = Cli::try_parse_from([
            "validate-content",
            "--canonical",
            "en",
            "--targets",
            "es.*",
            "--strict",
            "--locale-dir",
            "i18n",
            "--config",
            "ci.yaml",
            "--format",
            "markdown",
            "--report-dir",
            "out",
            "--jobs",
            "4",
            "-vv",
        ])
        .unwrap();
        let args = cli.validate;
        assert_eq!(args.targets.as_deref(), Some("es.*"));
        assert!(args.strict);
        assert_eq!(args.locale_dir, Some(PathBuf::from("i18n")));
        assert_eq!(args.config, Some(PathBuf::from("ci.yaml")));
        assert_eq!(args.format, Some(OutputFormat::Markdown));
        assert_eq!(args.report_dir, Some(PathBuf::from("out")));
        assert_eq!(args.jobs, Some(4));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["validate-content", "--format", "xml"]).is_err());
    }
}
