//! # Report Builder
//!
//! Folds a locale's diagnostics into a [`Report`]: sorted diagnostics, a
//! per-kind and per-severity summary, and an overall [`Status`]. Building
//! is pure, and the JSON rendering goes through [`CanonicalBytes`], so the
//! same diagnostics always produce byte-identical output.

use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write as _;

use coursemap_core::{
    CanonicalBytes, CanonicalizationError, Diagnostic, DiagnosticKind, Severity,
};
use serde::Serialize;

/// Overall outcome for one locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// No diagnostics.
    Ok,
    /// Warnings only.
    Warn,
    /// At least one error.
    Fail,
}

impl Status {
    /// Status implied by a set of diagnostics.
    pub fn of(diagnostics: &[Diagnostic]) -> Self {
        if diagnostics.iter().any(Diagnostic::is_error) {
            Self::Fail
        } else if diagnostics.is_empty() {
            Self::Ok
        } else {
            Self::Warn
        }
    }

    /// Lowercase label used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warn => "warn",
            Self::Fail => "fail",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Count per diagnostic kind.
    pub by_kind: BTreeMap<DiagnosticKind, usize>,
    /// Count per severity.
    pub by_severity: BTreeMap<Severity, usize>,
}

impl Summary {
    fn tally(diagnostics: &[Diagnostic]) -> Self {
        let mut summary = Self::default();
        for diagnostic in diagnostics {
            *summary.by_kind.entry(diagnostic.kind).or_default() += 1;
            *summary.by_severity.entry(diagnostic.severity).or_default() += 1;
        }
        summary
    }

    /// Number of diagnostics with this severity.
    pub fn count(&self, severity: Severity) -> usize {
        self.by_severity.get(&severity).copied().unwrap_or(0)
    }
}

/// Structural report for one locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Locale tag.
    pub locale: String,
    /// Overall outcome.
    pub status: Status,
    /// Diagnostics sorted by path, kind, message.
    pub diagnostics: Vec<Diagnostic>,
    /// Counts by kind and severity.
    pub summary: Summary,
}

impl Report {
    /// Canonical JSON (sorted keys, no insignificant whitespace).
    pub fn to_canonical_json(&self) -> Result<CanonicalBytes, CanonicalizationError> {
        CanonicalBytes::new(self)
    }

    /// Indented JSON with the same key order as the canonical form.
    pub fn to_pretty_json(&self) -> Result<String, CanonicalizationError> {
        self.to_canonical_json()?.to_pretty()
    }

    /// Number of blocking diagnostics.
    pub fn error_count(&self) -> usize {
        self.summary.count(Severity::Error)
    }

    /// Number of non-blocking diagnostics.
    pub fn warning_count(&self) -> usize {
        self.summary.count(Severity::Warning)
    }

    /// One line for terminal output, e.g. `es: fail (2 errors, 1 warning)`.
    pub fn summary_line(&self) -> String {
        let (errors, warnings) = (self.error_count(), self.warning_count());
        format!(
            "{}: {} ({errors} error{}, {warnings} warning{})",
            self.locale,
            self.status,
            plural(errors),
            plural(warnings)
        )
    }

    /// Markdown rendering for review tooling.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        // Writing into a String cannot fail.
        let _ = writeln!(md, "# Structural report: `{}`\n", self.locale);
        let _ = writeln!(md, "**Status:** {}\n", self.status);

        if self.diagnostics.is_empty() {
            md.push_str("No diagnostics.\n");
            return md;
        }

        md.push_str("| Severity | Count |\n|---|---|\n");
        for (severity, count) in &self.summary.by_severity {
            let _ = writeln!(md, "| {severity} | {count} |");
        }
        md.push_str("\n| Kind | Count |\n|---|---|\n");
        for (kind, count) in &self.summary.by_kind {
            let _ = writeln!(md, "| {kind} | {count} |");
        }

        md.push_str("\n## Diagnostics\n\n| Path | Kind | Severity | Message |\n|---|---|---|---|\n");
        for d in &self.diagnostics {
            let _ = writeln!(
                md,
                "| {} | {} | {} | {} |",
                code_cell(&d.path.to_string()),
                d.kind,
                d.severity,
                escape_cell(&d.message)
            );
        }
        md
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// A code span whose fence is longer than any backtick run inside it.
fn code_cell(text: &str) -> String {
    let longest = text.split(|c| c != '`').map(str::len).max().unwrap_or(0);
    let fence = "`".repeat(longest + 1);
    let pad = if text.starts_with('`') || text.ends_with('`') {
        " "
    } else {
        ""
    };
    format!("{fence}{pad}{}{pad}{fence}", escape_cell(text))
}

/// Builds [`Report`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportBuilder {
    strict: bool,
}

impl ReportBuilder {
    /// A builder with default (non-strict) settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// In strict mode every warning is promoted to an error.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Fold diagnostics into a report.
    pub fn build(&self, locale: impl Into<String>, diagnostics: Vec<Diagnostic>) -> Report {
        let mut diagnostics: Vec<Diagnostic> = if self.strict {
            diagnostics.into_iter().map(Diagnostic::escalated).collect()
        } else {
            diagnostics
        };
        diagnostics.sort();

        Report {
            locale: locale.into(),
            status: Status::of(&diagnostics),
            summary: Summary::tally(&diagnostics),
            diagnostics,
        }
    }
}

/// Build a non-strict report.
pub fn build(locale: impl Into<String>, diagnostics: Vec<Diagnostic>) -> Report {
    ReportBuilder::new().build(locale, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use coursemap_core::EntityPath;
    use proptest::prelude::*;

    fn diag(kind: DiagnosticKind, path: &str, message: &str) -> Diagnostic {
        Diagnostic::new(kind, EntityPath::from(path), message)
    }

    fn mixed() -> Vec<Diagnostic> {
        vec![
            diag(DiagnosticKind::EmptyText, "c.m.l", "title is empty"),
            diag(DiagnosticKind::MissingInLocale, "c.m", "module `m` is missing"),
            diag(DiagnosticKind::AnswerIndexOutOfBounds, "c.m.l.q.a", "answerIndex 3 | 3"),
        ]
    }

    #[test]
    fn empty_report_is_ok() {
        let report = build("es", Vec::new());
        assert_eq!(report.status, Status::Ok);
        assert!(report.summary.by_kind.is_empty());
        assert_eq!(report.summary_line(), "es: ok (0 errors, 0 warnings)");
    }

    #[test]
    fn warnings_only_is_warn() {
        let report = build("es", vec![diag(DiagnosticKind::EmptyText, "c", "title is empty")]);
        assert_eq!(report.status, Status::Warn);
        assert_eq!(report.summary_line(), "es: warn (0 errors, 1 warning)");
    }

    #[test]
    fn any_error_is_fail() {
        let report = build("es", mixed());
        assert_eq!(report.status, Status::Fail);
        assert_eq!(report.error_count(), 2);
        assert_eq!(report.warning_count(), 1);
        assert_eq!(report.summary.by_kind[&DiagnosticKind::EmptyText], 1);
    }

    #[test]
    fn strict_promotes_warnings() {
        let report = ReportBuilder::new()
            .strict(true)
            .build("es", vec![diag(DiagnosticKind::EmptyText, "c", "title is empty")]);
        assert_eq!(report.status, Status::Fail);
        assert_eq!(report.diagnostics[0].severity, Severity::Error);
        assert_eq!(report.warning_count(), 0);
    }

    #[test]
    fn diagnostics_are_sorted_by_path() {
        let report = build("es", mixed());
        let paths: Vec<&str> = report.diagnostics.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["c.m", "c.m.l", "c.m.l.q.a"]);
    }

    #[test]
    fn canonical_json_layout() {
        let report = build("es", vec![diag(DiagnosticKind::MissingInLocale, "c.m", "gone")]);
        let json = report.to_canonical_json().expect("serializable");
        assert_eq!(
            json.as_str(),
            r#"{"diagnostics":[{"kind":"MissingInLocale","message":"gone","path":"c.m","severity":"error"}],"locale":"es","status":"fail","summary":{"byKind":{"MissingInLocale":1},"bySeverity":{"error":1}}}"#
        );
    }

    #[test]
    fn pretty_json_parses_back_to_same_value() {
        let report = build("es", mixed());
        let pretty = report.to_pretty_json().expect("serializable");
        let compact = report.to_canonical_json().expect("serializable");
        let a: serde_json::Value = serde_json::from_str(&pretty).expect("valid json");
        let b: serde_json::Value = serde_json::from_str(compact.as_str()).expect("valid json");
        assert_eq!(a, b);
        assert!(pretty.contains('\n'));
    }

    #[test]
    fn markdown_lists_diagnostics() {
        let md = build("es", mixed()).to_markdown();
        assert!(md.starts_with("# Structural report: `es`"));
        assert!(md.contains("**Status:** fail"));
        assert!(md.contains("| `c.m` | MissingInLocale | error | module `m` is missing |"));
        assert!(md.contains("answerIndex 3 \\| 3"));
        assert!(md.contains("| warning | 1 |"));
    }

    #[test]
    fn markdown_path_cell_survives_pipes_and_backticks() {
        let path = EntityPath::from("c.m.l.e1.props").key("a|b").key("x`y");
        let md = build("es", vec![Diagnostic::new(DiagnosticKind::ExtraInLocale, path, "extra")])
            .to_markdown();
        assert!(md.contains("| ``c.m.l.e1.props.a\\|b.x`y`` | ExtraInLocale | "), "{md}");
        assert_eq!(code_cell("`edge`"), "`` `edge` ``");
        assert_eq!(code_cell("plain"), "`plain`");
    }

    #[test]
    fn identical_diagnostics_are_all_kept() {
        let twice = vec![
            diag(DiagnosticKind::ExtraInLocale, "c.m.l.e1.props.k", "extra prop"),
            diag(DiagnosticKind::ExtraInLocale, "c.m.l.e1.props.k", "extra prop"),
        ];
        let report = build("es", twice);
        assert_eq!(report.diagnostics.len(), 2);
        assert_eq!(report.summary.by_kind[&DiagnosticKind::ExtraInLocale], 2);
    }

    #[test]
    fn markdown_for_clean_locale() {
        let md = build("pt-BR", Vec::new()).to_markdown();
        assert!(md.contains("**Status:** ok"));
        assert!(md.ends_with("No diagnostics.\n"));
    }

    fn arb_diagnostic() -> impl Strategy<Value = Diagnostic> {
        (
            prop::sample::select(DiagnosticKind::ALL.to_vec()),
            "[a-c](\\.[a-c]){0,3}",
            "[a-z ]{0,12}",
        )
            .prop_map(|(kind, path, message)| diag(kind, &path, &message))
    }

    proptest! {
        #[test]
        fn build_is_deterministic(diagnostics in prop::collection::vec(arb_diagnostic(), 0..20)) {
            let mut reversed = diagnostics.clone();
            reversed.reverse();
            let a = build("xx", diagnostics).to_canonical_json().expect("serializable");
            let b = build("xx", reversed).to_canonical_json().expect("serializable");
            prop_assert_eq!(a.as_bytes(), b.as_bytes());
        }

        #[test]
        fn status_matches_severities(diagnostics in prop::collection::vec(arb_diagnostic(), 0..20)) {
            let report = build("xx", diagnostics);
            let expected = if report.error_count() > 0 {
                Status::Fail
            } else if report.warning_count() > 0 {
                Status::Warn
            } else {
                Status::Ok
            };
            prop_assert_eq!(report.status, expected);
            prop_assert_eq!(
                report.summary.by_kind.values().sum::<usize>(),
                report.diagnostics.len()
            );
        }
    }
}
