//! # Locale Pipeline
//!
//! Per-locale check: fingerprint, compare against the canonical tree,
//! validate invariants, build the report. [`check_all`] fans independent
//! locales out over a bounded set of scoped worker threads. The canonical
//! tree and its fingerprint are computed once and shared by reference;
//! workers own nothing but their share of the inputs.

use std::thread;

use coursemap_core::CourseTree;
use coursemap_schema::LoadErrors;

use crate::compare::Comparator;
use crate::fingerprint::{fingerprint, Fingerprint};
use crate::invariants::validate;
use crate::report::{Report, ReportBuilder, Status};

/// Knobs shared by every locale in a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckOptions {
    /// Promote warnings to errors.
    pub strict: bool,
}

impl CheckOptions {
    fn builder(&self) -> ReportBuilder {
        ReportBuilder::new().strict(self.strict)
    }
}

/// The reference tree every locale is compared against.
#[derive(Debug, Clone)]
pub struct Canonical {
    locale: String,
    tree: CourseTree,
    fingerprint: Fingerprint,
}

impl Canonical {
    /// Wrap the canonical tree and fingerprint it.
    pub fn new(locale: impl Into<String>, tree: CourseTree) -> Self {
        let fingerprint = fingerprint(&tree);
        Self {
            locale: locale.into(),
            tree,
            fingerprint,
        }
    }

    /// Canonical locale tag.
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// The canonical tree.
    pub fn tree(&self) -> &CourseTree {
        &self.tree
    }

    /// Fingerprint of the canonical tree.
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Invariant report for the canonical tree itself.
    pub fn self_check(&self, options: &CheckOptions) -> Report {
        options.builder().build(self.locale.clone(), validate(&self.tree))
    }
}

/// One target locale as handed to the pipeline.
#[derive(Debug)]
pub struct LocaleInput {
    /// Locale tag.
    pub locale: String,
    /// The loaded tree, or why it could not be loaded.
    pub tree: Result<CourseTree, LoadErrors>,
}

/// What happened to one target locale.
#[derive(Debug, Clone, PartialEq)]
pub enum LocaleOutcome {
    /// The locale loaded and was checked.
    Checked(Report),
    /// The locale could not be loaded; nothing was compared.
    LoadFailed {
        /// Locale tag.
        locale: String,
        /// Every load error found.
        errors: LoadErrors,
    },
}

impl LocaleOutcome {
    /// Locale tag.
    pub fn locale(&self) -> &str {
        match self {
            Self::Checked(report) => &report.locale,
            Self::LoadFailed { locale, .. } => locale,
        }
    }

    /// Report status, `None` for load failures.
    pub fn status(&self) -> Option<Status> {
        match self {
            Self::Checked(report) => Some(report.status),
            Self::LoadFailed { .. } => None,
        }
    }
}

/// Check one loaded locale against the canonical tree.
pub fn check_locale(
    canonical: &Canonical,
    locale: &str,
    target: &CourseTree,
    options: &CheckOptions,
) -> Report {
    let comparator = Comparator::with_fingerprints(canonical.fingerprint(), &fingerprint(target));
    let mut diagnostics = comparator.compare(canonical.tree(), target);
    diagnostics.extend(validate(target));

    let report = options.builder().build(locale, diagnostics);
    tracing::info!(
        locale = %report.locale,
        status = %report.status,
        errors = report.error_count(),
        warnings = report.warning_count(),
        "locale checked"
    );
    report
}

fn check_input(canonical: &Canonical, input: LocaleInput, options: &CheckOptions) -> LocaleOutcome {
    match input.tree {
        Ok(tree) => LocaleOutcome::Checked(check_locale(canonical, &input.locale, &tree, options)),
        Err(errors) => {
            tracing::warn!(locale = %input.locale, count = errors.len(), "locale failed to load");
            LocaleOutcome::LoadFailed {
                locale: input.locale,
                errors,
            }
        }
    }
}

/// Check every target, using up to `jobs` worker threads.
///
/// Outcomes come back in input order. `jobs` of 0 is treated as 1.
pub fn check_all(
    canonical: &Canonical,
    inputs: Vec<LocaleInput>,
    options: &CheckOptions,
    jobs: usize,
) -> Vec<LocaleOutcome> {
    let total = inputs.len();
    let workers = jobs.clamp(1, total.max(1));
    tracing::debug!(targets = total, workers, "checking locales");

    if workers == 1 {
        return inputs
            .into_iter()
            .map(|input| check_input(canonical, input, options))
            .collect();
    }

    let mut buckets: Vec<Vec<(usize, LocaleInput)>> = (0..workers).map(|_| Vec::new()).collect();
    for (position, input) in inputs.into_iter().enumerate() {
        buckets[position % workers].push((position, input));
    }

    let mut slots: Vec<Option<LocaleOutcome>> = (0..total).map(|_| None).collect();
    thread::scope(|scope| {
        let handles: Vec<_> = buckets
            .into_iter()
            .map(|bucket| {
                scope.spawn(move || {
                    bucket
                        .into_iter()
                        .map(|(position, input)| (position, check_input(canonical, input, options)))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for handle in handles {
            match handle.join() {
                Ok(results) => {
                    for (position, outcome) in results {
                        slots[position] = Some(outcome);
                    }
                }
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
    });

    slots.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::compare;
    use crate::fixtures::{self, blocks_mut, document};
    use crate::report::build;
    use coursemap_core::DiagnosticKind;
    use proptest::prelude::*;
    use coursemap_schema::{LoadError, SourceFormat};
    use serde_json::json;

    fn canonical() -> Canonical {
        Canonical::new("en", fixtures::load(&document()))
    }

    fn input(locale: &str, raw: &serde_json::Value) -> LocaleInput {
        LocaleInput {
            locale: locale.to_string(),
            tree: Ok(fixtures::load(raw)),
        }
    }

    fn broken(locale: &str) -> LocaleInput {
        LocaleInput {
            locale: locale.to_string(),
            tree: Err(LoadErrors::from(LoadError::Parse {
                format: SourceFormat::Json,
                reason: "EOF while parsing".into(),
            })),
        }
    }

    #[test]
    fn clean_locale_is_ok() {
        let report = check_locale(&canonical(), "es", &fixtures::load(&document()), &CheckOptions::default());
        assert_eq!(report.status, Status::Ok);
        assert_eq!(report.locale, "es");
    }

    #[test]
    fn structural_and_invariant_diagnostics_are_merged() {
        let mut raw = document();
        blocks_mut(&mut raw)[0]["questions"][0]["answerIndex"] = json!(3);
        let report = check_locale(&canonical(), "es", &fixtures::load(&raw), &CheckOptions::default());
        let kinds: Vec<DiagnosticKind> = report.diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![DiagnosticKind::AnswerIndexMismatch, DiagnosticKind::AnswerIndexOutOfBounds]
        );
        assert_eq!(report.status, Status::Fail);
    }

    #[test]
    fn dotted_prop_key_drift_fails_the_locale() {
        let canonical = Canonical::new(
            "en",
            fixtures::load(&fixtures::document_with_props(json!({"a.b": 1, "a": {}}))),
        );
        let target = fixtures::load(&fixtures::document_with_props(json!({"a": {"b": 1}})));
        assert_ne!(canonical.fingerprint(), &fingerprint(&target));

        let report = check_locale(&canonical, "es", &target, &CheckOptions::default());
        assert_eq!(report.status, Status::Fail);
        let found: Vec<(&str, DiagnosticKind)> = report
            .diagnostics
            .iter()
            .map(|d| (d.path.as_str(), d.kind))
            .collect();
        assert_eq!(
            found,
            vec![
                ("course.module.lesson.e1.props.a%2Eb", DiagnosticKind::MissingInLocale),
                ("course.module.lesson.e1.props.a.b", DiagnosticKind::ExtraInLocale),
            ]
        );
    }

    fn unhinted(canonical: &Canonical, target: &CourseTree) -> Report {
        let mut diagnostics = compare(canonical.tree(), target);
        diagnostics.extend(validate(target));
        build("es", diagnostics)
    }

    proptest! {
        #[test]
        fn check_locale_agrees_with_plain_compare_over_props(
            a in fixtures::arb_props(),
            b in fixtures::arb_props(),
        ) {
            let canonical = Canonical::new("en", fixtures::load(&fixtures::document_with_props(a)));
            let target = fixtures::load(&fixtures::document_with_props(b));
            let report = check_locale(&canonical, "es", &target, &CheckOptions::default());
            prop_assert_eq!(report, unhinted(&canonical, &target));
        }

        #[test]
        fn check_locale_agrees_with_plain_compare_over_documents(
            a in fixtures::arb_document(),
            b in fixtures::arb_document(),
        ) {
            let canonical = Canonical::new("en", fixtures::load(&a));
            let target = fixtures::load(&b);
            let report = check_locale(&canonical, "es", &target, &CheckOptions::default());
            prop_assert_eq!(report, unhinted(&canonical, &target));
        }
    }

    #[test]
    fn strict_option_applies() {
        let mut raw = document();
        blocks_mut(&mut raw)[2]["steps"][0]["cmd"] = json!(" ");
        let tree = fixtures::load(&raw);
        let lenient = check_locale(&canonical(), "es", &tree, &CheckOptions::default());
        let strict = check_locale(&canonical(), "es", &tree, &CheckOptions { strict: true });
        assert_eq!(lenient.status, Status::Warn);
        assert_eq!(strict.status, Status::Fail);
    }

    #[test]
    fn canonical_self_check_runs_invariants() {
        let mut raw = document();
        blocks_mut(&mut raw)[0]["questions"][1]["options"] = json!(["only"]);
        let canonical = Canonical::new("en", fixtures::load(&raw));
        let report = canonical.self_check(&CheckOptions::default());
        assert_eq!(report.locale, "en");
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].kind, DiagnosticKind::DegenerateQuiz);
    }

    #[test]
    fn fan_out_preserves_input_order() {
        let canonical = canonical();
        let mut reordered = document();
        blocks_mut(&mut reordered).swap(0, 1);

        let inputs = vec![
            input("de", &document()),
            broken("es"),
            input("fr", &reordered),
            input("it", &document()),
            broken("ja"),
        ];
        let outcomes = check_all(&canonical, inputs, &CheckOptions::default(), 3);

        let locales: Vec<&str> = outcomes.iter().map(LocaleOutcome::locale).collect();
        assert_eq!(locales, vec!["de", "es", "fr", "it", "ja"]);
        let statuses: Vec<Option<Status>> = outcomes.iter().map(LocaleOutcome::status).collect();
        assert_eq!(
            statuses,
            vec![Some(Status::Ok), None, Some(Status::Fail), Some(Status::Ok), None]
        );
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let canonical = canonical();
        let mut changed = document();
        blocks_mut(&mut changed).pop();
        let make = || {
            (0..8)
                .map(|i| {
                    if i % 2 == 0 {
                        input(&format!("l{i}"), &document())
                    } else {
                        input(&format!("l{i}"), &changed)
                    }
                })
                .collect::<Vec<_>>()
        };
        let sequential = check_all(&canonical, make(), &CheckOptions::default(), 1);
        let parallel = check_all(&canonical, make(), &CheckOptions::default(), 4);
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn zero_jobs_and_no_inputs() {
        let canonical = canonical();
        assert!(check_all(&canonical, Vec::new(), &CheckOptions::default(), 0).is_empty());
        let outcomes = check_all(&canonical, vec![input("es", &document())], &CheckOptions::default(), 0);
        assert_eq!(outcomes.len(), 1);
    }
}
