//! # Structural Comparator
//!
//! Walks the canonical tree and a locale tree side by side and reports
//! every place where the locale's *structure* diverges: ids missing or
//! added, a block or prop of a different kind, a list of a different
//! length, siblings in a different order, a different correct answer.
//! Text is never compared.
//!
//! The walk uses an explicit stack of `(path, canonical node, locale node)`
//! frames rather than recursion, so depth is bounded only by memory.
//! Nodes whose type differs are reported once and not descended into;
//! arrays whose length differs are reported once and their elements are
//! not compared.
//!
//! A [`Comparator`] built from the two trees' fingerprints skips the
//! missing/extra/kind/count work for subtrees the fingerprints already
//! prove identical. Order is outside the fingerprint, so order checks run
//! everywhere.

use std::collections::BTreeSet;

use coursemap_core::path::PROPS_SEGMENT;
use coursemap_core::{
    ContentBlock, Course, CourseTree, Diagnostic, DiagnosticKind, EntityId, EntityPath,
    Identified, Keyed, Lesson, Module,
};
use serde_json::Value;

use crate::fingerprint::Fingerprint;
use crate::props::PropKind;

/// Compare a locale tree against the canonical tree.
///
/// Total: never fails and never panics. Diagnostics come back sorted by
/// path, then kind, then message.
pub fn compare(canonical: &CourseTree, locale: &CourseTree) -> Vec<Diagnostic> {
    Comparator::new().compare(canonical, locale)
}

/// Canonical-vs-locale structural comparison.
#[derive(Debug, Clone, Default)]
pub struct Comparator {
    confirmed: BTreeSet<EntityPath>,
}

impl Comparator {
    /// A comparator that checks every node.
    pub fn new() -> Self {
        Self::default()
    }

    /// A comparator that trusts subtrees whose signatures match in both
    /// fingerprints.
    pub fn with_fingerprints(canonical: &Fingerprint, locale: &Fingerprint) -> Self {
        Self {
            confirmed: canonical.confirmed_subtrees(locale),
        }
    }

    /// Paths this comparator treats as already matching.
    pub fn confirmed(&self) -> &BTreeSet<EntityPath> {
        &self.confirmed
    }

    /// Run the comparison.
    pub fn compare(&self, canonical: &CourseTree, locale: &CourseTree) -> Vec<Diagnostic> {
        let mut walk = Walk {
            confirmed: &self.confirmed,
            stack: vec![Frame {
                path: EntityPath::root(),
                node: Node::Tree(canonical, locale),
            }],
            out: Vec::new(),
            visited: 0,
        };
        while let Some(frame) = walk.stack.pop() {
            walk.visit(frame);
        }

        let mut diagnostics = walk.out;
        diagnostics.sort();
        tracing::debug!(
            visited = walk.visited,
            confirmed = self.confirmed.len(),
            diagnostics = diagnostics.len(),
            "structural comparison finished"
        );
        diagnostics
    }
}

enum Node<'a> {
    Tree(&'a CourseTree, &'a CourseTree),
    Course(&'a Course, &'a Course),
    Module(&'a Module, &'a Module),
    Lesson(&'a Lesson, &'a Lesson),
    Block(&'a ContentBlock, &'a ContentBlock),
    Props(&'a Value, &'a Value),
}

struct Frame<'a> {
    path: EntityPath,
    node: Node<'a>,
}

struct Walk<'a, 'c> {
    confirmed: &'c BTreeSet<EntityPath>,
    stack: Vec<Frame<'a>>,
    out: Vec<Diagnostic>,
    visited: usize,
}

impl<'a> Walk<'a, '_> {
    fn visit(&mut self, frame: Frame<'a>) {
        self.visited += 1;
        let Frame { path, node } = frame;
        let confirmed = self.confirmed.contains(&path);

        match node {
            Node::Tree(c, l) => {
                for (child, c, l) in self.level(&path, "course", &c.courses, &l.courses, confirmed) {
                    self.push(child, Node::Course(c, l));
                }
            }
            Node::Course(c, l) => {
                for (child, c, l) in self.level(&path, "module", &c.modules, &l.modules, confirmed) {
                    self.push(child, Node::Module(c, l));
                }
            }
            Node::Module(c, l) => {
                for (child, c, l) in self.level(&path, "lesson", &c.lessons, &l.lessons, confirmed) {
                    self.push(child, Node::Lesson(c, l));
                }
            }
            Node::Lesson(c, l) => {
                if !confirmed {
                    self.cardinality(&path, "hints", c.hints.len(), l.hints.len());
                }
                for (child, c, l) in self.level(&path, "block", &c.blocks, &l.blocks, confirmed) {
                    self.push(child, Node::Block(c, l));
                }
            }
            Node::Block(c, l) => self.block(path, c, l, confirmed),
            Node::Props(c, l) => {
                if !confirmed {
                    self.props(path, c, l);
                }
            }
        }
    }

    fn push(&mut self, path: EntityPath, node: Node<'a>) {
        self.stack.push(Frame { path, node });
    }

    fn emit(&mut self, kind: DiagnosticKind, path: EntityPath, message: String) {
        self.out.push(Diagnostic::new(kind, path, message));
    }

    /// Id-set and order checks for one keyed level. Returns the pairs
    /// present on both sides, in canonical order.
    fn level<T: Identified>(
        &mut self,
        parent: &EntityPath,
        noun: &str,
        canonical: &'a Keyed<T>,
        locale: &'a Keyed<T>,
        confirmed: bool,
    ) -> Vec<(EntityPath, &'a T, &'a T)> {
        if !confirmed {
            for node in canonical.unique() {
                if !locale.contains(node.id().as_str()) {
                    self.emit(
                        DiagnosticKind::MissingInLocale,
                        parent.child(node.id()),
                        format!("{noun} `{}` is in the canonical tree but not in this locale", node.id()),
                    );
                }
            }
            for node in locale.unique() {
                if !canonical.contains(node.id().as_str()) {
                    self.emit(
                        DiagnosticKind::ExtraInLocale,
                        parent.child(node.id()),
                        format!("{noun} `{}` is not in the canonical tree", node.id()),
                    );
                }
            }
        }

        let canonical_order = shared_order(canonical, locale);
        let locale_order = shared_order(locale, canonical);
        if canonical_order != locale_order {
            self.emit(
                DiagnosticKind::OrderMismatch,
                parent.clone(),
                format!(
                    "{noun} order differs: canonical [{}], locale [{}]",
                    join_ids(&canonical_order),
                    join_ids(&locale_order)
                ),
            );
        }

        canonical
            .unique()
            .filter_map(|c| {
                locale
                    .get(c.id().as_str())
                    .map(|l| (parent.child(c.id()), c, l))
            })
            .collect()
    }

    fn block(
        &mut self,
        path: EntityPath,
        canonical: &'a ContentBlock,
        locale: &'a ContentBlock,
        confirmed: bool,
    ) {
        match (canonical, locale) {
            (ContentBlock::Quiz(c), ContentBlock::Quiz(l)) => {
                let pairs = self.level(&path, "question", &c.questions, &l.questions, confirmed);
                for (question_path, c, l) in pairs {
                    if self.confirmed.contains(&question_path) {
                        continue;
                    }
                    if !self.cardinality(&question_path, "options", c.options.len(), l.options.len())
                        && c.answer_index != l.answer_index
                    {
                        self.emit(
                            DiagnosticKind::AnswerIndexMismatch,
                            question_path,
                            format!(
                                "answerIndex differs: canonical {}, locale {}",
                                c.answer_index, l.answer_index
                            ),
                        );
                    }
                }
            }
            (ContentBlock::Terminal(c), ContentBlock::Terminal(l)) => {
                if !confirmed {
                    self.cardinality(&path, "steps", c.steps.len(), l.steps.len());
                }
            }
            (ContentBlock::Explorer(c), ContentBlock::Explorer(l)) => {
                if confirmed {
                    return;
                }
                if c.explorer != l.explorer {
                    self.emit(
                        DiagnosticKind::TypeMismatch,
                        path,
                        format!(
                            "explorer variant differs: canonical {}, locale {}",
                            c.explorer, l.explorer
                        ),
                    );
                    return;
                }
                self.push(path.child(PROPS_SEGMENT), Node::Props(&c.props, &l.props));
            }
            (c, l) => {
                self.emit(
                    DiagnosticKind::TypeMismatch,
                    path,
                    format!("block type differs: canonical {}, locale {}", c.kind(), l.kind()),
                );
            }
        }
    }

    fn props(&mut self, path: EntityPath, canonical: &'a Value, locale: &'a Value) {
        let (expected, found) = (PropKind::of(canonical), PropKind::of(locale));
        if expected != found {
            self.emit(
                DiagnosticKind::TypeMismatch,
                path,
                format!("prop kind differs: canonical {expected}, locale {found}"),
            );
            return;
        }

        match (canonical, locale) {
            (Value::Object(c), Value::Object(l)) => {
                for key in c.keys().filter(|k| !l.contains_key(*k)) {
                    self.emit(
                        DiagnosticKind::MissingInLocale,
                        path.key(key),
                        format!("prop `{key}` is in the canonical tree but not in this locale"),
                    );
                }
                for key in l.keys().filter(|k| !c.contains_key(*k)) {
                    self.emit(
                        DiagnosticKind::ExtraInLocale,
                        path.key(key),
                        format!("prop `{key}` is not in the canonical tree"),
                    );
                }
                for (key, value) in c {
                    if let Some(other) = l.get(key) {
                        self.push(path.key(key), Node::Props(value, other));
                    }
                }
            }
            (Value::Array(c), Value::Array(l)) => {
                if self.cardinality(&path, "array length", c.len(), l.len()) {
                    return;
                }
                for (i, (value, other)) in c.iter().zip(l).enumerate() {
                    self.push(path.index(i), Node::Props(value, other));
                }
            }
            _ => {}
        }
    }

    /// Reports a count mismatch. Returns true when one was reported.
    fn cardinality(&mut self, path: &EntityPath, what: &str, canonical: usize, locale: usize) -> bool {
        if canonical == locale {
            return false;
        }
        let what = if what == "array length" {
            what.to_string()
        } else {
            format!("{what} count")
        };
        self.emit(
            DiagnosticKind::CardinalityMismatch,
            path.clone(),
            format!("{what} differs: canonical {canonical}, locale {locale}"),
        );
        true
    }
}

/// Ids of `ours` that also appear in `theirs`, in `ours`' order.
fn shared_order<'t, T: Identified>(ours: &'t Keyed<T>, theirs: &Keyed<T>) -> Vec<&'t EntityId> {
    ours.unique()
        .map(|node| node.id())
        .filter(|id| theirs.contains(id.as_str()))
        .collect()
}

fn join_ids(ids: &[&EntityId]) -> String {
    ids.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
