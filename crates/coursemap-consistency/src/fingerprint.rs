//! # Structural Fingerprint
//!
//! A flat, order-independent summary of a tree's structure: one
//! [`PathSignature`] per addressable node, pairing its path with the
//! discriminant and cardinalities the comparator would look at. Text never
//! enters a signature.
//!
//! Two trees with equal fingerprints have the same id sets at every level
//! and the same counts everywhere, so the comparator has nothing to report
//! about missing, extra, or mismatched nodes. Order is deliberately not part
//! of the fingerprint; the comparator checks it separately.

use std::collections::BTreeSet;

use coursemap_core::path::PROPS_SEGMENT;
use coursemap_core::{BlockKind, ContentBlock, CourseTree, EntityPath, Identified, Lesson};
use serde_json::Value;

use crate::props::PropKind;

/// Structural summary of one node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SignatureKind {
    /// A course.
    Course,
    /// A module.
    Module,
    /// A lesson and its hint count.
    Lesson {
        /// Number of hints.
        hints: usize,
    },
    /// A quiz block.
    Quiz {
        /// Number of questions.
        questions: usize,
    },
    /// An explorer block.
    Explorer {
        /// Explorer variant name.
        variant: String,
    },
    /// A terminal block.
    Terminal {
        /// Number of steps.
        steps: usize,
    },
    /// A quiz question.
    Question {
        /// Number of options.
        options: usize,
        /// Index of the correct option.
        answer_index: i64,
    },
    /// One explorer prop value.
    Prop {
        /// JSON kind of the value.
        kind: PropKind,
        /// Element count when the value is an array.
        len: Option<usize>,
    },
}

impl SignatureKind {
    /// Block discriminant, when this is a block signature.
    pub fn block_kind(&self) -> Option<BlockKind> {
        match self {
            Self::Quiz { .. } => Some(BlockKind::Quiz),
            Self::Explorer { .. } => Some(BlockKind::Explorer),
            Self::Terminal { .. } => Some(BlockKind::Terminal),
            _ => None,
        }
    }
}

/// A node's path and structural summary.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathSignature {
    /// Dot-joined address of the node.
    pub path: EntityPath,
    /// Discriminant and cardinalities.
    pub kind: SignatureKind,
}

/// Signatures present on one side only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FingerprintDiff {
    /// In `self` but not in `other`.
    pub only_in_self: Vec<PathSignature>,
    /// In `other` but not in `self`.
    pub only_in_other: Vec<PathSignature>,
}

impl FingerprintDiff {
    /// Returns true if both sides are identical.
    pub fn is_empty(&self) -> bool {
        self.only_in_self.is_empty() && self.only_in_other.is_empty()
    }
}

/// Set of every node signature in a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fingerprint {
    signatures: BTreeSet<PathSignature>,
}

impl Fingerprint {
    /// Number of signatures.
    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    /// Returns true for an empty tree.
    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// Signatures in path order.
    pub fn iter(&self) -> impl Iterator<Item = &PathSignature> {
        self.signatures.iter()
    }

    /// Returns true if this exact signature is present.
    pub fn contains(&self, signature: &PathSignature) -> bool {
        self.signatures.contains(signature)
    }

    /// Signature recorded at `path`, if any.
    pub fn at(&self, path: &EntityPath) -> Option<&SignatureKind> {
        self.signatures
            .iter()
            .find(|s| &s.path == path)
            .map(|s| &s.kind)
    }

    /// Signatures present on one side only.
    pub fn diff(&self, other: &Fingerprint) -> FingerprintDiff {
        FingerprintDiff {
            only_in_self: self
                .signatures
                .difference(&other.signatures)
                .cloned()
                .collect(),
            only_in_other: other
                .signatures
                .difference(&self.signatures)
                .cloned()
                .collect(),
        }
    }

    /// Paths whose whole subtree has identical signatures on both sides.
    ///
    /// A path is dirty when a differing signature sits at it or anywhere
    /// below it. Every path present in both fingerprints that is not dirty
    /// is confirmed, so the descendants of a confirmed path are confirmed
    /// too.
    pub fn confirmed_subtrees(&self, other: &Fingerprint) -> BTreeSet<EntityPath> {
        let mut dirty = BTreeSet::new();
        for signature in self.signatures.symmetric_difference(&other.signatures) {
            let mut cursor = Some(signature.path.clone());
            while let Some(path) = cursor {
                cursor = path.parent();
                if !dirty.insert(path) {
                    break;
                }
            }
        }

        self.signatures
            .intersection(&other.signatures)
            .map(|s| &s.path)
            .filter(|path| !dirty.contains(*path))
            .cloned()
            .collect()
    }
}

impl FromIterator<PathSignature> for Fingerprint {
    fn from_iter<I: IntoIterator<Item = PathSignature>>(iter: I) -> Self {
        Self {
            signatures: iter.into_iter().collect(),
        }
    }
}

/// Fingerprint a course tree.
pub fn fingerprint(tree: &CourseTree) -> Fingerprint {
    let mut signatures = BTreeSet::new();
    let mut record = |path: EntityPath, kind: SignatureKind| {
        signatures.insert(PathSignature { path, kind });
    };

    for course in tree.courses.unique() {
        let course_path = EntityPath::root().child(course.id());
        record(course_path.clone(), SignatureKind::Course);
        for module in course.modules.unique() {
            let module_path = course_path.child(module.id());
            record(module_path.clone(), SignatureKind::Module);
            for lesson in module.lessons.unique() {
                let lesson_path = module_path.child(lesson.id());
                lesson_signatures(lesson, lesson_path, &mut record);
            }
        }
    }

    Fingerprint { signatures }
}

fn lesson_signatures(
    lesson: &Lesson,
    path: EntityPath,
    record: &mut impl FnMut(EntityPath, SignatureKind),
) {
    record(
        path.clone(),
        SignatureKind::Lesson {
            hints: lesson.hints.len(),
        },
    );
    for block in lesson.blocks.unique() {
        let block_path = path.child(block.id());
        match block {
            ContentBlock::Quiz(quiz) => {
                record(
                    block_path.clone(),
                    SignatureKind::Quiz {
                        questions: quiz.questions.len(),
                    },
                );
                for question in quiz.questions.unique() {
                    record(
                        block_path.child(question.id()),
                        SignatureKind::Question {
                            options: question.options.len(),
                            answer_index: question.answer_index,
                        },
                    );
                }
            }
            ContentBlock::Explorer(explorer) => {
                record(
                    block_path.clone(),
                    SignatureKind::Explorer {
                        variant: explorer.explorer.clone(),
                    },
                );
                prop_signatures(&explorer.props, block_path.child(PROPS_SEGMENT), &mut *record);
            }
            ContentBlock::Terminal(terminal) => {
                record(
                    block_path,
                    SignatureKind::Terminal {
                        steps: terminal.steps.len(),
                    },
                );
            }
        }
    }
}

fn prop_signatures(
    props: &Value,
    root: EntityPath,
    record: &mut impl FnMut(EntityPath, SignatureKind),
) {
    let mut pending = vec![(root, props)];
    while let Some((path, value)) = pending.pop() {
        let len = match value {
            Value::Array(items) => {
                pending.extend(items.iter().enumerate().map(|(i, v)| (path.index(i), v)));
                Some(items.len())
            }
            Value::Object(fields) => {
                pending.extend(fields.iter().map(|(k, v)| (path.key(k), v)));
                None
            }
            _ => None,
        };
        record(
            path,
            SignatureKind::Prop {
                kind: PropKind::of(value),
                len,
            },
        );
    }
}
