//! # Course Tree Model
//!
//! The typed, immutable course tree produced by the loader:
//!
//! ```text
//! CourseTree ─┬─ Course ─┬─ Module ─┬─ Lesson ─┬─ hints (text)
//!             │          │          │          └─ ContentBlock
//!             │          │          │               ├─ Quiz     → Question → options
//!             │          │          │               ├─ Explorer → props
//!             │          │          │               └─ Terminal → Step
//! ```
//!
//! Ownership is strictly hierarchical: no cross references, no cycles.
//! Human-readable text is kept on the model so the invariant validator can
//! flag empty strings, but it never takes part in structural comparison.

use std::fmt;

use serde_json::Value;

use crate::identity::EntityId;
use crate::keyed::{Identified, Keyed};

/// One locale's complete content map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CourseTree {
    /// Locale tag declared inside the document, if any.
    pub locale: Option<String>,
    /// Courses in authoring order.
    pub courses: Keyed<Course>,
}

/// A course.
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    /// Course slug.
    pub id: EntityId,
    /// Display title.
    pub title: String,
    /// Display description.
    pub description: String,
    /// Duration label, e.g. "3 hours".
    pub duration: Option<String>,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Modules in authoring order.
    pub modules: Keyed<Module>,
}

/// A module within a course.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    /// Module id, unique within its course.
    pub id: EntityId,
    /// Display title.
    pub title: String,
    /// Display description.
    pub description: String,
    /// Lessons in authoring order.
    pub lessons: Keyed<Lesson>,
}

/// A lesson within a module.
#[derive(Debug, Clone, PartialEq)]
pub struct Lesson {
    /// Lesson id, unique within its module.
    pub id: EntityId,
    /// Display title.
    pub title: String,
    /// Lesson body. Excluded from structural comparison.
    pub content: String,
    /// Duration label.
    pub duration: Option<String>,
    /// Hints; only their count is structural.
    pub hints: Vec<String>,
    /// Interactive blocks in authoring order.
    pub blocks: Keyed<ContentBlock>,
}

/// Discriminant of a [`ContentBlock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BlockKind {
    /// Multiple-choice quiz.
    Quiz,
    /// Interactive explorer widget.
    Explorer,
    /// Terminal walkthrough.
    Terminal,
}

impl BlockKind {
    /// Every block kind, in discriminant order.
    pub const ALL: [BlockKind; 3] = [BlockKind::Quiz, BlockKind::Explorer, BlockKind::Terminal];

    /// The raw `type` discriminant.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quiz => "quiz",
            Self::Explorer => "explorer",
            Self::Terminal => "terminal",
        }
    }

    /// Resolve a raw `type` discriminant. Unknown values yield `None`.
    pub fn from_discriminant(value: &str) -> Option<Self> {
        match value {
            "quiz" => Some(Self::Quiz),
            "explorer" => Some(Self::Explorer),
            "terminal" => Some(Self::Terminal),
            _ => None,
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lesson content block, discriminated by `type`.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    /// `type: quiz`
    Quiz(QuizBlock),
    /// `type: explorer`
    Explorer(ExplorerBlock),
    /// `type: terminal`
    Terminal(TerminalBlock),
}

impl ContentBlock {
    /// The block's discriminant.
    pub fn kind(&self) -> BlockKind {
        match self {
            Self::Quiz(_) => BlockKind::Quiz,
            Self::Explorer(_) => BlockKind::Explorer,
            Self::Terminal(_) => BlockKind::Terminal,
        }
    }
}

/// A quiz block.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizBlock {
    /// Block id, unique within its lesson.
    pub id: EntityId,
    /// Display title.
    pub title: Option<String>,
    /// Questions in authoring order.
    pub questions: Keyed<Question>,
}

/// A single quiz question.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    /// Question id, unique within its lesson.
    pub id: EntityId,
    /// Question text.
    pub prompt: String,
    /// Answer options in display order.
    pub options: Vec<String>,
    /// Zero-based index of the correct option. Signed so that a negative
    /// authoring mistake survives loading and is reported, not rejected.
    pub answer_index: i64,
    /// Explanation shown after answering.
    pub explanation: Option<String>,
}

/// An interactive explorer block.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplorerBlock {
    /// Block id, unique within its lesson.
    pub id: EntityId,
    /// Explorer variant, e.g. `AccountExplorer`.
    pub explorer: String,
    /// Variant-specific payload. Shape is canonical, values may be translated.
    pub props: Value,
}

/// A terminal walkthrough block.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalBlock {
    /// Block id, unique within its lesson.
    pub id: EntityId,
    /// Display title.
    pub title: Option<String>,
    /// Steps in execution order.
    pub steps: Vec<Step>,
}

/// A terminal walkthrough step.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Command shown to the learner.
    pub cmd: String,
    /// Expected output.
    pub output: Option<String>,
    /// Explanatory note.
    pub note: Option<String>,
}

impl Identified for Course {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Identified for Module {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Identified for Lesson {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Identified for Question {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Identified for ContentBlock {
    fn id(&self) -> &EntityId {
        match self {
            Self::Quiz(b) => &b.id,
            Self::Explorer(b) => &b.id,
            Self::Terminal(b) => &b.id,
        }
    }
}

impl CourseTree {
    /// Total number of nodes (courses, modules, lessons, blocks, questions,
    /// steps). Used for logging only.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        for course in &self.courses {
            count += 1;
            for module in &course.modules {
                count += 1;
                for lesson in &module.lessons {
                    count += 1;
                    for block in &lesson.blocks {
                        count += 1;
                        count += match block {
                            ContentBlock::Quiz(q) => q.questions.len(),
                            ContentBlock::Terminal(t) => t.steps.len(),
                            ContentBlock::Explorer(_) => 0,
                        };
                    }
                }
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> EntityId {
        EntityId::new(s).unwrap()
    }

    #[test]
    fn block_kind_discriminants_round_trip() {
        for kind in BlockKind::ALL {
            assert_eq!(BlockKind::from_discriminant(kind.as_str()), Some(kind));
        }
        assert_eq!(BlockKind::from_discriminant("video"), None);
        assert_eq!(BlockKind::from_discriminant("Quiz"), None);
    }

    #[test]
    fn content_block_reports_kind_and_id() {
        let block = ContentBlock::Terminal(TerminalBlock {
            id: id("t1"),
            title: None,
            steps: vec![],
        });
        assert_eq!(block.kind(), BlockKind::Terminal);
        assert_eq!(block.id().as_str(), "t1");
    }

    #[test]
    fn node_count_walks_every_level() {
        let lesson = Lesson {
            id: id("l1"),
            title: "Lesson".into(),
            content: String::new(),
            duration: None,
            hints: vec![],
            blocks: [
                ContentBlock::Quiz(QuizBlock {
                    id: id("q1"),
                    title: None,
                    questions: [Question {
                        id: id("qq1"),
                        prompt: "?".into(),
                        options: vec!["a".into(), "b".into()],
                        answer_index: 0,
                        explanation: None,
                    }]
                    .into_iter()
                    .collect(),
                }),
                ContentBlock::Terminal(TerminalBlock {
                    id: id("t1"),
                    title: None,
                    steps: vec![Step {
                        cmd: "ls".into(),
                        output: None,
                        note: None,
                    }],
                }),
            ]
            .into_iter()
            .collect(),
        };
        let module = Module {
            id: id("m1"),
            title: "Module".into(),
            description: String::new(),
            lessons: [lesson].into_iter().collect(),
        };
        let course = Course {
            id: id("c1"),
            title: "Course".into(),
            description: String::new(),
            duration: None,
            tags: vec![],
            modules: [module].into_iter().collect(),
        };
        let tree = CourseTree {
            locale: Some("en".into()),
            courses: [course].into_iter().collect(),
        };
        // course + module + lesson + 2 blocks + 1 question + 1 step
        assert_eq!(tree.node_count(), 7);
    }
}
