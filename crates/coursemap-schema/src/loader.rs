//! # Tree Loader
//!
//! Turns a raw locale document into the typed [`CourseTree`], consulting
//! the [`SchemaRegistry`] at every node.
//!
//! Loading is accumulation-style: a malformed node is recorded and the
//! loader keeps walking its well-typed children, so a single pass surfaces
//! every malformed node in the document. The tree is returned only when the
//! pass found nothing wrong.
//!
//! The loader never touches disk or network. Callers hand it an in-memory
//! [`Value`] or document text; reading files is the CLI's job.

use std::fmt;

use coursemap_core::{
    BlockKind, ContentBlock, Course, CourseTree, EntityId, EntityPath, ExplorerBlock, Keyed,
    Lesson, Module, Question, QuizBlock, Step, TerminalBlock,
};
use serde_json::{Map, Value};

use crate::error::{LoadError, LoadErrors, ShapeError, ShapeProblem};
use crate::registry::{EntityKind, SchemaRegistry};

/// Physical format of a locale document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    /// `.json`
    Json,
    /// `.yaml` / `.yml`
    Yaml,
}

impl SourceFormat {
    /// Infer the format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "JSON",
            Self::Yaml => "YAML",
        })
    }
}

/// Parse document text into a raw value, keeping map insertion order.
pub fn parse_document(text: &str, format: SourceFormat) -> Result<Value, LoadError> {
    match format {
        SourceFormat::Json => serde_json::from_str(text).map_err(|e| LoadError::Parse {
            format,
            reason: e.to_string(),
        }),
        SourceFormat::Yaml => serde_yaml::from_str(text).map_err(|e| LoadError::Parse {
            format,
            reason: e.to_string(),
        }),
    }
}

/// Builds typed course trees from raw documents.
#[derive(Debug, Clone, Copy)]
pub struct TreeLoader<'r> {
    registry: &'r SchemaRegistry,
}

impl<'r> TreeLoader<'r> {
    /// Create a loader backed by a registry.
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Load a raw document.
    ///
    /// # Errors
    ///
    /// Returns every shape violation found during the pass.
    pub fn load(&self, raw: &Value) -> Result<CourseTree, LoadErrors> {
        let mut pass = LoadPass {
            registry: self.registry,
            errors: Vec::new(),
        };
        let tree = pass.tree(raw);
        match tree {
            Some(tree) if pass.errors.is_empty() => {
                tracing::debug!(
                    courses = tree.courses.len(),
                    nodes = tree.node_count(),
                    "loaded course tree"
                );
                Ok(tree)
            }
            _ => {
                tracing::debug!(errors = pass.errors.len(), "course tree failed shape checks");
                Err(LoadErrors::new(
                    pass.errors.into_iter().map(LoadError::Shape).collect(),
                ))
            }
        }
    }

    /// Parse and load document text.
    pub fn load_str(&self, text: &str, format: SourceFormat) -> Result<CourseTree, LoadErrors> {
        let raw = parse_document(text, format)?;
        self.load(&raw)
    }
}

/// State of one traversal: the registry and the violations found so far.
struct LoadPass<'r> {
    registry: &'r SchemaRegistry,
    errors: Vec<ShapeError>,
}

impl LoadPass<'_> {
    /// Shape-check a node. On failure the violations are recorded and the
    /// object map (if any) is still returned so children can be walked;
    /// the flag tells the caller whether the node itself is usable.
    fn check<'v>(
        &mut self,
        kind: EntityKind,
        raw: &'v Value,
        at: &EntityPath,
    ) -> Option<(&'v Map<String, Value>, bool)> {
        match self.registry.is_well_formed(kind, raw, at) {
            Ok(map) => Some((map, true)),
            Err(errors) => {
                self.errors.extend(errors);
                raw.as_object().map(|map| (map, false))
            }
        }
    }

    /// Resolve the id of a map entry and check any inner `id` against it.
    fn keyed_id(
        &mut self,
        kind: EntityKind,
        key: &str,
        raw: &Value,
        at: &EntityPath,
    ) -> Option<EntityId> {
        let id = match self.registry.check_id(kind, key, at) {
            Ok(id) => id,
            Err(err) => {
                self.errors.push(err);
                return None;
            }
        };
        if let Some(inner) = raw.get("id").and_then(Value::as_str) {
            if inner != key {
                self.errors.push(ShapeError::new(
                    at.clone(),
                    kind,
                    ShapeProblem::IdKeyMismatch {
                        key: key.to_string(),
                        id: inner.to_string(),
                    },
                ));
                return None;
            }
        }
        Some(id)
    }

    /// Resolve the inline `id` of a list member. Returns the path to report
    /// under (positional when the id is unusable) and the id if valid.
    fn inline_id(
        &mut self,
        kind: EntityKind,
        raw: &Value,
        list_path: &EntityPath,
        position: usize,
    ) -> (EntityPath, Option<EntityId>) {
        let positional = list_path.index(position);
        match raw.get("id").and_then(Value::as_str) {
            Some(id) => match self.registry.check_id(kind, id, &positional) {
                Ok(id) => (list_path.parent().unwrap_or_default().child(id.as_str()), Some(id)),
                Err(err) => {
                    self.errors.push(err);
                    (positional, None)
                }
            },
            // Missing or mistyped ids are reported by the shape check.
            None => (positional, None),
        }
    }

    fn tree(&mut self, raw: &Value) -> Option<CourseTree> {
        let root = EntityPath::root();
        let (map, ok) = self.check(EntityKind::CourseTree, raw, &root)?;

        let mut courses = Keyed::new();
        if let Some(raw_courses) = map.get("courses").and_then(Value::as_object) {
            for (key, raw_course) in raw_courses {
                if let Some(course) = self.course(key, raw_course, &root) {
                    courses.push(course);
                }
            }
        }

        ok.then(|| CourseTree {
            locale: text_opt(map, "locale"),
            courses,
        })
    }

    fn course(&mut self, key: &str, raw: &Value, parent: &EntityPath) -> Option<Course> {
        let at = parent.child(key);
        let id = self.keyed_id(EntityKind::Course, key, raw, &at);
        let (map, ok) = self.check(EntityKind::Course, raw, &at)?;

        let mut modules = Keyed::new();
        if let Some(raw_modules) = map.get("modules").and_then(Value::as_object) {
            for (key, raw_module) in raw_modules {
                if let Some(module) = self.module(key, raw_module, &at) {
                    modules.push(module);
                }
            }
        }

        let id = id.filter(|_| ok)?;
        Some(Course {
            id,
            title: text(map, "title"),
            description: text(map, "description"),
            duration: text_opt(map, "duration"),
            tags: text_list(map, "tags"),
            modules,
        })
    }

    fn module(&mut self, key: &str, raw: &Value, parent: &EntityPath) -> Option<Module> {
        let at = parent.child(key);
        let id = self.keyed_id(EntityKind::Module, key, raw, &at);
        let (map, ok) = self.check(EntityKind::Module, raw, &at)?;

        let mut lessons = Keyed::new();
        if let Some(raw_lessons) = map.get("lessons").and_then(Value::as_object) {
            for (key, raw_lesson) in raw_lessons {
                if let Some(lesson) = self.lesson(key, raw_lesson, &at) {
                    lessons.push(lesson);
                }
            }
        }

        let id = id.filter(|_| ok)?;
        Some(Module {
            id,
            title: text(map, "title"),
            description: text(map, "description"),
            lessons,
        })
    }

    fn lesson(&mut self, key: &str, raw: &Value, parent: &EntityPath) -> Option<Lesson> {
        let at = parent.child(key);
        let id = self.keyed_id(EntityKind::Lesson, key, raw, &at);
        let (map, ok) = self.check(EntityKind::Lesson, raw, &at)?;

        let mut blocks = Keyed::new();
        if let Some(raw_blocks) = map.get("blocks").and_then(Value::as_array) {
            let list_path = at.child("blocks");
            for (position, raw_block) in raw_blocks.iter().enumerate() {
                if let Some(block) = self.block(raw_block, &list_path, position) {
                    blocks.push(block);
                }
            }
        }

        let id = id.filter(|_| ok)?;
        Some(Lesson {
            id,
            title: text(map, "title"),
            content: text(map, "content"),
            duration: text_opt(map, "duration"),
            hints: text_list(map, "hints"),
            blocks,
        })
    }

    fn block(
        &mut self,
        raw: &Value,
        list_path: &EntityPath,
        position: usize,
    ) -> Option<ContentBlock> {
        let kind = match self.registry.block_kind(raw, &list_path.index(position)) {
            Ok(kind) => kind,
            Err(err) => {
                self.errors.push(err);
                return None;
            }
        };
        let entity = EntityKind::Block(kind);
        let (at, id) = self.inline_id(entity, raw, list_path, position);
        let (map, ok) = self.check(entity, raw, &at)?;

        match kind {
            BlockKind::Quiz => {
                let questions = self.questions(map, &at);
                let id = id.filter(|_| ok)?;
                Some(ContentBlock::Quiz(QuizBlock {
                    id,
                    title: text_opt(map, "title"),
                    questions,
                }))
            }
            BlockKind::Explorer => {
                let explorer = text(map, "explorer");
                if ok {
                    if let Err(err) = self.registry.check_explorer(&explorer, &at) {
                        self.errors.push(err);
                        return None;
                    }
                }
                let id = id.filter(|_| ok)?;
                Some(ContentBlock::Explorer(ExplorerBlock {
                    id,
                    explorer,
                    props: map
                        .get("props")
                        .filter(|v| v.is_object())
                        .cloned()
                        .unwrap_or_else(|| Value::Object(Map::new())),
                }))
            }
            BlockKind::Terminal => {
                let steps = self.steps(map, &at);
                let id = id.filter(|_| ok)?;
                Some(ContentBlock::Terminal(TerminalBlock {
                    id,
                    title: text_opt(map, "title"),
                    steps,
                }))
            }
        }
    }

    fn questions(&mut self, block: &Map<String, Value>, at: &EntityPath) -> Keyed<Question> {
        let mut questions = Keyed::new();
        let Some(raw_questions) = block.get("questions").and_then(Value::as_array) else {
            return questions;
        };
        let list_path = at.child("questions");
        for (position, raw) in raw_questions.iter().enumerate() {
            let (q_at, id) = self.inline_id(EntityKind::Question, raw, &list_path, position);
            let Some((map, ok)) = self.check(EntityKind::Question, raw, &q_at) else {
                continue;
            };
            let Some(id) = id.filter(|_| ok) else {
                continue;
            };
            questions.push(Question {
                id,
                prompt: text(map, "prompt"),
                options: text_list(map, "options"),
                answer_index: integer(map, "answerIndex").unwrap_or_default(),
                explanation: text_opt(map, "explanation"),
            });
        }
        questions
    }

    fn steps(&mut self, block: &Map<String, Value>, at: &EntityPath) -> Vec<Step> {
        let mut steps = Vec::new();
        let Some(raw_steps) = block.get("steps").and_then(Value::as_array) else {
            return steps;
        };
        for (position, raw) in raw_steps.iter().enumerate() {
            let Some((map, true)) = self.check(EntityKind::Step, raw, &at.index(position)) else {
                continue;
            };
            steps.push(Step {
                cmd: text(map, "cmd"),
                output: text_opt(map, "output"),
                note: text_opt(map, "note"),
            });
        }
        steps
    }
}

fn text(map: &Map<String, Value>, field: &str) -> String {
    map.get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn text_opt(map: &Map<String, Value>, field: &str) -> Option<String> {
    map.get(field).and_then(Value::as_str).map(str::to_string)
}

/// Integers written as `1.0` are integers too.
fn integer(map: &Map<String, Value>, field: &str) -> Option<i64> {
    let Value::Number(n) = map.get(field)? else {
        return None;
    };
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn text_list(map: &Map<String, Value>, field: &str) -> Vec<String> {
    map.get(field)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
