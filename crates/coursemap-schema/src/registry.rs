//! # Schema Registry
//!
//! The single source of truth for what a legal course tree looks like.
//! Every entity and block variant has a JSON Schema (Draft 2020-12) bundled
//! from `schemas/` and compiled once by [`SchemaRegistry::standard`]. Unknown
//! fields are ignored so authors can annotate content freely.
//!
//! Validator errors are mapped onto [`ShapeProblem`] so messages name the
//! field and the expected type the way authors think about them, not the
//! schema keyword that fired.
//!
//! Block polymorphism is resolved by [`SchemaRegistry::block_kind`], which
//! checks the `type` discriminant against its own schema. An unknown
//! discriminant is always a [`ShapeProblem::UnknownDiscriminant`]; it is never
//! silently accepted.
//!
//! All checks are pure. The registry is an explicit value so a run can
//! carry its own explorer allow-list without global state.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use coursemap_core::{BlockKind, EntityId, EntityPath};
use jsonschema::error::ValidationErrorKind;
use jsonschema::{ValidationError, Validator};
use serde_json::{Map, Value};

use crate::error::{SchemaError, ShapeError, ShapeProblem};

const COURSE_TREE_SCHEMA: &str = include_str!("../schemas/course-tree.schema.json");
const COURSE_SCHEMA: &str = include_str!("../schemas/course.schema.json");
const MODULE_SCHEMA: &str = include_str!("../schemas/module.schema.json");
const LESSON_SCHEMA: &str = include_str!("../schemas/lesson.schema.json");
const BLOCK_SCHEMA: &str = include_str!("../schemas/block.schema.json");
const QUIZ_SCHEMA: &str = include_str!("../schemas/quiz.schema.json");
const EXPLORER_SCHEMA: &str = include_str!("../schemas/explorer.schema.json");
const TERMINAL_SCHEMA: &str = include_str!("../schemas/terminal.schema.json");
const QUESTION_SCHEMA: &str = include_str!("../schemas/question.schema.json");
const STEP_SCHEMA: &str = include_str!("../schemas/step.schema.json");

/// Kinds of node the registry knows a schema for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKind {
    /// Document root.
    CourseTree,
    /// A course.
    Course,
    /// A module.
    Module,
    /// A lesson.
    Lesson,
    /// A content block of the given variant.
    Block(BlockKind),
    /// A quiz question.
    Question,
    /// A terminal step.
    Step,
}

impl EntityKind {
    /// Every kind, block variants included.
    pub const ALL: [EntityKind; 9] = [
        Self::CourseTree,
        Self::Course,
        Self::Module,
        Self::Lesson,
        Self::Block(BlockKind::Quiz),
        Self::Block(BlockKind::Explorer),
        Self::Block(BlockKind::Terminal),
        Self::Question,
        Self::Step,
    ];

    /// Name of the bundled schema file, without the `.schema.json` suffix.
    pub fn schema_name(self) -> &'static str {
        match self {
            Self::CourseTree => "course-tree",
            Self::Course => "course",
            Self::Module => "module",
            Self::Lesson => "lesson",
            Self::Block(BlockKind::Quiz) => "quiz",
            Self::Block(BlockKind::Explorer) => "explorer",
            Self::Block(BlockKind::Terminal) => "terminal",
            Self::Question => "question",
            Self::Step => "step",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CourseTree => f.write_str("course tree"),
            Self::Course => f.write_str("course"),
            Self::Module => f.write_str("module"),
            Self::Lesson => f.write_str("lesson"),
            Self::Block(kind) => write!(f, "{kind} block"),
            Self::Question => f.write_str("question"),
            Self::Step => f.write_str("step"),
        }
    }
}

/// JSON type a field must have, as read back from its schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// A string.
    Text,
    /// An integer (no fractional part).
    Integer,
    /// An array of strings.
    TextList,
    /// An object.
    Object,
    /// An array of objects.
    List,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "a string",
            Self::Integer => "an integer",
            Self::TextList => "a list of strings",
            Self::Object => "an object",
            Self::List => "a list",
        })
    }
}

/// A parsed schema document and its compiled validator.
struct CompiledSchema {
    document: Value,
    validator: Validator,
}

impl CompiledSchema {
    fn compile(name: &'static str, source: &str) -> Result<Self, SchemaError> {
        let document: Value = serde_json::from_str(source).map_err(|e| SchemaError {
            name,
            reason: e.to_string(),
        })?;
        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft202012);
        let validator = opts.build(&document).map_err(|e| SchemaError {
            name,
            reason: e.to_string(),
        })?;
        Ok(Self {
            document,
            validator,
        })
    }

    /// Every problem the validator finds in `candidate`, mapped.
    fn problems(&self, candidate: &Value) -> Vec<ShapeProblem> {
        self.validator
            .iter_errors(candidate)
            .filter_map(|e| map_error(&self.document, &e))
            .collect()
    }
}

struct BundledSchemas {
    course_tree: CompiledSchema,
    course: CompiledSchema,
    module: CompiledSchema,
    lesson: CompiledSchema,
    quiz: CompiledSchema,
    explorer: CompiledSchema,
    terminal: CompiledSchema,
    question: CompiledSchema,
    step: CompiledSchema,
    discriminant: CompiledSchema,
}

impl BundledSchemas {
    fn compile() -> Result<Self, SchemaError> {
        Ok(Self {
            course_tree: CompiledSchema::compile("course-tree", COURSE_TREE_SCHEMA)?,
            course: CompiledSchema::compile("course", COURSE_SCHEMA)?,
            module: CompiledSchema::compile("module", MODULE_SCHEMA)?,
            lesson: CompiledSchema::compile("lesson", LESSON_SCHEMA)?,
            quiz: CompiledSchema::compile("quiz", QUIZ_SCHEMA)?,
            explorer: CompiledSchema::compile("explorer", EXPLORER_SCHEMA)?,
            terminal: CompiledSchema::compile("terminal", TERMINAL_SCHEMA)?,
            question: CompiledSchema::compile("question", QUESTION_SCHEMA)?,
            step: CompiledSchema::compile("step", STEP_SCHEMA)?,
            discriminant: CompiledSchema::compile("block", BLOCK_SCHEMA)?,
        })
    }

    fn get(&self, kind: EntityKind) -> &CompiledSchema {
        match kind {
            EntityKind::CourseTree => &self.course_tree,
            EntityKind::Course => &self.course,
            EntityKind::Module => &self.module,
            EntityKind::Lesson => &self.lesson,
            EntityKind::Block(BlockKind::Quiz) => &self.quiz,
            EntityKind::Block(BlockKind::Explorer) => &self.explorer,
            EntityKind::Block(BlockKind::Terminal) => &self.terminal,
            EntityKind::Question => &self.question,
            EntityKind::Step => &self.step,
        }
    }
}

/// Compiled schemas for every entity and block variant.
///
/// Cloning is cheap: the compiled validators are shared.
#[derive(Clone)]
pub struct SchemaRegistry {
    schemas: Arc<BundledSchemas>,
    explorers: Option<BTreeSet<String>>,
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("explorers", &self.explorers)
            .finish_non_exhaustive()
    }
}

impl SchemaRegistry {
    /// The standard registry: bundled schemas, any non-empty explorer
    /// variant accepted.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] if a bundled schema fails to parse or compile.
    pub fn standard() -> Result<Self, SchemaError> {
        Ok(Self {
            schemas: Arc::new(BundledSchemas::compile()?),
            explorers: None,
        })
    }

    /// Restrict explorer blocks to the given variant names.
    pub fn with_explorers<I, S>(mut self, explorers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.explorers = Some(explorers.into_iter().map(Into::into).collect());
        self
    }

    /// The configured explorer allow-list, if any.
    pub fn explorers(&self) -> Option<&BTreeSet<String>> {
        self.explorers.as_ref()
    }

    /// The schema document for an entity kind.
    pub fn schema(&self, kind: EntityKind) -> &Value {
        &self.schemas.get(kind).document
    }

    /// Names of the fields an entity kind must carry, read from the
    /// schema's `required` array.
    pub fn required_fields(&self, kind: EntityKind) -> BTreeSet<&str> {
        required_of(self.schema(kind)).collect()
    }

    /// Check a raw node against the schema of `kind`.
    ///
    /// Returns the node's object map when the schema accepts it. Otherwise
    /// returns every violation found on this node. Children held in
    /// `courses`, `modules`, `lessons`, `blocks`, `questions` and `steps` are
    /// not inspected here.
    pub fn is_well_formed<'v>(
        &self,
        kind: EntityKind,
        candidate: &'v Value,
        at: &EntityPath,
    ) -> Result<&'v Map<String, Value>, Vec<ShapeError>> {
        let problems = self.schemas.get(kind).problems(candidate);
        match candidate.as_object() {
            Some(map) if problems.is_empty() => Ok(map),
            Some(_) => Err(problems
                .into_iter()
                .map(|problem| ShapeError::new(at.clone(), kind, problem))
                .collect()),
            None => Err(vec![ShapeError::new(
                at.clone(),
                kind,
                ShapeProblem::NotAnObject {
                    found: json_type(candidate),
                },
            )]),
        }
    }

    /// Resolve a raw block's `type` discriminant.
    pub fn block_kind(&self, candidate: &Value, at: &EntityPath) -> Result<BlockKind, ShapeError> {
        // The shape to blame is unknown until dispatch succeeds; quiz is the
        // most common block and reads naturally in messages.
        let blame =
            |problem| ShapeError::new(at.clone(), EntityKind::Block(BlockKind::Quiz), problem);
        if let Some(problem) = self.schemas.discriminant.problems(candidate).into_iter().next() {
            return Err(blame(problem));
        }
        match candidate.get("type").and_then(Value::as_str) {
            Some(tag) => BlockKind::from_discriminant(tag).ok_or_else(|| {
                blame(ShapeProblem::UnknownDiscriminant {
                    found: tag.to_string(),
                })
            }),
            None => Err(blame(ShapeProblem::MissingField {
                field: "type".into(),
            })),
        }
    }

    /// Check an explorer variant name against the allow-list.
    pub fn check_explorer(&self, name: &str, at: &EntityPath) -> Result<(), ShapeError> {
        let known = match &self.explorers {
            Some(allowed) => allowed.contains(name),
            None => !name.trim().is_empty(),
        };
        if known {
            Ok(())
        } else {
            Err(ShapeError::new(
                at.clone(),
                EntityKind::Block(BlockKind::Explorer),
                ShapeProblem::UnknownExplorer {
                    found: name.to_string(),
                },
            ))
        }
    }

    /// Validate a raw id for use as a path segment.
    pub fn check_id(
        &self,
        kind: EntityKind,
        raw: &str,
        at: &EntityPath,
    ) -> Result<EntityId, ShapeError> {
        EntityId::new(raw).map_err(|e| {
            ShapeError::new(
                at.clone(),
                kind,
                ShapeProblem::InvalidId {
                    value: raw.to_string(),
                    reason: e.to_string(),
                },
            )
        })
    }
}

fn required_of(schema: &Value) -> impl Iterator<Item = &str> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
}

/// Translate one validator error into the problem an author should see.
///
/// Returns `None` for errors another error on the same node already
/// explains, such as an enum mismatch on a discriminant of the wrong type.
fn map_error(schema: &Value, error: &ValidationError<'_>) -> Option<ShapeProblem> {
    let segments = pointer_segments(&error.instance_path.to_string());
    let field = field_label(&segments);
    let problem = match &error.kind {
        ValidationErrorKind::Required { property } => ShapeProblem::MissingField {
            field: property
                .as_str()
                .map_or_else(|| property.to_string(), str::to_string),
        },
        ValidationErrorKind::Type { .. } if segments.is_empty() => ShapeProblem::NotAnObject {
            found: json_type(&error.instance),
        },
        ValidationErrorKind::Type { .. }
            if error.instance.is_null()
                && segments.len() == 1
                && required_of(schema).any(|r| r == segments[0]) =>
        {
            ShapeProblem::MissingField { field }
        }
        ValidationErrorKind::Type { .. } => match expected_type(schema, &segments) {
            Some(expected) => ShapeProblem::WrongType {
                field,
                expected,
                found: json_type(&error.instance),
            },
            None => ShapeProblem::Violation {
                field,
                message: error.to_string(),
            },
        },
        ValidationErrorKind::Enum { .. } if segments == ["type"] => {
            ShapeProblem::UnknownDiscriminant {
                found: error.instance.as_str()?.to_string(),
            }
        }
        ValidationErrorKind::Pattern { .. } if segments == ["locale"] => {
            ShapeProblem::InvalidLocale {
                value: error.instance.as_str()?.to_string(),
            }
        }
        _ => ShapeProblem::Violation {
            field,
            message: error.to_string(),
        },
    };
    Some(problem)
}

/// Split a JSON pointer into unescaped reference tokens.
fn pointer_segments(pointer: &str) -> Vec<String> {
    pointer
        .split('/')
        .skip(1)
        .map(|token| token.replace("~1", "/").replace("~0", "~"))
        .collect()
}

/// `options[1]` for `["options", "1"]`, `props.a` for `["props", "a"]`.
fn field_label(segments: &[String]) -> String {
    let mut label = String::new();
    for segment in segments {
        if !label.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            label.push('[');
            label.push_str(segment);
            label.push(']');
        } else {
            if !label.is_empty() {
                label.push('.');
            }
            label.push_str(segment);
        }
    }
    label
}

/// Walk `properties` and `items` down to the schema of the offending value
/// and read back the type it declares.
fn expected_type(schema: &Value, segments: &[String]) -> Option<FieldType> {
    let mut node = schema;
    for segment in segments {
        node = match node.get("properties").and_then(|p| p.get(segment.as_str())) {
            Some(next) => next,
            None => node.get("items")?,
        };
    }
    let declared = declared_type(node)?;
    Some(match declared {
        "string" => FieldType::Text,
        "integer" => FieldType::Integer,
        "object" => FieldType::Object,
        "array" => match node.get("items").and_then(declared_type) {
            Some("string") => FieldType::TextList,
            _ => FieldType::List,
        },
        _ => return None,
    })
}

/// The first non-null type a schema node declares.
fn declared_type(node: &Value) -> Option<&str> {
    match node.get("type")? {
        Value::String(ty) => Some(ty.as_str()),
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|ty| *ty != "null"),
        _ => None,
    }
}

/// Name of a JSON value's type, for messages.
pub fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(n) if n.is_f64() => "a fractional number",
        Value::Number(_) => "an integer",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
