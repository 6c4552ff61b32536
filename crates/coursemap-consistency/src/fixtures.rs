//! Test documents shared by the consistency unit tests.

use coursemap_core::CourseTree;
use coursemap_schema::{SchemaRegistry, TreeLoader};
use proptest::collection::vec;
use proptest::prelude::*;
use serde_json::{json, Value};

pub(crate) fn load(raw: &Value) -> CourseTree {
    let registry = SchemaRegistry::standard().expect("bundled schemas compile");
    TreeLoader::new(&registry)
        .load(raw)
        .expect("fixture document must load")
}

/// `course.module.lesson` holding quiz `q1`, explorer `e1` and terminal `t1`.
pub(crate) fn document() -> Value {
    json!({
        "locale": "en",
        "courses": {
            "course": {
                "title": "Course",
                "description": "A course",
                "modules": {
                    "module": {
                        "title": "Module",
                        "description": "A module",
                        "lessons": {
                            "lesson": {
                                "title": "Lesson",
                                "content": "Body",
                                "hints": ["First hint", "Second hint"],
                                "blocks": [
                                    {
                                        "type": "quiz",
                                        "id": "q1",
                                        "questions": [
                                            {
                                                "id": "a",
                                                "prompt": "Pick one",
                                                "options": ["x", "y", "z"],
                                                "answerIndex": 1
                                            },
                                            {
                                                "id": "b",
                                                "prompt": "Yes or no",
                                                "options": ["yes", "no"],
                                                "answerIndex": 0
                                            }
                                        ]
                                    },
                                    {
                                        "type": "explorer",
                                        "id": "e1",
                                        "explorer": "AccountExplorer",
                                        "props": {
                                            "accounts": [
                                                {"label": "Wallet", "lamports": 5},
                                                {"label": "Program", "lamports": 1}
                                            ],
                                            "highlight": true
                                        }
                                    },
                                    {
                                        "type": "terminal",
                                        "id": "t1",
                                        "steps": [
                                            {"cmd": "solana --version"},
                                            {"cmd": "solana balance", "output": "1 SOL"}
                                        ]
                                    }
                                ]
                            }
                        }
                    },
                    "extras": {
                        "title": "Extras",
                        "lessons": {}
                    }
                }
            }
        }
    })
}

pub(crate) fn lesson_mut(doc: &mut Value) -> &mut Value {
    &mut doc["courses"]["course"]["modules"]["module"]["lessons"]["lesson"]
}

pub(crate) fn blocks_mut(doc: &mut Value) -> &mut Vec<Value> {
    lesson_mut(doc)["blocks"]
        .as_array_mut()
        .expect("fixture lesson has blocks")
}

/// `document()` with explorer `e1` carrying the given props.
pub(crate) fn document_with_props(props: Value) -> Value {
    let mut doc = document();
    blocks_mut(&mut doc)[1]["props"] = props;
    doc
}

/// Prop keys over a small alphabet, including keys that contain the path
/// separator or the escape character, empty keys and non-ASCII keys.
pub(crate) fn arb_prop_key() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(vec!["a", "b", "a.b", "", "%2E", "a%b", "ключ", "名前"])
            .prop_map(str::to_string),
        "[ab.%]{0,3}",
    ]
}

/// Explorer props: nested objects and arrays over [`arb_prop_key`].
pub(crate) fn arb_props() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        (0i64..3).prop_map(Value::from),
        "[xy]{0,2}".prop_map(Value::from),
    ];
    let nested = leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            vec(inner.clone(), 0..3).prop_map(Value::Array),
            prop::collection::btree_map(arb_prop_key(), inner, 0..4)
                .prop_map(|fields| Value::Object(fields.into_iter().collect())),
        ]
    });
    prop::collection::btree_map(arb_prop_key(), nested, 0..4)
        .prop_map(|fields| Value::Object(fields.into_iter().collect()))
}

/// Per-lesson knobs: hints, option counts per question, answer seed,
/// terminal steps, explorer items.
type LessonShape = (usize, Vec<usize>, usize, usize, usize);

/// Random but well-formed documents over a small id space, so two
/// independent draws share many paths.
pub(crate) fn arb_document() -> impl Strategy<Value = Value> {
    arb_shape().prop_map(|shape| build_document(&shape, "en"))
}

/// A random document and a translation of it: same structure, different text.
pub(crate) fn arb_translated_pair() -> impl Strategy<Value = (Value, Value)> {
    arb_shape().prop_map(|shape| (build_document(&shape, "en"), build_document(&shape, "es")))
}

fn arb_shape() -> impl Strategy<Value = Vec<Vec<Vec<LessonShape>>>> {
    let lesson = (0usize..3, vec(0usize..4, 0..3), 0usize..4, 0usize..3, 0usize..3);
    vec(vec(vec(lesson, 0..3), 0..3), 1..3)
}

fn build_document(courses: &[Vec<Vec<LessonShape>>], lang: &str) -> Value {
    let mut course_map = serde_json::Map::new();
    for (ci, modules) in courses.iter().enumerate() {
        let mut module_map = serde_json::Map::new();
        for (mi, lessons) in modules.iter().enumerate() {
            let mut lesson_map = serde_json::Map::new();
            for (li, (hints, questions, answer, steps, items)) in lessons.iter().enumerate() {
                let questions: Vec<Value> = questions
                    .iter()
                    .enumerate()
                    .map(|(qi, options)| {
                        json!({
                            "id": format!("q{qi}"),
                            "prompt": format!("{lang} prompt {qi}"),
                            "options": (0..*options).map(|o| format!("{lang} {o}")).collect::<Vec<_>>(),
                            "answerIndex": answer % options.max(&1),
                        })
                    })
                    .collect();
                let blocks = json!([
                    {"type": "quiz", "id": "quiz", "questions": questions},
                    {
                        "type": "explorer",
                        "id": "explorer",
                        "explorer": "AccountExplorer",
                        "props": {
                            "items": (0..*items)
                                .map(|i| json!({"label": format!("{lang} {i}"), "value": i}))
                                .collect::<Vec<_>>(),
                            "enabled": true
                        }
                    },
                    {
                        "type": "terminal",
                        "id": "terminal",
                        "steps": (0..*steps).map(|s| json!({"cmd": format!("cmd {s}")})).collect::<Vec<_>>()
                    }
                ]);
                lesson_map.insert(
                    format!("l{li}"),
                    json!({
                        "title": format!("{lang} lesson {li}"),
                        "content": format!("{lang} body"),
                        "hints": (0..*hints).map(|h| format!("{lang} hint {h}")).collect::<Vec<_>>(),
                        "blocks": blocks,
                    }),
                );
            }
            module_map.insert(
                format!("m{mi}"),
                json!({"title": format!("{lang} module {mi}"), "lessons": lesson_map}),
            );
        }
        course_map.insert(
            format!("c{ci}"),
            json!({"title": format!("{lang} course {ci}"), "modules": module_map}),
        );
    }
    json!({"locale": lang, "courses": course_map})
}
