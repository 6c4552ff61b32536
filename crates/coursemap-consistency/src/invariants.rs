//! # Invariant Validator
//!
//! Rules that hold within a single tree regardless of locale:
//!
//! - `answerIndex` addresses an existing option (`AnswerIndexOutOfBounds`).
//! - Block ids are unique within a lesson, and so are question ids across
//!   all of the lesson's quizzes (`DuplicateId`). The two are separate
//!   namespaces.
//! - Every question offers at least two options, and every quiz has at
//!   least one question (`DegenerateQuiz`).
//! - Titles, prompts, options and commands are not blank (`EmptyText`,
//!   a warning).
//!
//! Rules are independent: one node can violate several at once.

use std::collections::BTreeMap;

use coursemap_core::{
    ContentBlock, CourseTree, Diagnostic, DiagnosticKind, EntityPath, Identified, Lesson,
    QuizBlock, TerminalBlock,
};

/// Minimum number of options a question must offer.
pub const MIN_OPTIONS: usize = 2;

/// Check every single-tree invariant. Diagnostics come back sorted.
pub fn validate(tree: &CourseTree) -> Vec<Diagnostic> {
    let mut findings = Findings::default();

    for course in tree.courses.iter() {
        let course_path = EntityPath::root().child(course.id());
        findings.text(&course_path, "title", &course.title);
        for module in course.modules.iter() {
            let module_path = course_path.child(module.id());
            findings.text(&module_path, "title", &module.title);
            for lesson in module.lessons.iter() {
                findings.lesson(module_path.child(lesson.id()), lesson);
            }
        }
    }

    let mut diagnostics = findings.out;
    diagnostics.sort();
    tracing::debug!(diagnostics = diagnostics.len(), "invariant validation finished");
    diagnostics
}

#[derive(Default)]
struct Findings {
    out: Vec<Diagnostic>,
}

impl Findings {
    fn emit(&mut self, kind: DiagnosticKind, path: EntityPath, message: String) {
        self.out.push(Diagnostic::new(kind, path, message));
    }

    fn text(&mut self, path: &EntityPath, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.emit(DiagnosticKind::EmptyText, path.clone(), format!("{field} is empty"));
        }
    }

    fn lesson(&mut self, path: EntityPath, lesson: &Lesson) {
        self.text(&path, "title", &lesson.title);

        for id in lesson.blocks.duplicate_ids() {
            let count = lesson.blocks.ids().filter(|other| *other == id).count();
            self.emit(
                DiagnosticKind::DuplicateId,
                path.clone(),
                format!("block id `{id}` appears {count} times in this lesson"),
            );
        }

        let mut question_ids: BTreeMap<&str, usize> = BTreeMap::new();
        for block in lesson.blocks.iter() {
            let block_path = path.child(block.id());
            match block {
                ContentBlock::Quiz(quiz) => {
                    for question in quiz.questions.iter() {
                        *question_ids.entry(question.id.as_str()).or_default() += 1;
                    }
                    self.quiz(&block_path, quiz);
                }
                ContentBlock::Terminal(terminal) => self.terminal(&block_path, terminal),
                ContentBlock::Explorer(_) => {}
            }
        }
        for (id, count) in question_ids.into_iter().filter(|(_, n)| *n > 1) {
            self.emit(
                DiagnosticKind::DuplicateId,
                path.clone(),
                format!("question id `{id}` appears {count} times in this lesson"),
            );
        }
    }

    fn quiz(&mut self, path: &EntityPath, quiz: &QuizBlock) {
        if quiz.questions.is_empty() {
            self.emit(
                DiagnosticKind::DegenerateQuiz,
                path.clone(),
                "quiz has no questions".to_string(),
            );
        }

        for question in quiz.questions.iter() {
            let question_path = path.child(question.id());
            let options = question.options.len();

            if options < MIN_OPTIONS {
                self.emit(
                    DiagnosticKind::DegenerateQuiz,
                    question_path.clone(),
                    format!(
                        "question has {options} option{}; at least {MIN_OPTIONS} are required",
                        if options == 1 { "" } else { "s" }
                    ),
                );
            }

            let in_bounds = usize::try_from(question.answer_index)
                .map(|index| index < options)
                .unwrap_or(false);
            if !in_bounds {
                self.emit(
                    DiagnosticKind::AnswerIndexOutOfBounds,
                    question_path.clone(),
                    format!(
                        "answerIndex {} is out of bounds for {options} options",
                        question.answer_index
                    ),
                );
            }

            self.text(&question_path, "prompt", &question.prompt);
            for (i, option) in question.options.iter().enumerate() {
                self.text(&question_path, &format!("option {i}"), option);
            }
        }
    }

    fn terminal(&mut self, path: &EntityPath, terminal: &TerminalBlock) {
        for (i, step) in terminal.steps.iter().enumerate() {
            self.text(&path.index(i), "cmd", &step.cmd);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, blocks_mut, document, lesson_mut};
    use coursemap_core::Severity;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    fn run(raw: &Value) -> Vec<Diagnostic> {
        validate(&fixtures::load(raw))
    }

    fn kinds(diagnostics: &[Diagnostic]) -> Vec<(String, DiagnosticKind)> {
        diagnostics
            .iter()
            .map(|d| (d.path.to_string(), d.kind))
            .collect()
    }

    #[test]
    fn fixture_is_clean() {
        assert!(run(&document()).is_empty());
    }

    #[test]
    fn answer_index_equal_to_option_count_is_out_of_bounds() {
        let mut raw = document();
        blocks_mut(&mut raw)[0]["questions"][0]["answerIndex"] = json!(3);
        let diagnostics = run(&raw);
        assert_eq!(
            kinds(&diagnostics),
            vec![("course.module.lesson.q1.a".to_string(), DiagnosticKind::AnswerIndexOutOfBounds)]
        );
        assert_eq!(diagnostics[0].message, "answerIndex 3 is out of bounds for 3 options");
    }

    #[test]
    fn negative_answer_index_is_out_of_bounds() {
        let mut raw = document();
        blocks_mut(&mut raw)[0]["questions"][1]["answerIndex"] = json!(-1);
        let diagnostics = run(&raw);
        assert_eq!(
            kinds(&diagnostics),
            vec![("course.module.lesson.q1.b".to_string(), DiagnosticKind::AnswerIndexOutOfBounds)]
        );
    }

    #[test]
    fn empty_options_trigger_both_rules() {
        let mut raw = document();
        let question = &mut blocks_mut(&mut raw)[0]["questions"][1];
        question["options"] = json!([]);
        question["answerIndex"] = json!(0);
        let diagnostics = run(&raw);
        assert_eq!(
            kinds(&diagnostics),
            vec![
                ("course.module.lesson.q1.b".to_string(), DiagnosticKind::AnswerIndexOutOfBounds),
                ("course.module.lesson.q1.b".to_string(), DiagnosticKind::DegenerateQuiz),
            ]
        );
    }

    #[test]
    fn single_option_is_degenerate() {
        let mut raw = document();
        blocks_mut(&mut raw)[0]["questions"][1]["options"] = json!(["only"]);
        let diagnostics = run(&raw);
        assert_eq!(
            kinds(&diagnostics),
            vec![("course.module.lesson.q1.b".to_string(), DiagnosticKind::DegenerateQuiz)]
        );
        assert_eq!(
            diagnostics[0].message,
            "question has 1 option; at least 2 are required"
        );
    }

    #[test]
    fn quiz_without_questions_is_degenerate() {
        let mut raw = document();
        blocks_mut(&mut raw)[0]["questions"] = json!([]);
        assert_eq!(
            kinds(&run(&raw)),
            vec![("course.module.lesson.q1".to_string(), DiagnosticKind::DegenerateQuiz)]
        );
    }

    #[test]
    fn duplicate_block_ids() {
        let mut raw = document();
        let copy = blocks_mut(&mut raw)[2].clone();
        blocks_mut(&mut raw).push(copy);
        let diagnostics = run(&raw);
        assert_eq!(
            kinds(&diagnostics),
            vec![("course.module.lesson".to_string(), DiagnosticKind::DuplicateId)]
        );
        assert_eq!(diagnostics[0].message, "block id `t1` appears 2 times in this lesson");
    }

    #[test]
    fn duplicate_question_ids_across_quizzes() {
        let mut raw = document();
        blocks_mut(&mut raw).push(json!({
            "type": "quiz",
            "id": "q2",
            "questions": [
                {"id": "a", "prompt": "Again", "options": ["1", "2"], "answerIndex": 0}
            ]
        }));
        let diagnostics = run(&raw);
        assert_eq!(
            kinds(&diagnostics),
            vec![("course.module.lesson".to_string(), DiagnosticKind::DuplicateId)]
        );
        assert!(diagnostics[0].message.starts_with("question id `a`"));
    }

    #[test]
    fn block_and_question_ids_are_separate_namespaces() {
        let mut raw = document();
        blocks_mut(&mut raw)[0]["questions"][0]["id"] = json!("t1");
        assert!(run(&raw).is_empty());
    }

    #[test]
    fn blank_text_is_a_warning() {
        let mut raw = document();
        lesson_mut(&mut raw)["title"] = json!("   ");
        blocks_mut(&mut raw)[0]["questions"][0]["options"][2] = json!("");
        blocks_mut(&mut raw)[2]["steps"][1]["cmd"] = json!("");
        let diagnostics = run(&raw);
        assert_eq!(
            kinds(&diagnostics),
            vec![
                ("course.module.lesson".to_string(), DiagnosticKind::EmptyText),
                ("course.module.lesson.q1.a".to_string(), DiagnosticKind::EmptyText),
                ("course.module.lesson.t1.1".to_string(), DiagnosticKind::EmptyText),
            ]
        );
        assert!(diagnostics.iter().all(|d| d.severity == Severity::Warning));
        assert_eq!(diagnostics[1].message, "option 2 is empty");
    }

    proptest! {
        #[test]
        fn generated_documents_have_no_duplicates(raw in fixtures::arb_document()) {
            let diagnostics = run(&raw);
            prop_assert!(diagnostics.iter().all(|d| d.kind != DiagnosticKind::DuplicateId));
            prop_assert!(diagnostics.windows(2).all(|w| w[0] <= w[1]));
        }
    }
}
