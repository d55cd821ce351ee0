//! Turns recovered payloads into typed question records.
//!
//! The contract here is total: every generation attempt produces a
//! [`Question`]. Payloads missing required fields, and responses no recovery
//! stage could parse, become clearly-marked placeholder records instead of
//! errors.

use std::sync::Arc;

use serde_json::Value;

use crate::constants::prompts;
use crate::models::domain::{
    ClozeQuestion, MultipleChoiceQuestion, Question, QuestionFocus, QuestionKind,
    TrueFalseQuestion,
};
use crate::services::model_service::{CompletionDispatch, QUESTION_MAX_TOKENS};
use crate::services::platform_resolver::ModelSelection;
use crate::services::response_recovery::recover;

/// Read-only parameters shared by every question of one quiz.
#[derive(Clone, Debug)]
pub struct QuestionContext {
    pub topic: String,
    pub subtopic: Option<String>,
    pub focus: QuestionFocus,
    pub difficulty: String,
}

pub struct QuestionService {
    dispatch: Arc<dyn CompletionDispatch>,
}

impl QuestionService {
    pub fn new(dispatch: Arc<dyn CompletionDispatch>) -> Self {
        Self { dispatch }
    }

    /// Generates one question: prompt, single provider call, recovery,
    /// record construction. Never fails.
    pub async fn generate_question(
        &self,
        selection: &ModelSelection,
        kind: QuestionKind,
        context: &QuestionContext,
    ) -> Question {
        let prompt = prompts::question_prompt(
            kind,
            &context.topic,
            context.subtopic.as_deref(),
            context.focus,
            &context.difficulty,
        );
        let raw = self
            .dispatch
            .generate(
                selection,
                prompts::GENERATOR_SYSTEM_MESSAGE,
                &prompt,
                QUESTION_MAX_TOKENS,
            )
            .await;

        self.question_from_raw(&raw, kind, context)
    }

    /// Recovery plus defaulting, split out so tests can exercise it without
    /// a dispatcher.
    pub fn question_from_raw(
        &self,
        raw: &str,
        kind: QuestionKind,
        context: &QuestionContext,
    ) -> Question {
        let recovered = recover(raw, kind);

        match recovered
            .payload
            .and_then(|payload| build_question(&payload, kind, context))
        {
            Some(question) => question,
            None => {
                log::error!(
                    "Could not parse a {} question from model response; raw response: {}",
                    kind.as_str(),
                    recovered.text
                );
                placeholder_question(kind, context)
            }
        }
    }
}

fn build_question(
    payload: &Value,
    kind: QuestionKind,
    context: &QuestionContext,
) -> Option<Question> {
    let object = payload.as_object()?;

    let question = non_empty_str(object.get("question"))?;
    let concept_phrase = non_empty_str(object.get("concept_phrase")).unwrap_or_default();
    let language = non_empty_str(object.get("language"));
    let explanation = non_empty_str(object.get("explanation"))
        .unwrap_or_else(|| default_explanation(&concept_phrase, &context.topic));

    match kind {
        QuestionKind::MultipleChoice => {
            let options: Vec<String> = object
                .get("options")?
                .as_array()?
                .iter()
                .filter_map(|option| option.as_str())
                .map(ToString::to_string)
                .collect();
            let correct_answer = non_empty_str(object.get("correct_answer"))?;

            Some(Question::MultipleChoice(MultipleChoiceQuestion {
                question,
                options,
                correct_answer,
                explanation,
                topic: context.topic.clone(),
                subtopic: context.subtopic.clone(),
                focus: context.focus,
                language,
                concept_phrase,
            }))
        }
        QuestionKind::TrueFalse => {
            let correct_answer = bool_answer(object.get("correct_answer")?)?;

            Some(Question::TrueFalse(TrueFalseQuestion {
                question,
                correct_answer,
                explanation,
                topic: context.topic.clone(),
                subtopic: context.subtopic.clone(),
                focus: context.focus,
                language,
                concept_phrase,
            }))
        }
        QuestionKind::Cloze => {
            let correct_answer = non_empty_str(object.get("correct_answer"))?;

            Some(Question::Cloze(ClozeQuestion {
                question,
                correct_answer,
                explanation,
                topic: context.topic.clone(),
                subtopic: context.subtopic.clone(),
                focus: context.focus,
                language,
                concept_phrase,
            }))
        }
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToString::to_string)
}

/// Accepts JSON booleans and the strings "true"/"false" in any case; lax
/// models frequently quote the boolean.
fn bool_answer(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(text) => match text.trim().to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn default_explanation(concept_phrase: &str, topic: &str) -> String {
    let subject = if concept_phrase.is_empty() {
        topic
    } else {
        concept_phrase
    };
    format!("This is a question about {}.", subject)
}

/// Fixed fallback record per question kind, used when no recovery stage
/// produced usable data.
pub fn placeholder_question(kind: QuestionKind, context: &QuestionContext) -> Question {
    let explanation =
        "This is a placeholder explanation due to an error in question generation.".to_string();
    let concept_phrase = format!("Error in {}", context.topic);

    match kind {
        QuestionKind::MultipleChoice => Question::MultipleChoice(MultipleChoiceQuestion {
            question: format!(
                "Error generating question about {}. Please try again.",
                context.topic
            ),
            options: vec![
                "A. First option".to_string(),
                "B. Second option".to_string(),
                "C. Third option".to_string(),
                "D. Fourth option".to_string(),
            ],
            correct_answer: "A".to_string(),
            explanation,
            topic: context.topic.clone(),
            subtopic: context.subtopic.clone(),
            focus: context.focus,
            language: None,
            concept_phrase,
        }),
        QuestionKind::TrueFalse => Question::TrueFalse(TrueFalseQuestion {
            question: format!(
                "Error generating question about {}. Please try again.",
                context.topic
            ),
            correct_answer: true,
            explanation,
            topic: context.topic.clone(),
            subtopic: context.subtopic.clone(),
            focus: context.focus,
            language: None,
            concept_phrase,
        }),
        QuestionKind::Cloze => Question::Cloze(ClozeQuestion {
            question: format!(
                "Error generating question about {}. Please fill in the ___.",
                context.topic
            ),
            correct_answer: "blank".to_string(),
            explanation,
            topic: context.topic.clone(),
            subtopic: context.subtopic.clone(),
            focus: context.focus,
            language: None,
            concept_phrase,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::model_service::MockCompletionDispatch;
    use crate::services::platform_resolver::Platform;
    use crate::test_utils::fixtures::{
        question_context as context, LABELED_MC_RESPONSE, VALID_MC_PAYLOAD,
    };

    fn service_with_response(response: &str) -> QuestionService {
        let mut dispatch = MockCompletionDispatch::new();
        let response = response.to_string();
        dispatch
            .expect_generate()
            .times(1)
            .returning(move |_, _, _, _| response.clone());
        QuestionService::new(Arc::new(dispatch))
    }

    #[actix_rt::test]
    async fn well_formed_response_builds_multiple_choice() {
        let raw = r#"{
            "question": "What does the borrow checker enforce?",
            "options": ["A. Garbage collection", "B. Aliasing rules", "C. Dynamic typing", "D. Reflection"],
            "correct_answer": "B. Aliasing rules",
            "type": "multiple_choice",
            "concept_phrase": "borrow checker aliasing rules",
            "explanation": "The borrow checker enforces aliasing and lifetime rules."
        }"#;
        let service = service_with_response(raw);
        let selection = ModelSelection::new(Platform::OpenAi, "gpt-4o");

        let question = service
            .generate_question(&selection, QuestionKind::MultipleChoice, &context())
            .await;

        let Question::MultipleChoice(mc) = question else {
            panic!("expected a multiple-choice question");
        };
        assert_eq!(mc.correct_answer, "B. Aliasing rules");
        assert_eq!(mc.options.len(), 4);
        assert_eq!(mc.topic, "Rust");
        assert_eq!(mc.subtopic.as_deref(), Some("Error Handling"));
    }

    #[actix_rt::test]
    async fn garbage_response_yields_placeholder() {
        let service = service_with_response("the model rambled and returned nothing useful");
        let selection = ModelSelection::new(Platform::OpenAi, "gpt-4o");

        let question = service
            .generate_question(&selection, QuestionKind::Cloze, &context())
            .await;

        let Question::Cloze(cloze) = question else {
            panic!("expected a cloze question");
        };
        assert_eq!(cloze.correct_answer, "blank");
        assert!(cloze.question.contains("Error generating question about Rust"));
        assert!(!cloze.explanation.is_empty());
    }

    #[test]
    fn missing_explanation_is_defaulted_from_concept_phrase() {
        let raw = r#"{
            "question": "Fill in: ownership is checked at ___ time.",
            "correct_answer": "compile",
            "type": "cloze",
            "concept_phrase": "compile-time ownership checks"
        }"#;
        let service = QuestionService::new(Arc::new(MockCompletionDispatch::new()));

        let question = service.question_from_raw(raw, QuestionKind::Cloze, &context());

        assert_eq!(
            question.explanation(),
            "This is a question about compile-time ownership checks."
        );
    }

    #[test]
    fn missing_explanation_falls_back_to_topic() {
        let raw = r#"{ "question": "Is Rust memory safe?", "correct_answer": true }"#;
        let service = QuestionService::new(Arc::new(MockCompletionDispatch::new()));

        let question = service.question_from_raw(raw, QuestionKind::TrueFalse, &context());

        assert_eq!(question.explanation(), "This is a question about Rust.");
    }

    #[test]
    fn true_false_accepts_quoted_booleans() {
        let raw = r#"{ "question": "Is the statement true?", "correct_answer": "True" }"#;
        let service = QuestionService::new(Arc::new(MockCompletionDispatch::new()));

        let question = service.question_from_raw(raw, QuestionKind::TrueFalse, &context());

        let Question::TrueFalse(tf) = question else {
            panic!("expected a true/false question");
        };
        assert!(tf.correct_answer);
    }

    #[test]
    fn true_false_rejects_non_boolean_answers() {
        let raw = r#"{ "question": "Is the statement true?", "correct_answer": "maybe" }"#;
        let service = QuestionService::new(Arc::new(MockCompletionDispatch::new()));

        let question = service.question_from_raw(raw, QuestionKind::TrueFalse, &context());

        let Question::TrueFalse(tf) = question else {
            panic!("expected a true/false question");
        };
        // Unusable answers degrade to the placeholder record.
        assert!(tf.question.contains("Error generating question"));
    }

    #[test]
    fn error_marked_dispatch_payload_becomes_placeholder() {
        let raw = crate::services::model_service::error_response(
            "GROQ_API_KEY environment variable not found",
            "The GROQ API key is not available.",
        );
        let service = QuestionService::new(Arc::new(MockCompletionDispatch::new()));

        let question =
            service.question_from_raw(&raw, QuestionKind::MultipleChoice, &context());

        let Question::MultipleChoice(mc) = question else {
            panic!("expected a multiple-choice question");
        };
        assert_eq!(mc.correct_answer, "A");
        assert_eq!(mc.options.len(), 4);
    }

    #[test]
    fn placeholders_have_required_fields_for_every_kind() {
        for kind in [
            QuestionKind::MultipleChoice,
            QuestionKind::TrueFalse,
            QuestionKind::Cloze,
        ] {
            let question = placeholder_question(kind, &context());
            assert_eq!(question.kind(), kind);
            assert!(!question.question_text().is_empty());
            assert!(!question.explanation().is_empty());
        }
    }

    #[test]
    fn serialized_record_round_trips_through_recovery() {
        let service = QuestionService::new(Arc::new(MockCompletionDispatch::new()));
        let first =
            service.question_from_raw(VALID_MC_PAYLOAD, QuestionKind::MultipleChoice, &context());

        let serialized = serde_json::to_string(&first).unwrap();
        let second =
            service.question_from_raw(&serialized, QuestionKind::MultipleChoice, &context());

        assert_eq!(first, second);
    }

    #[test]
    fn labeled_block_text_builds_full_record() {
        let service = QuestionService::new(Arc::new(MockCompletionDispatch::new()));

        let question = service.question_from_raw(
            LABELED_MC_RESPONSE,
            QuestionKind::MultipleChoice,
            &context(),
        );

        let Question::MultipleChoice(mc) = question else {
            panic!("expected a multiple-choice question");
        };
        assert_eq!(mc.options.len(), 4);
        assert_eq!(mc.correct_answer, "B. Rc");
        assert_eq!(
            mc.explanation,
            "Rc keeps a reference count and shares ownership."
        );
    }
}
