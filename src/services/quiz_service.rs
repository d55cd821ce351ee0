//! Quiz assembly: resolve a platform once per request, generate the
//! microcourse and each question sequentially, and write the artifact.

use std::sync::Arc;

use serde_json::Value;
use validator::Validate;

use crate::constants::prompts;
use crate::errors::AppResult;
use crate::models::domain::QuizDocument;
use crate::models::dto::{
    GenerateQuizRequest, GenerateQuizResponse, TestAgentRequest, TestAgentResponse,
};
use crate::services::model_service::{
    error_response, CompletionDispatch, COURSE_MAX_TOKENS, QUESTION_MAX_TOKENS,
};
use crate::services::ollama_catalog::OllamaCatalog;
use crate::services::platform_resolver::{resolve, AvailabilityEvidence, ModelSelection, Resolution};
use crate::services::question_service::{QuestionContext, QuestionService};
use crate::services::output_service::OutputService;

pub struct QuizService {
    dispatch: Arc<dyn CompletionDispatch>,
    question_service: Arc<QuestionService>,
    output_service: Arc<OutputService>,
    catalog: Arc<OllamaCatalog>,
}

impl QuizService {
    pub fn new(
        dispatch: Arc<dyn CompletionDispatch>,
        question_service: Arc<QuestionService>,
        output_service: Arc<OutputService>,
        catalog: Arc<OllamaCatalog>,
    ) -> Self {
        Self {
            dispatch,
            question_service,
            output_service,
            catalog,
        }
    }

    pub async fn generate_quiz(
        &self,
        request: GenerateQuizRequest,
    ) -> AppResult<GenerateQuizResponse> {
        request.validate()?;

        let evidence = AvailabilityEvidence::gather(&self.catalog).await;
        let selection = match resolve(
            request.platform.as_deref(),
            request.model.as_deref(),
            &evidence,
        ) {
            Resolution::Selected(selection) => selection,
            Resolution::Unavailable => {
                // No transport call is made on this path; the artifact tells
                // the user how to configure a platform.
                let file_path = self.output_service.write_setup_tutorial()?;
                return Ok(GenerateQuizResponse {
                    file_path,
                    format: "html".to_string(),
                    num_questions: 0,
                    topic: "Model Setup Tutorial".to_string(),
                    subtopic: Some("How to set up API keys or install Ollama".to_string()),
                    model_used: "none".to_string(),
                });
            }
        };

        log::info!(
            "Generating {} {} questions about {} using {} with model {}",
            request.num_questions,
            request.question_type.as_str(),
            request.topic,
            selection.platform.name(),
            selection.model
        );

        let microcourse = self
            .generate_microcourse(&selection, &request.topic, request.subtopic.as_deref())
            .await;

        let context = QuestionContext {
            topic: request.topic.clone(),
            subtopic: request.subtopic.clone(),
            focus: request.question_focus,
            difficulty: request.difficulty.clone(),
        };

        // One call per question, strictly sequential. A bad question becomes
        // a placeholder record and never aborts the remaining ones.
        let mut questions = Vec::with_capacity(request.num_questions as usize);
        for _ in 0..request.num_questions {
            let question = self
                .question_service
                .generate_question(&selection, request.question_type, &context)
                .await;
            questions.push(question);
        }

        let quiz = QuizDocument::new(
            request.topic.clone(),
            request.subtopic.clone(),
            questions,
            Some(microcourse),
        );
        let file_path = self.output_service.write_quiz(&quiz, request.output_format)?;

        Ok(GenerateQuizResponse {
            file_path,
            format: request.output_format.as_str().to_string(),
            num_questions: quiz.questions.len(),
            topic: request.topic,
            subtopic: request.subtopic,
            model_used: selection.model,
        })
    }

    /// One long-form call. A failed call degrades to an error-note markdown
    /// body rather than aborting the quiz.
    async fn generate_microcourse(
        &self,
        selection: &ModelSelection,
        topic: &str,
        subtopic: Option<&str>,
    ) -> String {
        let prompt = prompts::microcourse_prompt(topic, subtopic);
        let content = self
            .dispatch
            .generate(
                selection,
                prompts::COURSE_SYSTEM_MESSAGE,
                &prompt,
                COURSE_MAX_TOKENS,
            )
            .await;

        match dispatch_error_message(&content) {
            Some(message) => {
                log::error!("Microcourse generation failed: {}", message);
                format!("# Error generating microcourse\n\n{}", message)
            }
            None => content,
        }
    }

    /// Sends one prompt straight through dispatch and reports whether the
    /// response parses, for connectivity debugging.
    pub async fn test_agent(&self, request: TestAgentRequest) -> AppResult<TestAgentResponse> {
        let evidence = AvailabilityEvidence::gather(&self.catalog).await;
        let raw_response = match resolve(
            request.platform.as_deref(),
            request.model.as_deref(),
            &evidence,
        ) {
            Resolution::Selected(selection) => {
                let prompt = request
                    .prompt
                    .unwrap_or_else(|| prompts::DEFAULT_TEST_PROMPT.to_string());
                self.dispatch
                    .generate(
                        &selection,
                        prompts::GENERATOR_SYSTEM_MESSAGE,
                        &prompt,
                        QUESTION_MAX_TOKENS,
                    )
                    .await
            }
            Resolution::Unavailable => error_response(
                "No API keys or Ollama models found",
                "Set up an API key or install Ollama before testing the host agent.",
            ),
        };

        let parsed_json: Option<Value> = serde_json::from_str(&raw_response).ok();
        Ok(TestAgentResponse {
            is_valid_json: parsed_json.is_some(),
            parsed_json,
            raw_response,
        })
    }
}

/// Extracts the machine-readable error marker from an error-marked dispatch
/// payload, if the body is one.
fn dispatch_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(Value::as_str)
        .map(ToString::to_string)
}
