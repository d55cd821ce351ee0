//! Uniform chat-completion dispatch across the supported platforms.
//!
//! Every backend sends exactly one system instruction and one user message
//! at a fixed temperature and returns the first text completion. Transport
//! failures never escape this layer: they are converted into an error-marked
//! response body that the recovery pipeline and record defaulting absorb.

use std::env;
use std::sync::Arc;

use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::services::ollama_catalog::OllamaCatalog;
use crate::services::platform_resolver::{
    ModelSelection, Platform, OLLAMA_MODEL_PREFIX, OLLAMA_WILDCARD,
};

/// Token budget for single-question completions.
pub const QUESTION_MAX_TOKENS: u32 = 2048;
/// Token budget for long-form microcourse completions.
pub const COURSE_MAX_TOKENS: u32 = 4000;

const COMPLETION_TEMPERATURE: f32 = 0.7;

const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";
const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// One chat-completion capability per platform.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(
        &self,
        model: &str,
        system: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> AppResult<String>;
}

/// The total dispatch contract consumed by the generation services. Unlike
/// [`ChatCompletion`], `generate` cannot fail; errors come back as an
/// error-marked response body.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionDispatch: Send + Sync {
    async fn generate(
        &self,
        selection: &ModelSelection,
        system: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> String;
}

/// Builds an error-marked response body in place of model output. The
/// `error` key is the machine-readable marker; the question and explanation
/// keep downstream rendering presentable.
pub fn error_response(message: &str, explanation: &str) -> String {
    json!({
        "error": message,
        "question": "Error generating question. Please try again.",
        "explanation": explanation,
    })
    .to_string()
}

/// Backend for the OpenAI chat-completions wire format, which OpenAI, Groq,
/// OpenRouter, and Ollama all speak.
pub struct OpenAiCompatibleBackend {
    client: async_openai::Client<OpenAIConfig>,
}

impl OpenAiCompatibleBackend {
    pub fn new(api_key: &SecretString, api_base: Option<&str>) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(api_key.expose_secret());
        if let Some(base) = api_base {
            config = config.with_api_base(base);
        }
        Self {
            client: async_openai::Client::with_config(config),
        }
    }
}

#[async_trait]
impl ChatCompletion for OpenAiCompatibleBackend {
    async fn complete(
        &self,
        model: &str,
        system: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> AppResult<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .temperature(COMPLETION_TEMPERATURE)
            .max_tokens(max_tokens)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system)
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()?
                    .into(),
            ])
            .build()?;

        let response = self.client.chat().create(request).await?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::TransportError("completion contained no choices".to_string()))
    }
}

/// Backend for the Anthropic Messages API.
pub struct AnthropicBackend {
    http: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicMessageResponse {
    content: Vec<AnthropicContentBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    #[serde(default)]
    text: String,
}

impl AnthropicBackend {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: ANTHROPIC_API_BASE.to_string(),
        }
    }
}

#[async_trait]
impl ChatCompletion for AnthropicBackend {
    async fn complete(
        &self,
        model: &str,
        system: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> AppResult<String> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = json!({
            "model": model,
            "max_tokens": max_tokens,
            "temperature": COMPLETION_TEMPERATURE,
            "system": system,
            "messages": [
                { "role": "user", "content": [ { "type": "text", "text": prompt } ] }
            ],
        });

        let response = self
            .http
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::TransportError(format!(
                "Anthropic API returned status {}: {}",
                status, body
            )));
        }

        let message: AnthropicMessageResponse = response.json().await?;
        message
            .content
            .into_iter()
            .map(|block| block.text)
            .find(|text| !text.is_empty())
            .ok_or_else(|| AppError::TransportError("response contained no text".to_string()))
    }
}

/// Resolves a [`ModelSelection`] to a backend and executes the completion,
/// absorbing every failure into an error-marked response body.
pub struct ModelService {
    config: Arc<Config>,
    catalog: Arc<OllamaCatalog>,
}

impl ModelService {
    pub fn new(config: Arc<Config>, catalog: Arc<OllamaCatalog>) -> Self {
        Self { config, catalog }
    }

    async fn try_generate(
        &self,
        selection: &ModelSelection,
        system: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> AppResult<String> {
        let backend = self.backend_for(selection.platform)?;
        let model = self.effective_model(selection).await?;

        log::info!(
            "Requesting completion from {} with model {}",
            selection.platform.name(),
            model
        );
        let text = backend.complete(&model, system, prompt, max_tokens).await?;
        log::info!(
            "Generated response from {} ({} chars)",
            selection.platform.name(),
            text.len()
        );
        Ok(text)
    }

    /// Credentials are read per call so that keys exported after startup are
    /// picked up without a restart.
    fn backend_for(&self, platform: Platform) -> AppResult<Box<dyn ChatCompletion>> {
        match platform {
            Platform::Anthropic => Ok(Box::new(AnthropicBackend::new(required_key(platform)?))),
            Platform::OpenAi => Ok(Box::new(OpenAiCompatibleBackend::new(
                &required_key(platform)?,
                None,
            ))),
            Platform::Groq => Ok(Box::new(OpenAiCompatibleBackend::new(
                &required_key(platform)?,
                Some(GROQ_API_BASE),
            ))),
            Platform::OpenRouter => Ok(Box::new(OpenAiCompatibleBackend::new(
                &required_key(platform)?,
                Some(OPENROUTER_API_BASE),
            ))),
            Platform::Ollama => {
                // Ollama ignores the key but the client requires one.
                let key = SecretString::from("ollama".to_string());
                let base = format!("{}/v1", self.config.ollama_base_url);
                Ok(Box::new(OpenAiCompatibleBackend::new(
                    &key,
                    Some(base.as_str()),
                )))
            }
        }
    }

    /// Pins Ollama wildcard selections to the smallest local model and strips
    /// the `ollama:` marker; other platforms pass their model through.
    async fn effective_model(&self, selection: &ModelSelection) -> AppResult<String> {
        if selection.platform != Platform::Ollama {
            return Ok(selection.model.clone());
        }

        if selection.model == OLLAMA_WILDCARD {
            let models = self.catalog.available_models().await;
            return models.into_iter().next().ok_or_else(|| {
                AppError::TransportError(
                    "No Ollama models available. Please pull a model using 'ollama pull llama3' or similar.".to_string(),
                )
            });
        }

        Ok(selection
            .model
            .strip_prefix(OLLAMA_MODEL_PREFIX)
            .unwrap_or(&selection.model)
            .to_string())
    }
}

#[async_trait]
impl CompletionDispatch for ModelService {
    async fn generate(
        &self,
        selection: &ModelSelection,
        system: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> String {
        match self
            .try_generate(selection, system, prompt, max_tokens)
            .await
        {
            Ok(text) => text,
            Err(err) => {
                let message = err.to_string();
                log::error!(
                    "Completion via {} failed: {}",
                    selection.platform.name(),
                    message
                );
                error_response(
                    &message,
                    "An error occurred while generating the question.",
                )
            }
        }
    }
}

fn required_key(platform: Platform) -> AppResult<SecretString> {
    let var = platform.credential_var().ok_or_else(|| {
        AppError::InternalError(format!("{} has no credential variable", platform.name()))
    })?;

    env::var(var)
        .ok()
        .filter(|value| !value.is_empty())
        .map(SecretString::from)
        .ok_or_else(|| {
            AppError::TransportError(format!("{} environment variable not found", var))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_carries_marker_and_placeholders() {
        let body = error_response("boom", "Something went wrong.");
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();

        assert_eq!(value["error"], "boom");
        assert_eq!(value["question"], "Error generating question. Please try again.");
        assert_eq!(value["explanation"], "Something went wrong.");
    }

    #[test]
    fn required_key_reports_missing_variable() {
        // Use a platform var that is almost certainly unset in test runs.
        std::env::remove_var("OPENROUTER_API_KEY");
        let err = required_key(Platform::OpenRouter).unwrap_err();

        assert!(err
            .to_string()
            .contains("OPENROUTER_API_KEY environment variable not found"));
    }

    #[test]
    fn anthropic_response_takes_first_text_block() {
        let body = r#"{ "content": [ { "type": "text", "text": "hello" }, { "type": "text", "text": "ignored" } ] }"#;
        let message: AnthropicMessageResponse = serde_json::from_str(body).unwrap();

        let text = message
            .content
            .into_iter()
            .map(|block| block.text)
            .find(|text| !text.is_empty());
        assert_eq!(text.as_deref(), Some("hello"));
    }

    #[actix_rt::test]
    async fn dispatch_without_credentials_yields_error_payload() {
        std::env::remove_var("GROQ_API_KEY");
        let config = Arc::new(Config::test_config());
        let catalog = Arc::new(OllamaCatalog::new(config.ollama_base_url.clone()));
        let service = ModelService::new(config, catalog);

        let selection = ModelSelection::new(Platform::Groq, "llama3-70b-8192");
        let body = service
            .generate(&selection, "system", "prompt", QUESTION_MAX_TOKENS)
            .await;

        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(value["error"]
            .as_str()
            .unwrap()
            .contains("GROQ_API_KEY environment variable not found"));
    }

    #[actix_rt::test]
    async fn ollama_wildcard_without_local_models_yields_error_payload() {
        let mut config = Config::test_config();
        // Nothing listens here, so the wildcard cannot be pinned.
        config.ollama_base_url = "http://127.0.0.1:1".to_string();
        let config = Arc::new(config);
        let catalog = Arc::new(OllamaCatalog::new(config.ollama_base_url.clone()));
        let service = ModelService::new(config, catalog);

        let selection = ModelSelection::new(Platform::Ollama, OLLAMA_WILDCARD);
        let body = service
            .generate(&selection, "system", "prompt", QUESTION_MAX_TOKENS)
            .await;

        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(value["error"]
            .as_str()
            .unwrap()
            .contains("No Ollama models available"));
    }
}
