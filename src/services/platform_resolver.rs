use std::collections::HashSet;
use std::env;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::services::ollama_catalog::OllamaCatalog;

/// An LLM backend the generator knows how to talk to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Anthropic,
    OpenAi,
    OpenRouter,
    Groq,
    Ollama,
}

/// Platform chosen when a model or platform name is not recognized.
pub const FALLBACK_PLATFORM: Platform = Platform::Anthropic;

/// Zero-config probe order. Position encodes the cost/quality policy for
/// unconfigured use and must not be reordered casually.
pub const FALLBACK_PRIORITY: [Platform; 5] = [
    Platform::Anthropic,
    Platform::OpenAi,
    Platform::OpenRouter,
    Platform::Groq,
    Platform::Ollama,
];

/// Model token that asks for the smallest locally available model.
pub const OLLAMA_WILDCARD: &str = "ollama";
/// Marker prefix for explicit local models, e.g. `ollama:llama3`.
pub const OLLAMA_MODEL_PREFIX: &str = "ollama:";

/// Lexical model-name prefixes mapped to the platform that serves them.
const MODEL_PREFIXES: [(&str, Platform); 4] = [
    ("claude", Platform::Anthropic),
    ("gpt", Platform::OpenAi),
    ("llama", Platform::Groq),
    ("qwen", Platform::OpenRouter),
];

impl Platform {
    pub fn name(&self) -> &'static str {
        match self {
            Platform::Anthropic => "anthropic",
            Platform::OpenAi => "openai",
            Platform::OpenRouter => "openrouter",
            Platform::Groq => "groq",
            Platform::Ollama => "ollama",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "anthropic" => Some(Platform::Anthropic),
            "openai" => Some(Platform::OpenAi),
            "openrouter" => Some(Platform::OpenRouter),
            "groq" => Some(Platform::Groq),
            "ollama" => Some(Platform::Ollama),
            _ => None,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Platform::Anthropic => "claude-3-7-sonnet-20250219",
            Platform::OpenAi => "gpt-4o",
            Platform::OpenRouter => "qwen/qwen-2.5-72b-instruct:free",
            Platform::Groq => "llama3-70b-8192",
            // Resolved to the smallest available local model at dispatch time.
            Platform::Ollama => OLLAMA_WILDCARD,
        }
    }

    /// Environment variable whose presence makes this platform usable.
    /// Ollama has no credential; it is probed through its tag listing.
    pub fn credential_var(&self) -> Option<&'static str> {
        match self {
            Platform::Anthropic => Some("ANTHROPIC_API_KEY"),
            Platform::OpenAi => Some("OPENAI_API_KEY"),
            Platform::OpenRouter => Some("OPENROUTER_API_KEY"),
            Platform::Groq => Some("GROQ_API_KEY"),
            Platform::Ollama => None,
        }
    }
}

/// A concrete (platform, model) pair for one generation request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelSelection {
    pub platform: Platform,
    pub model: String,
}

impl ModelSelection {
    pub fn new(platform: Platform, model: impl Into<String>) -> Self {
        Self {
            platform,
            model: model.into(),
        }
    }
}

/// Outcome of a resolution. `Unavailable` is a legitimate terminal state,
/// not an error; callers degrade to the setup-tutorial path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Selected(ModelSelection),
    Unavailable,
}

/// Snapshot of what the environment can currently serve. Gathered fresh for
/// every resolution; a local runtime may have started or stopped since the
/// last call.
#[derive(Clone, Debug, Default)]
pub struct AvailabilityEvidence {
    credentials: HashSet<Platform>,
    local_models: Vec<String>,
}

impl AvailabilityEvidence {
    pub fn new(
        credentials: impl IntoIterator<Item = Platform>,
        mut local_models: Vec<String>,
    ) -> Self {
        sort_by_parameter_size(&mut local_models);
        Self {
            credentials: credentials.into_iter().collect(),
            local_models,
        }
    }

    /// Reads credential env vars and queries the local catalog. Never fails:
    /// a broken catalog simply contributes zero local models.
    pub async fn gather(catalog: &OllamaCatalog) -> Self {
        let credentials = FALLBACK_PRIORITY
            .iter()
            .copied()
            .filter(|platform| {
                platform
                    .credential_var()
                    .is_some_and(|var| env::var(var).is_ok_and(|value| !value.is_empty()))
            })
            .collect();

        Self {
            credentials,
            local_models: catalog.available_models().await,
        }
    }

    pub fn has_credential(&self, platform: Platform) -> bool {
        self.credentials.contains(&platform)
    }

    /// Local model names, smallest parameter size first.
    pub fn local_models(&self) -> &[String] {
        &self.local_models
    }
}

/// Picks the (platform, model) pair for a request. First matching rule wins:
///
/// 1. Both explicit: used verbatim, evidence is not consulted.
/// 2. Model only: platform inferred from the model-name prefix table.
/// 3. Platform only: that platform's default model.
/// 4. Neither: first platform in [`FALLBACK_PRIORITY`] the evidence supports,
///    or [`Resolution::Unavailable`] when none qualifies.
pub fn resolve(
    explicit_platform: Option<&str>,
    explicit_model: Option<&str>,
    evidence: &AvailabilityEvidence,
) -> Resolution {
    match (explicit_platform, explicit_model) {
        (Some(platform), Some(model)) => {
            let platform = Platform::from_name(platform).unwrap_or(FALLBACK_PLATFORM);
            log::info!(
                "Using explicitly specified platform {} and model {}",
                platform.name(),
                model
            );
            Resolution::Selected(ModelSelection::new(platform, model))
        }
        (None, Some(model)) => {
            let platform = platform_for_model(model);
            log::info!(
                "Determined platform {} from specified model {}",
                platform.name(),
                model
            );
            Resolution::Selected(ModelSelection::new(platform, model))
        }
        (Some(platform), None) => {
            let platform = Platform::from_name(platform).unwrap_or(FALLBACK_PLATFORM);
            log::info!(
                "Using specified platform {} with default model {}",
                platform.name(),
                platform.default_model()
            );
            Resolution::Selected(ModelSelection::new(platform, platform.default_model()))
        }
        (None, None) => {
            for platform in FALLBACK_PRIORITY {
                match platform {
                    Platform::Ollama => {
                        if let Some(smallest) = evidence.local_models().first() {
                            log::info!("Using Ollama platform with model {}", smallest);
                            return Resolution::Selected(ModelSelection::new(
                                platform,
                                format!("{}{}", OLLAMA_MODEL_PREFIX, smallest),
                            ));
                        }
                    }
                    _ => {
                        if evidence.has_credential(platform) {
                            log::info!("Using {} platform (API key found)", platform.name());
                            return Resolution::Selected(ModelSelection::new(
                                platform,
                                platform.default_model(),
                            ));
                        }
                    }
                }
            }

            log::warn!("No API keys or Ollama models found; no platform is available");
            Resolution::Unavailable
        }
    }
}

fn platform_for_model(model: &str) -> Platform {
    if model == OLLAMA_WILDCARD || model.starts_with(OLLAMA_MODEL_PREFIX) {
        return Platform::Ollama;
    }
    for (prefix, platform) in MODEL_PREFIXES {
        if model.starts_with(prefix) {
            return platform;
        }
    }
    if model.contains("openrouter") {
        return Platform::OpenRouter;
    }
    FALLBACK_PLATFORM
}

static PARAM_SIZE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)b").expect("parameter-size pattern is valid"));

/// Parameter count parsed from a model name like `qwen2.5:3b`. Names without
/// a recognizable size sort after every parseable name.
fn parameter_size(name: &str) -> u64 {
    PARAM_SIZE
        .captures(&name.to_lowercase())
        .and_then(|captures| captures.get(1))
        .and_then(|digits| digits.as_str().parse().ok())
        .unwrap_or(u64::MAX)
}

/// Orders model names by ascending parameter size, unparseable names last.
/// Smallest-first prefers fast iteration over capability for local models.
pub fn sort_by_parameter_size(models: &mut [String]) {
    models.sort_by_key(|name| parameter_size(name));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_evidence() -> AvailabilityEvidence {
        AvailabilityEvidence::new([], vec![])
    }

    #[test]
    fn explicit_platform_and_model_used_verbatim() {
        let resolution = resolve(Some("groq"), Some("llama3-8b-8192"), &no_evidence());

        assert_eq!(
            resolution,
            Resolution::Selected(ModelSelection::new(Platform::Groq, "llama3-8b-8192"))
        );
    }

    #[test]
    fn explicit_pair_ignores_missing_evidence() {
        // Rule 1 trusts the caller even when nothing is configured.
        let resolution = resolve(Some("openai"), Some("gpt-4o-mini"), &no_evidence());

        assert_eq!(
            resolution,
            Resolution::Selected(ModelSelection::new(Platform::OpenAi, "gpt-4o-mini"))
        );
    }

    #[test]
    fn platform_inferred_from_model_prefix() {
        let cases = [
            ("claude-3-7-sonnet-20250219", Platform::Anthropic),
            ("gpt-4o", Platform::OpenAi),
            ("llama3-70b-8192", Platform::Groq),
            ("qwen/qwen-2.5-72b-instruct:free", Platform::OpenRouter),
            ("mistralai/mistral-7b:openrouter", Platform::OpenRouter),
            ("ollama", Platform::Ollama),
            ("ollama:llama3", Platform::Ollama),
        ];

        for (model, expected) in cases {
            let resolution = resolve(None, Some(model), &no_evidence());
            assert_eq!(
                resolution,
                Resolution::Selected(ModelSelection::new(expected, model)),
                "model {model} should map to {expected:?}"
            );
        }
    }

    #[test]
    fn unknown_model_prefix_falls_back_with_model_retained() {
        let resolution = resolve(None, Some("mystery-model-9000"), &no_evidence());

        assert_eq!(
            resolution,
            Resolution::Selected(ModelSelection::new(FALLBACK_PLATFORM, "mystery-model-9000"))
        );
    }

    #[test]
    fn explicit_platform_gets_its_default_model() {
        let resolution = resolve(Some("openrouter"), None, &no_evidence());

        assert_eq!(
            resolution,
            Resolution::Selected(ModelSelection::new(
                Platform::OpenRouter,
                "qwen/qwen-2.5-72b-instruct:free"
            ))
        );
    }

    #[test]
    fn unknown_platform_falls_back_to_default_pair() {
        let resolution = resolve(Some("not-a-platform"), None, &no_evidence());

        assert_eq!(
            resolution,
            Resolution::Selected(ModelSelection::new(
                FALLBACK_PLATFORM,
                FALLBACK_PLATFORM.default_model()
            ))
        );
    }

    #[test]
    fn probe_order_prefers_earlier_platforms() {
        let evidence = AvailabilityEvidence::new(
            [Platform::Groq, Platform::OpenAi],
            vec!["llama3:8b".to_string()],
        );

        let resolution = resolve(None, None, &evidence);

        assert_eq!(
            resolution,
            Resolution::Selected(ModelSelection::new(Platform::OpenAi, "gpt-4o"))
        );
    }

    #[test]
    fn local_models_selected_only_as_last_resort() {
        let evidence =
            AvailabilityEvidence::new([], vec!["modelA:70b".to_string(), "modelB:3b".to_string()]);

        let resolution = resolve(None, None, &evidence);

        assert_eq!(
            resolution,
            Resolution::Selected(ModelSelection::new(Platform::Ollama, "ollama:modelB:3b"))
        );
    }

    #[test]
    fn nothing_available_resolves_to_unavailable() {
        assert_eq!(resolve(None, None, &no_evidence()), Resolution::Unavailable);
    }

    #[test]
    fn resolution_is_deterministic_across_calls() {
        let evidence = AvailabilityEvidence::new([Platform::Anthropic], vec![]);

        let first = resolve(None, None, &evidence);
        let second = resolve(None, None, &evidence);

        assert_eq!(first, second);
    }

    #[test]
    fn parameter_size_sort_puts_unparseable_last() {
        let mut models = vec![
            "modelA:70b".to_string(),
            "modelB:3b".to_string(),
            "modelC".to_string(),
        ];

        sort_by_parameter_size(&mut models);

        assert_eq!(models, vec!["modelB:3b", "modelA:70b", "modelC"]);
    }

    #[test]
    fn parameter_size_ignores_case_and_version_digits() {
        assert_eq!(parameter_size("Qwen2.5:3B"), 3);
        assert_eq!(parameter_size("llama3-70b-8192"), 70);
        assert_eq!(parameter_size("mistral-nemo"), u64::MAX);
    }
}
