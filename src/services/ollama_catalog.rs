use serde::Deserialize;

use crate::errors::{AppError, AppResult};
use crate::services::platform_resolver::sort_by_parameter_size;

/// Queries a local Ollama instance for the models it can serve.
///
/// Discovery is best-effort by contract: a stopped daemon, a connection
/// failure, or a malformed tag listing all count as "no local models".
pub struct OllamaCatalog {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TaggedModel>,
}

#[derive(Debug, Deserialize)]
struct TaggedModel {
    name: String,
}

impl OllamaCatalog {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Model names currently available locally, sorted smallest parameter
    /// size first. Returns an empty list on any transport or parse failure.
    pub async fn available_models(&self) -> Vec<String> {
        match self.fetch_tags().await {
            Ok(mut names) => {
                if names.is_empty() {
                    log::warn!("Ollama is running but no models are available");
                } else {
                    log::info!("Found {} Ollama models: {}", names.len(), names.join(", "));
                }
                sort_by_parameter_size(&mut names);
                names
            }
            Err(err) => {
                log::warn!("Failed to list Ollama models ({}); is Ollama running?", err);
                Vec::new()
            }
        }
    }

    async fn fetch_tags(&self) -> AppResult<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.http.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(AppError::TransportError(format!(
                "Ollama tag listing returned status {}",
                response.status()
            )));
        }

        let tags: TagsResponse = response.json().await?;
        Ok(tags.models.into_iter().map(|model| model.name).collect())
    }
}
