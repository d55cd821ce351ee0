use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
pub struct GenerateQuizResponse {
    pub file_path: String,
    pub format: String,
    pub num_questions: usize,
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtopic: Option<String>,
    pub model_used: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct TestAgentResponse {
    pub raw_response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed_json: Option<serde_json::Value>,
    pub is_valid_json: bool,
}
