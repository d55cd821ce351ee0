use serde::Deserialize;
use validator::Validate;

use crate::models::domain::{QuestionFocus, QuestionKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Bquiz,
    Html,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Html
    }
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Bquiz => "bquiz",
            OutputFormat::Html => "html",
        }
    }
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct GenerateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub topic: String,

    #[validate(length(min = 1, max = 200))]
    pub subtopic: Option<String>,

    #[serde(default)]
    pub question_type: QuestionKind,

    #[serde(default)]
    pub question_focus: QuestionFocus,

    #[serde(default = "default_difficulty")]
    #[validate(length(min = 1, max = 50))]
    pub difficulty: String,

    #[serde(default = "default_num_questions")]
    #[validate(range(min = 1, max = 5))]
    pub num_questions: u8,

    #[serde(default)]
    pub output_format: OutputFormat,

    pub model: Option<String>,

    pub platform: Option<String>,
}

fn default_difficulty() -> String {
    "challenging".to_string()
}

fn default_num_questions() -> u8 {
    5
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TestAgentRequest {
    pub prompt: Option<String>,
    pub model: Option<String>,
    pub platform: Option<String>,
}
