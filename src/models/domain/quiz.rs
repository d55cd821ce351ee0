use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::Question;

/// The assembled quiz artifact written to disk as a `.bquiz` document or
/// embedded into the HTML page.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct QuizDocument {
    pub id: String,
    pub name: String,
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtopic: Option<String>,
    pub date_added: DateTime<Utc>,
    pub questions: Vec<Question>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub microcourse: Option<String>,
}

impl QuizDocument {
    pub fn new(
        topic: impl Into<String>,
        subtopic: Option<String>,
        questions: Vec<Question>,
        microcourse: Option<String>,
    ) -> Self {
        let topic = topic.into();
        let name = match &subtopic {
            Some(subtopic) => format!("Quiz on {} - {}", topic, subtopic),
            None => format!("Quiz on {}", topic),
        };

        Self {
            id: Uuid::new_v4().to_string(),
            name,
            topic,
            subtopic,
            date_added: Utc::now(),
            questions,
            microcourse,
        }
    }
}
