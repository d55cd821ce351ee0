use serde::{Deserialize, Serialize};

/// The kinds of questions the generator can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice,
    TrueFalse,
    Cloze,
}

impl Default for QuestionKind {
    fn default() -> Self {
        QuestionKind::MultipleChoice
    }
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "multiple_choice",
            QuestionKind::TrueFalse => "true_false",
            QuestionKind::Cloze => "cloze",
        }
    }
}

/// Whether a question is built around prose or around a code snippet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionFocus {
    Text,
    Code,
}

impl Default for QuestionFocus {
    fn default() -> Self {
        QuestionFocus::Text
    }
}

/// A fully recovered question record. This is the shape the output layer
/// consumes; every generation call produces one, even on parse failure.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Question {
    MultipleChoice(MultipleChoiceQuestion),
    TrueFalse(TrueFalseQuestion),
    Cloze(ClozeQuestion),
}

impl Question {
    pub fn kind(&self) -> QuestionKind {
        match self {
            Question::MultipleChoice(_) => QuestionKind::MultipleChoice,
            Question::TrueFalse(_) => QuestionKind::TrueFalse,
            Question::Cloze(_) => QuestionKind::Cloze,
        }
    }

    pub fn question_text(&self) -> &str {
        match self {
            Question::MultipleChoice(q) => &q.question,
            Question::TrueFalse(q) => &q.question,
            Question::Cloze(q) => &q.question,
        }
    }

    pub fn explanation(&self) -> &str {
        match self {
            Question::MultipleChoice(q) => &q.explanation,
            Question::TrueFalse(q) => &q.explanation,
            Question::Cloze(q) => &q.explanation,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct MultipleChoiceQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
    pub topic: String,
    pub subtopic: Option<String>,
    pub focus: QuestionFocus,
    pub language: Option<String>,
    pub concept_phrase: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct TrueFalseQuestion {
    pub question: String,
    pub correct_answer: bool,
    pub explanation: String,
    pub topic: String,
    pub subtopic: Option<String>,
    pub focus: QuestionFocus,
    pub language: Option<String>,
    pub concept_phrase: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ClozeQuestion {
    pub question: String,
    pub correct_answer: String,
    pub explanation: String,
    pub topic: String,
    pub subtopic: Option<String>,
    pub focus: QuestionFocus,
    pub language: Option<String>,
    pub concept_phrase: String,
}
