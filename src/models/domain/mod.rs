pub mod question;
pub mod quiz;

pub use question::{
    ClozeQuestion, MultipleChoiceQuestion, Question, QuestionFocus, QuestionKind,
    TrueFalseQuestion,
};
pub use quiz::QuizDocument;
