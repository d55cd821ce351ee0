pub mod model_service;
pub mod ollama_catalog;
pub mod output_service;
pub mod platform_resolver;
pub mod question_service;
pub mod quiz_service;
pub mod response_recovery;

pub use model_service::{CompletionDispatch, ModelService};
pub use ollama_catalog::OllamaCatalog;
pub use output_service::OutputService;
pub use question_service::QuestionService;
pub use quiz_service::QuizService;
