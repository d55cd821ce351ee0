use std::sync::Arc;

use crate::{
    config::Config,
    services::{
        CompletionDispatch, ModelService, OllamaCatalog, OutputService, QuestionService,
        QuizService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub quiz_service: Arc<QuizService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        let catalog = Arc::new(OllamaCatalog::new(config.ollama_base_url.clone()));
        let dispatch: Arc<dyn CompletionDispatch> =
            Arc::new(ModelService::new(config.clone(), catalog.clone()));
        let question_service = Arc::new(QuestionService::new(dispatch.clone()));
        let output_service = Arc::new(OutputService::new(config.output_dir.clone()));
        let quiz_service = Arc::new(QuizService::new(
            dispatch,
            question_service,
            output_service,
            catalog,
        ));

        Self {
            quiz_service,
            config,
        }
    }
}
