use actix_web::{get, post, web, HttpResponse};
use serde_json::json;

use crate::{
    app_state::AppState,
    errors::AppError,
    models::dto::{GenerateQuizRequest, TestAgentRequest},
};

#[post("/api/quizzes/generate")]
pub async fn generate_quiz(
    state: web::Data<AppState>,
    request: web::Json<GenerateQuizRequest>,
) -> Result<HttpResponse, AppError> {
    let response = state.quiz_service.generate_quiz(request.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/api/host_agent/test")]
pub async fn test_host_agent(
    state: web::Data<AppState>,
    request: web::Json<TestAgentRequest>,
) -> Result<HttpResponse, AppError> {
    let response = state.quiz_service.test_agent(request.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/health")]
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}
