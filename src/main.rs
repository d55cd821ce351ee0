use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};

use quizforge_server::app_state::AppState;
use quizforge_server::config::Config;
use quizforge_server::handlers;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env();
    let state = AppState::new(config.clone());

    log::info!(
        "starting HTTP server on {}:{}",
        config.web_server_host,
        config.web_server_port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .service(handlers::generate_quiz)
            .service(handlers::test_host_agent)
            .service(handlers::health_check)
    })
    .bind((config.web_server_host.as_str(), config.web_server_port))?
    .run()
    .await
}
