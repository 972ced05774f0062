mod config;
mod db;
mod error;
mod pipeline;
mod recommend;
mod routes;
mod vision;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use config::Settings;
use db::history_repository::HistoryRepository;
use pipeline::Pipeline;
use routes::configure_routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    dotenv::dotenv().ok();

    let settings = Settings::from_env();

    log::info!("Starting AI Crop Doctor API");
    let pipeline = Pipeline::new(&settings);
    pipeline.load_models();
    log::info!("Models loaded");

    let history = HistoryRepository::connect(&settings.database_url)
        .await
        .map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("History store initialization failed: {e}"),
            )
        })?;
    log::info!("Database initialized");

    let pipeline = web::Data::new(pipeline);
    let history = web::Data::new(history);

    let bind_address = format!("0.0.0.0:{}", settings.port);
    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::AUTHORIZATION,
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(pipeline.clone())
            .app_data(history.clone())
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
