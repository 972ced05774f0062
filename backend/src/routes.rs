use crate::db::history_repository::{HistoryRepository, NewDetection};
use crate::error::ApiError;
use crate::pipeline::Pipeline;
use actix_multipart::Multipart;
use actix_web::{Error, HttpResponse, web};
use futures::{StreamExt, TryStreamExt};
use serde::Deserialize;
use serde_json::json;
use std::io::Write;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(root)))
        .service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/api/detect/crop-type").route(web::post().to(detect_crop_type)))
        .service(web::resource("/api/detect/disease").route(web::post().to(detect_disease)))
        .service(web::resource("/api/detect/full").route(web::post().to(full_detection)))
        .service(
            web::resource("/api/recommendations/{crop_type}/{disease}")
                .route(web::get().to(get_recommendations)),
        )
        .service(web::resource("/api/languages").route(web::get().to(get_languages)))
        .service(
            web::resource("/api/history")
                .route(web::get().to(get_history))
                .route(web::post().to(save_detection)),
        )
        .service(
            web::resource("/api/history/{id}")
                .route(web::get().to(get_detection))
                .route(web::delete().to(delete_detection)),
        );
}

fn default_language() -> String {
    "en".to_string()
}

#[derive(Deserialize)]
struct DiseaseQuery {
    crop_type: Option<String>,
    #[serde(default = "default_language")]
    language: String,
}

#[derive(Deserialize)]
struct LanguageQuery {
    #[serde(default = "default_language")]
    language: String,
}

fn default_limit() -> i64 {
    100
}

#[derive(Deserialize)]
struct HistoryQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
}

/// Drains the first non-empty multipart field as the uploaded image.
async fn read_image(mut payload: Multipart) -> Result<Vec<u8>, Error> {
    let mut image_data = Vec::new();
    while let Ok(Some(mut field)) = payload.try_next().await {
        while let Some(chunk) = field.next().await {
            let data = chunk?;
            image_data.write_all(&data)?;
        }
        if !image_data.is_empty() {
            break;
        }
    }
    Ok(image_data)
}

async fn root() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "message": "AI Crop Doctor API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "healthy",
        "supported_crops": ["maize", "cassava", "tomato"]
    }))
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "models_loaded": true
    }))
}

async fn detect_crop_type(
    pipeline: web::Data<Pipeline>,
    payload: Multipart,
) -> Result<HttpResponse, Error> {
    let image_data = read_image(payload).await?;
    let response = pipeline.detect_crop(&image_data)?;
    Ok(HttpResponse::Ok().json(response))
}

async fn detect_disease(
    pipeline: web::Data<Pipeline>,
    query: web::Query<DiseaseQuery>,
    payload: Multipart,
) -> Result<HttpResponse, Error> {
    let image_data = read_image(payload).await?;
    let response =
        pipeline.detect_disease(&image_data, query.crop_type.as_deref(), &query.language)?;
    Ok(HttpResponse::Ok().json(response))
}

async fn full_detection(
    pipeline: web::Data<Pipeline>,
    query: web::Query<LanguageQuery>,
    payload: Multipart,
) -> Result<HttpResponse, Error> {
    let image_data = read_image(payload).await?;
    let response = pipeline.detect_full(&image_data, &query.language)?;
    Ok(HttpResponse::Ok().json(response))
}

async fn get_recommendations(
    pipeline: web::Data<Pipeline>,
    path: web::Path<(String, String)>,
    query: web::Query<LanguageQuery>,
) -> HttpResponse {
    let (crop_type, disease) = path.into_inner();
    let recommendations = pipeline
        .recommendations()
        .resolve(&crop_type, &disease, &query.language);
    HttpResponse::Ok().json(recommendations)
}

async fn get_languages() -> HttpResponse {
    HttpResponse::Ok().json(shared::SUPPORTED_LANGUAGES)
}

async fn get_history(
    repo: web::Data<HistoryRepository>,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse, ApiError> {
    let history = repo.list(query.skip, query.limit).await?;
    Ok(HttpResponse::Ok().json(history))
}

async fn get_detection(
    repo: web::Data<HistoryRepository>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let detection = repo.get(id).await?.ok_or(ApiError::NotFound(id))?;
    Ok(HttpResponse::Ok().json(detection))
}

async fn save_detection(
    repo: web::Data<HistoryRepository>,
    detection: web::Json<NewDetection>,
) -> Result<HttpResponse, ApiError> {
    let saved = repo.save(&detection).await?;
    Ok(HttpResponse::Created().json(saved))
}

async fn delete_detection(
    repo: web::Data<HistoryRepository>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    if !repo.delete(id).await? {
        return Err(ApiError::NotFound(id));
    }
    Ok(HttpResponse::Ok().json(json!({"message": "Detection deleted successfully"})))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use actix_web::{App, test};

    macro_rules! test_app {
        () => {{
            let pipeline = web::Data::new(Pipeline::new(&Settings::from_env()));
            let repo = web::Data::new(HistoryRepository::connect("sqlite::memory:").await.unwrap());
            test::init_service(
                App::new()
                    .app_data(pipeline)
                    .app_data(repo)
                    .configure(configure_routes),
            )
            .await
        }};
    }

    #[actix_web::test]
    async fn health_and_root_respond() {
        let app = test_app!();
        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert!(resp.status().is_success());
        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert!(resp.status().is_success());
    }

    #[actix_web::test]
    async fn languages_lists_all_five() {
        let app = test_app!();
        let req = test::TestRequest::get().uri("/api/languages").to_request();
        let langs: Vec<serde_json::Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(langs.len(), 5);
        assert_eq!(langs[0]["code"], "en");
    }

    #[actix_web::test]
    async fn recommendations_degrade_for_unknown_diseases() {
        let app = test_app!();
        let req = test::TestRequest::get()
            .uri("/api/recommendations/maize/unknown_disease")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["disease_name"], "unknown_disease");
        assert_eq!(body["severity"], "medium");
        assert_eq!(body["urgency"], "medium");
    }

    #[actix_web::test]
    async fn history_crud_round_trip() {
        let app = test_app!();

        let req = test::TestRequest::post()
            .uri("/api/history")
            .set_json(json!({
                "crop_type": "maize",
                "disease": "common_rust",
                "confidence": 0.77,
                "severity": "low"
            }))
            .to_request();
        let saved: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let id = saved["id"].as_i64().unwrap();
        assert_eq!(saved["language"], "en");

        let req = test::TestRequest::get().uri("/api/history").to_request();
        let listed: Vec<serde_json::Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed.len(), 1);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/history/{id}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let req = test::TestRequest::get()
            .uri(&format!("/api/history/{id}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
    }
}
