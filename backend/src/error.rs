use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use shared::CropType;
use strum::IntoEnumIterator;
use thiserror::Error;

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("unknown crop type: {given}. Supported: {}", .supported.join(", "))]
    UnknownCrop {
        given: String,
        supported: Vec<String>,
    },
    #[error("model inference error: {0}")]
    Inference(#[from] tch::TchError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("detection {0} not found")]
    NotFound(i64),
}

impl ApiError {
    pub fn unknown_crop(given: &str) -> Self {
        ApiError::UnknownCrop {
            given: given.to_string(),
            supported: CropType::iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Decode(_) | ApiError::UnknownCrop { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Inference(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_crop_lists_supported_set() {
        let err = ApiError::unknown_crop("banana");
        let msg = err.to_string();
        assert!(msg.contains("banana"));
        assert!(msg.contains("maize"));
        assert!(msg.contains("cassava"));
        assert!(msg.contains("tomato"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
