// region:    --- Imports
use crate::store::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

// endregion: --- Imports

// region:    --- Api Error

/// API 오류 분류
/// 클라이언트에 내려가는 메시지는 영문 계약 문자열을 유지한다.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    InvalidState(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    InvalidInput(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            ApiError::InvalidState(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, json!({ "error": msg })),
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, json!({ "error": "Unauthorized" })),
            ApiError::Store(e) => {
                error!("{:<12} --> 저장소 오류: {:?}", "Handler", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error", "message": e.to_string() }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

// endregion: --- Api Error
