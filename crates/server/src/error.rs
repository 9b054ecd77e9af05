use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::rate::RateError;
use thiserror::Error;
use utils::response::ApiResponse;

use crate::middleware::AuthError;

/// Body of every 400 caused by an absent or unusable field.
pub const MISSING_INFORMATION: &str = "The request has missing information!";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("Bad Request: {0}")]
    BadRequest(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl From<RateError> for ApiError {
    fn from(err: RateError) -> Self {
        match err {
            RateError::Database(e) => ApiError::Database(e),
            RateError::InvalidDate(_) => ApiError::BadRequest("Invalid date".into()),
            // zero and negative rates are treated like a missing value
            RateError::InvalidValue(_) => ApiError::BadRequest(MISSING_INFORMATION.into()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = match &self {
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
        };

        // storage messages are passed through verbatim, the admin UI shows them as-is
        let error_message = match &self {
            ApiError::Auth(e) => e.to_string(),
            ApiError::Database(e) => e.to_string(),
            ApiError::BadRequest(msg) | ApiError::Forbidden(msg) => msg.clone(),
        };

        if status_code.is_server_error() {
            tracing::error!("{}", self);
        }

        let response = ApiResponse::<()>::error(&error_message);
        (status_code, Json(response)).into_response()
    }
}
