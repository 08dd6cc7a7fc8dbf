//! HTTP error mapping

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use techdesk_core::DeskError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Desk(#[from] DeskError),

    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Desk(DeskError::Validation(_)) => StatusCode::BAD_REQUEST,
            Self::Desk(DeskError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Desk(DeskError::Forbidden { .. }) => StatusCode::FORBIDDEN,
            Self::Desk(DeskError::InvalidState(_)) => StatusCode::CONFLICT,
            Self::Desk(DeskError::Dependency(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Desk(err) => err.code(),
            Self::Unauthorized(_) => "unauthorized",
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Desk(DeskError::Validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Desk(DeskError::Validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "service temporarily unavailable".to_string()
        } else {
            self.to_string()
        };
        let body = serde_json::json!({
            "error": self.code(),
            "message": message,
        });
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
