use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    AuthError(String),
    Forbidden(String),
    DocumentNotFound(Uuid),
    UserNotFound(String),
    ShareNotFound,
    DatabaseError(sqlx::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(e) => (StatusCode::BAD_REQUEST, e),
            Self::AuthError(e) => (
                StatusCode::UNAUTHORIZED,
                format!("Authorization error: {}", e),
            ),
            Self::Forbidden(e) => (StatusCode::FORBIDDEN, e),
            Self::DocumentNotFound(doc_id) => (
                StatusCode::NOT_FOUND,
                format!("Document {} could not be found for user", doc_id),
            ),
            Self::UserNotFound(email) => (
                StatusCode::NOT_FOUND,
                format!("User not found with email {}", email),
            ),
            Self::ShareNotFound => (
                StatusCode::NOT_FOUND,
                "Share could not be found".to_string(),
            ),
            Self::DatabaseError(error) => {
                tracing::error!(?error, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error has occured".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        Self::DatabaseError(error)
    }
}
