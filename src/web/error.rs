use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::api::ApiError;
use crate::services::registration_service::RegistrationError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not Found: {0}")]
    NotFound(String),
    /// The page needs a session; answered with a redirect to the login page.
    #[error("Login required")]
    LoginRequired { locale: String },
    #[error("Backend error: {0}")]
    Api(#[from] ApiError),
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::LoginRequired { locale } => {
                return Redirect::to(&format!("/{locale}/login")).into_response();
            }
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Api(err) => (err.http_status(), err.to_string()),
            AppError::Template(err) => {
                tracing::error!(error = ?err, "Template rendering failed.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Template rendering failed".to_string(),
                )
            }
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {msg}"),
            ),
            AppError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({ "error": error_message }))).into_response()
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InternalServerError(format!("JSON serialization/deserialization error: {err}"))
    }
}

impl From<RegistrationError> for AppError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::InvalidInput(msg) => AppError::InvalidInput(msg),
            RegistrationError::EmailTaken => AppError::InvalidInput(err.to_string()),
            RegistrationError::Database(e) => AppError::DatabaseError(e.to_string()),
            RegistrationError::Api(e) => AppError::Api(e),
        }
    }
}
