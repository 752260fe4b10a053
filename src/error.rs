use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::registration::RegistrationError;

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
    BadRequest(String),
    Conflict(String),
    RateLimited(String),
    BadGateway(String),
    Internal(String),
    Database(sqlx::Error),
    Registration(RegistrationError),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            AppError::Conflict(msg) => write!(f, "Conflict: {msg}"),
            AppError::RateLimited(msg) => write!(f, "Rate Limited: {msg}"),
            AppError::BadGateway(msg) => write!(f, "Bad Gateway: {msg}"),
            AppError::Internal(msg) => write!(f, "Internal Error: {msg}"),
            AppError::Database(err) => write!(f, "Database Error: {err}"),
            AppError::Registration(err) => write!(f, "Registration failed: {err}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::RateLimited(msg) => (StatusCode::TOO_MANY_REQUESTS, msg.clone()),
            AppError::BadGateway(msg) => {
                tracing::warn!("Upstream error: {msg}");
                (StatusCode::BAD_GATEWAY, msg.clone())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Database(err) => {
                tracing::error!("Database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Registration(err) => return registration_response(err),
        };

        let body = json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn registration_response(err: &RegistrationError) -> Response {
    let status = match err {
        RegistrationError::NotFound => StatusCode::NOT_FOUND,
        RegistrationError::Forbidden => StatusCode::FORBIDDEN,
        RegistrationError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        RegistrationError::ExternalIdentityNotFound(_) => StatusCode::UNPROCESSABLE_ENTITY,
        RegistrationError::DuplicateMember(_) => StatusCode::CONFLICT,
        RegistrationError::ProvisioningFailed(_) | RegistrationError::ExternalServiceError(_) => {
            StatusCode::BAD_GATEWAY
        }
        RegistrationError::PersistenceError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let message = match err {
        RegistrationError::PersistenceError(detail) => {
            tracing::error!("Group persistence failed: {detail}");
            "Internal server error".to_string()
        }
        RegistrationError::ProvisioningFailed(detail)
        | RegistrationError::ExternalServiceError(detail) => {
            tracing::warn!("GitHub call failed during registration: {detail}");
            err.to_string()
        }
        _ => err.to_string(),
    };

    let mut body = json!({ "error": message, "code": err.code() });
    if let Some(username) = err.username() {
        body["username"] = json!(username);
    }
    (status, axum::Json(body)).into_response()
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}

impl From<RegistrationError> for AppError {
    fn from(err: RegistrationError) -> Self {
        AppError::Registration(err)
    }
}
