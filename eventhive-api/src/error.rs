use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use eventhive_catalog::CatalogError;
use eventhive_core::{BookingError, IdentityError};
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            },
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            },
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        let msg = err.to_string();
        match err {
            BookingError::UnknownEvent(_) => AppError::NotFoundError(msg),
            BookingError::InvalidQuantity(_) => AppError::ValidationError(msg),
            BookingError::Unauthenticated => AppError::AuthenticationError(msg),
            BookingError::InsufficientInventory { .. } => AppError::ConflictError(msg),
            BookingError::Catalog(_) | BookingError::Journal(_) => AppError::InternalServerError(msg),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation(msg) => AppError::ValidationError(msg),
            CatalogError::Storage(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        let msg = err.to_string();
        match err {
            IdentityError::EmailTaken(_) => AppError::ConflictError(msg),
            IdentityError::Validation(_) => AppError::ValidationError(msg),
            IdentityError::Storage(_) => AppError::InternalServerError(msg),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}
