use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use serde::Serialize;

use crate::catalog::CatalogError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `NOT_FOUND`,
    /// `STORAGE_WRITE_ERROR`, `PERSISTENCE_ERROR`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Name must be 1-250 characters")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    NotFound(String),
    /// Blob store write failed; the operation was aborted with the entity
    /// state unchanged.
    StorageWrite(String),
    /// Repository read/write failed.
    Persistence(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::StorageWrite(detail) => {
                tracing::error!("Blob store write failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "STORAGE_WRITE_ERROR",
                        message: "Image storage is unavailable".into(),
                    },
                )
            }
            AppError::Persistence(detail) => {
                tracing::error!("Repository operation failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "PERSISTENCE_ERROR",
                        message: "The catalog database is unavailable".into(),
                    },
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(handle) => {
                AppError::NotFound(format!("Image '{handle}' not found"))
            }
            StorageError::InvalidHandle(msg) => AppError::Validation(msg),
            StorageError::Image(e) => AppError::Validation(format!("Unsupported image: {e}")),
            StorageError::SizeLimitExceeded { actual, limit } => AppError::Validation(format!(
                "Image exceeds size limit ({actual} > {limit} bytes)"
            )),
            StorageError::Io(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(kind) => {
                let mut msg = kind.to_string();
                if let Some(first) = msg.get_mut(..1) {
                    first.make_ascii_uppercase();
                }
                AppError::NotFound(format!("{msg} not found"))
            }
            CatalogError::StorageWrite(StorageError::Image(e)) => {
                AppError::Validation(format!("Unsupported image: {e}"))
            }
            CatalogError::StorageWrite(StorageError::SizeLimitExceeded { actual, limit }) => {
                AppError::Validation(format!(
                    "Image exceeds size limit ({actual} > {limit} bytes)"
                ))
            }
            CatalogError::StorageWrite(e) => AppError::StorageWrite(e.to_string()),
            CatalogError::Persistence(e) => AppError::Persistence(e.to_string()),
        }
    }
}
