//! Error types for the catalog server

use std::collections::BTreeMap;

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sqlx::error::ErrorKind;
use thiserror::Error;

/// Per-field validation messages, keyed by field name
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Stable error codes exposed in every error body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    DbFailure = 2,
    NoSuchRecord = 3,
    BadValue = 4,
    Duplicate = 5,
    BadReference = 6,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {message}")]
    Validation { message: String, fields: FieldErrors },

    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("Reference error: {0}")]
    Reference(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Validation failure without field detail
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            fields: FieldErrors::new(),
        }
    }

    /// Validation failure attached to a single field
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut fields = FieldErrors::new();
        fields.insert(field.to_string(), vec![message.clone()]);
        AppError::Validation {
            message: format!("{}: {}", field, message),
            fields,
        }
    }

    /// Translate a failed write into the matching domain error.
    ///
    /// Constraint violations raised by the database keep the catalog invariants
    /// even when two requests race past the service-level checks.
    pub fn from_write(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db) = err {
            let constraint = db.constraint().unwrap_or("unknown").to_string();
            match db.kind() {
                ErrorKind::UniqueViolation => {
                    return AppError::Integrity(format!(
                        "Unique constraint {} violated",
                        constraint
                    ))
                }
                ErrorKind::ForeignKeyViolation => {
                    return AppError::Reference("Referenced author does not exist".to_string())
                }
                ErrorKind::NotNullViolation | ErrorKind::CheckViolation => {
                    return AppError::Integrity(format!("Constraint {} violated", constraint))
                }
                _ => {}
            }
            // string_data_right_truncation
            if db.code().as_deref() == Some("22001") {
                return AppError::validation(db.message().to_string());
            }
        }
        AppError::Database(err)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, errs) in errors.field_errors() {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            fields.insert(field.to_string(), messages);
        }
        let names: Vec<&str> = fields.keys().map(String::as_str).collect();
        AppError::Validation {
            message: format!("Invalid value for: {}", names.join(", ")),
            fields,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        // an id that cannot name a record is reported like an unknown one
        AppError::NotFound(rejection.body_text())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, fields) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchRecord, msg, None),
            AppError::Validation { message, fields } => {
                let fields = (!fields.is_empty()).then_some(fields);
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, message, fields)
            }
            AppError::Integrity(msg) => (StatusCode::CONFLICT, ErrorCode::Duplicate, msg, None),
            AppError::Reference(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadReference, msg, None)
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                    None,
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
            fields,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
