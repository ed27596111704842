use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use stockpile_db::StoreError;

/// Request-level failure taxonomy. Every domain check runs before mutation,
/// so any of these returned from a handler means no side effect happened.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("forbidden")]
    Forbidden,

    #[error("{0}")]
    Conflict(String),

    #[error("inventory was modified by another user, reload and retry")]
    VersionConflict,

    #[error("{0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => Self::NotFound(what),
            StoreError::Duplicate(what) => Self::Conflict(format!("{what} already exists")),
            StoreError::FieldTypeCap => {
                Self::Conflict("at most 3 fields of the same type per inventory".into())
            }
            StoreError::ForeignField {
                field_id,
                inventory_id,
            } => Self::BadRequest(format!(
                "field {field_id} does not belong to inventory {inventory_id}"
            )),
            StoreError::VersionConflict => Self::VersionConflict,
            e @ (StoreError::Poisoned | StoreError::Sqlite(_)) => {
                Self::Internal(anyhow::Error::new(e))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            Self::VersionConflict => (StatusCode::CONFLICT, "version_conflict"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            Self::Internal(err) => {
                // Log the real failure, never leak it to the caller.
                error!("internal error: {err:#}");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "internal",
                        "message": "internal server error",
                    })),
                )
                    .into_response();
            }
        };

        (
            status,
            Json(json!({
                "error": code,
                "message": self.to_string(),
            })),
        )
            .into_response()
    }
}
