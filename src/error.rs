use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Errors raised by the player store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reads are refused while a bulk reload is rebuilding the table.
    #[error("database is offline. Please try again later")]
    Unavailable,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// The store could not be reached at all, as opposed to rejecting one
    /// statement.
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            StoreError::Database(
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
            )
        )
    }
}

/// Errors that abandon a single reconciliation cycle.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("could not read {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug)]
pub enum ApiError {
    NotFound,
    InvalidParameter(String),
    Unavailable,
    DatabaseError(sqlx::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::NotFound => return StatusCode::NOT_FOUND.into_response(),
            ApiError::InvalidParameter(message) => (StatusCode::EXPECTATION_FAILED, message),
            ApiError::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                StoreError::Unavailable.to_string(),
            ),
            ApiError::DatabaseError(err) => {
                tracing::error!("Database error while serving request: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };

        let body = Json(ErrorResponse {
            error: error_message,
        });

        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable => ApiError::Unavailable,
            StoreError::Database(err) => ApiError::DatabaseError(err),
        }
    }
}
