use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

use crate::types::EntityKind;

/// One source entity could not be mapped to its internal record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("{entity} is missing required field `{field}`")]
    MissingField {
        entity: EntityKind,
        field: &'static str,
    },

    #[error("{entity} field `{field}` out of range: {detail}")]
    OutOfRange {
        entity: EntityKind,
        field: &'static str,
        detail: String,
    },
}

impl ConversionError {
    pub fn missing(entity: EntityKind, field: &'static str) -> Self {
        Self::MissingField { entity, field }
    }

    pub fn out_of_range(entity: EntityKind, field: &'static str, detail: impl Into<String>) -> Self {
        Self::OutOfRange {
            entity,
            field,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("league {league_id} ({year}) not found or not accessible")]
    LeagueNotFound { league_id: i64, year: i32 },

    #[error("unexpected response: {0}")]
    Malformed(String),

    #[error("operation not supported by this source: {0}")]
    Unsupported(&'static str),
}

/// League-level failure: no snapshot is produced.
#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("failed to fetch league: {0}")]
    Fetch(#[from] SourceError),

    #[error("failed to convert league config: {0}")]
    LeagueConfig(#[from] ConversionError),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Outcome of a failed ETL run.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("aggregation failed: {0}")]
    Aggregation(#[from] AggregationError),

    #[error("snapshot write failed: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("ETL error: {0}")]
    Etl(#[from] EtlError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Database(e) => AppError::Database(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("request failed: {self}");
        }
        (status, Json(serde_json::json!({ "detail": self.to_string() }))).into_response()
    }
}
