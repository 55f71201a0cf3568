//! Typed errors and HTTP mapping.

use crate::entity::EntityId;
use crate::response::json_with_status;
use crate::security::Permission;
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}

/// Failures reported by a [`crate::dao::Dao`]. Never retried by the layers above.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{entity} with id {id} does not exist")]
    NotFound { entity: &'static str, id: EntityId },
    #[error("{0} is transient (no id)")]
    Transient(&'static str),
    #[error("concurrent modification: {0}")]
    Conflict(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("{0} id sequence exhausted")]
    IdsExhausted(&'static str),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Classify a sqlx error: serialization failures, deadlocks and unique violations are conflicts.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if matches!(db.code().as_deref(), Some("40001") | Some("40P01") | Some("23505")) {
                return StoreError::Conflict(db.message().to_string());
            }
        }
        StoreError::Db(err)
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("access denied: {permission} on {entity}")]
    AccessDenied {
        entity: &'static str,
        permission: Permission,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("cannot merge patch: {0}")]
    Deserialize(#[source] serde_json::Error),
}

impl ServiceError {
    pub fn is_access_denied(&self) -> bool {
        matches!(self, ServiceError::AccessDenied { .. })
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Request the framework could not extract (body, query); keeps the extractor's status.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

fn rejection_code(status: StatusCode) -> &'static str {
    match status {
        StatusCode::PAYLOAD_TOO_LARGE => "payload_too_large",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "unsupported_media_type",
        _ => "bad_request",
    }
}

impl From<JsonRejection> for AppError {
    /// Payloads that parse but do not fit the entity are 400, like any other invalid payload.
    fn from(rejection: JsonRejection) -> Self {
        let status = match &rejection {
            JsonRejection::JsonDataError(_) => StatusCode::BAD_REQUEST,
            _ => rejection.status(),
        };
        AppError::Rejected {
            status,
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Rejected { status, .. } => (*status, rejection_code(*status)),
            AppError::Service(e) => match e {
                ServiceError::AccessDenied { .. } => (StatusCode::FORBIDDEN, "forbidden"),
                ServiceError::Deserialize(_) => (StatusCode::BAD_REQUEST, "bad_request"),
                ServiceError::Store(StoreError::NotFound { .. }) => (StatusCode::NOT_FOUND, "not_found"),
                ServiceError::Store(StoreError::Conflict(_)) => (StatusCode::CONFLICT, "conflict"),
                ServiceError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_error"),
            },
            AppError::Db(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: None,
            },
        };
        json_with_status(status, &body)
    }
}
