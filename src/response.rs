//! JSON response helpers. Every body is sent as `application/json; charset=UTF-8`.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

pub const JSON_UTF8: &str = "application/json; charset=UTF-8";

/// Serialize `body` with the given status. Falls back to 500 if serialization fails.
pub fn json_with_status<T: Serialize + ?Sized>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => (
            status,
            [(header::CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8))],
            bytes,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize response body");
            let fallback = error_body("serialization_error", e.to_string(), None);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8))],
                fallback.to_string(),
            )
                .into_response()
        }
    }
}

pub fn success_ok<T: Serialize + ?Sized>(data: &T) -> Response {
    json_with_status(StatusCode::OK, data)
}

pub fn success_created<T: Serialize + ?Sized>(data: &T) -> Response {
    json_with_status(StatusCode::CREATED, data)
}

pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

pub fn error_body(code: &str, message: String, details: Option<serde_json::Value>) -> serde_json::Value {
    serde_json::json!({
        "error": {
            "code": code,
            "message": message,
            "details": details
        }
    })
}
