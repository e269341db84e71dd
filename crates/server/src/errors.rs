use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use service::errors::ServiceError;
use thiserror::Error;
use tracing::error;

/// Outcome marker carried by every envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Success,
    Failure,
    Error,
}

/// Uniform response body: `{status, message, data}` with `data: null` when absent.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub status: Status,
    pub message: &'static str,
    pub data: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    pub fn success(message: &'static str, data: T) -> Self {
        Self { status: Status::Success, message, data: Some(data) }
    }

    pub fn failure(message: &'static str, data: Option<T>) -> Self {
        Self { status: Status::Failure, message, data }
    }

    pub fn error(message: &'static str, data: Option<T>) -> Self {
        Self { status: Status::Error, message, data }
    }

    pub fn respond(self, code: StatusCode) -> Response {
        (code, Json(self)).into_response()
    }
}

/// Unstructured server fault: `500 {"error": msg}`. Not an envelope.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ApiError(pub String);

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::NotFound(_) => ApiError("Couldn't find Client".into()),
            other => ApiError(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let msg = self.0;
        error!(error = %msg, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({"error": msg}))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_serializes_status_and_null_data() {
        let v = serde_json::to_value(Envelope::<()>::failure("Couldn't find client", None)).unwrap();
        assert_eq!(v, serde_json::json!({"status": "FAILURE", "message": "Couldn't find client", "data": null}));

        let v = serde_json::to_value(Envelope::success("Loaded clients", vec![1, 2])).unwrap();
        assert_eq!(v["status"], "SUCCESS");
        assert_eq!(v["data"], serde_json::json!([1, 2]));

        let v = serde_json::to_value(Envelope::<u8>::error("Client not saved", None)).unwrap();
        assert_eq!(v["status"], "ERROR");
    }

    #[test]
    fn api_error_is_a_plain_500() {
        let resp = ApiError::from(ServiceError::not_found("client")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
