//! `CoursekitError` -> HTTP response.
//!
//! Bodies are always JSON with a `message`; validation failures add `errors`.
//! Internal failures are logged here and answered with a generic message.

use crate::core::error::CoursekitError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

impl IntoResponse for CoursekitError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, body) = match self {
            CoursekitError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "message": errors.first_message().unwrap_or("The given data was invalid."),
                    "errors": errors,
                }),
            ),
            CoursekitError::NotFound(_) => (StatusCode::NOT_FOUND, json!({ "message": message })),
            CoursekitError::AlreadyExists(_) => (StatusCode::CONFLICT, json!({ "message": message })),
            // Normally concealed by the repositories already.
            CoursekitError::PathError(_) => (StatusCode::NOT_FOUND, json!({ "message": "Not found." })),
            CoursekitError::Unauthorized => (StatusCode::UNAUTHORIZED, json!({ "message": message })),
            _ => {
                error!(error = %message, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": "Server Error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
