use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use polar_domain::ErrorKind;
use serde::Serialize;
use std::fmt;
use utoipa::ToSchema;

/// JSON body of every failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Human readable explanation, safe to show to the student.
    pub error: String,
    /// Machine readable classification.
    #[schema(value_type = String, example = "conflict")]
    pub kind: ErrorKind,
}

/// A classified failure on its way out of a handler.
///
/// Slices convert their own error enums into this with `From`, keeping the
/// `kind()` their `#[polar_error]` tags produce.
#[derive(Debug)]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        status_for(self.kind)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ApiError {}

const fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Malformed => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = %self.kind, error = %self.message, "Request failed");
        } else {
            tracing::debug!(kind = %self.kind, error = %self.message, "Request rejected");
        }

        (status, Json(ErrorBody { error: self.message, kind: self.kind })).into_response()
    }
}
