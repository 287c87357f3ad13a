//! Mapping of domain errors onto HTTP responses.
//!
//! Every error body has the shape `{"error": "<message>"}`. Server-side
//! failures hide their detail behind a generic message; the detail travels in a
//! response extension and [`attach_details`] copies it into the body outside
//! production.

use super::AppState;
use crate::errors::Error;
use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

/// Internal error detail withheld from the default body
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

impl Error {
    /// HTTP status code for this error
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput { .. }
            | Self::InvalidTransition { .. }
            | Self::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::InternalInvariantViolation { .. }
            | Self::Credential { .. }
            | Self::Config { .. }
            | Self::Database(_)
            | Self::Io(_)
            | Self::Toml(_)
            | Self::IntConversion(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {self}");
            let mut response =
                (status, Json(json!({ "error": "Internal server error" }))).into_response();
            response.extensions_mut().insert(ErrorDetail(self.to_string()));
            return response;
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::invalid_input(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Self::invalid_input(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Self::invalid_input(rejection.body_text())
    }
}

/// JSON body extractor reporting malformed bodies as `{"error": ...}`
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct ApiJson<T>(pub T);

/// Query string extractor reporting malformed queries as `{"error": ...}`
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct ApiQuery<T>(pub T);

/// Path parameter extractor reporting malformed segments as `{"error": ...}`
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct ApiPath<T>(pub T);

/// Re-renders server errors with their detail when the environment allows it.
pub async fn attach_details(State(state): State<AppState>, response: Response) -> Response {
    if !state.settings.environment.exposes_error_details() {
        return response;
    }
    match response.extensions().get::<ErrorDetail>().cloned() {
        Some(ErrorDetail(detail)) => (
            response.status(),
            Json(json!({ "error": "Internal server error", "details": detail })),
        )
            .into_response(),
        None => response,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            Error::invalid_input("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::not_found("Order", 1).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::InvalidTransition {
                message: "locked".into()
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(Error::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            Error::InternalInvariantViolation {
                message: "x".into()
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_server_errors_carry_detail_extension() {
        let response = Error::InternalInvariantViolation {
            message: "no initial status".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let detail = response.extensions().get::<ErrorDetail>().unwrap();
        assert!(detail.0.contains("no initial status"));

        let response = Error::invalid_input("bad").into_response();
        assert!(response.extensions().get::<ErrorDetail>().is_none());
    }
}
