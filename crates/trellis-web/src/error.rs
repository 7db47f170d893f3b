//! Request-rejection errors and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

/// Failures that reject a request before the translation pipeline runs.
///
/// Pipeline failures (compile errors, store errors, multiplicity errors) are
/// not `WebError`s: they travel in the 200 response's `errors` list.
#[derive(Debug, Error)]
pub enum WebError {
    #[error("Content-Type must be application/json")]
    UnsupportedMediaType,

    #[error("Accept header must be one of [\"application/json\", \"application/graphql-response+json\"]")]
    NotAcceptable,

    #[error("Invalid request body JSON: {0}")]
    InvalidBody(String),

    #[error("The 'query' key in the request body JSON must be a string")]
    MissingQuery,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            WebError::NotAcceptable => StatusCode::METHOD_NOT_ALLOWED,
            WebError::InvalidBody(_) | WebError::MissingQuery => StatusCode::BAD_REQUEST,
            WebError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
