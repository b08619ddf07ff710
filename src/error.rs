//! Error types for the PASS policy service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Result type alias for `pass-policy-service`.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level errors for the HTTP service, CLI, and configuration layers.
#[derive(Error, Debug)]
pub enum Error {
    /// A rules-DSL resolution, condition, expansion, external-collaborator,
    /// or document error surfaced from `policy-core`.
    #[error(transparent)]
    Policy(#[from] policy_core::PolicyError),

    /// A malformed or unreachable request from a client: missing
    /// `submission` parameter, wrong content type, or an un-rewritable URI.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Unsupported `Content-Type` on a POST request.
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Configuration could not be loaded or was invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem I/O failure (reading the rules document, for instance).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The live Fedora/PASS HTTP client failed.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON Schema validation failure for a rules document, reported
    /// outside the `policy-core` document-load path (e.g. the `validate`
    /// CLI command).
    #[error("schema error: {0}")]
    Schema(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Policy(_) | Self::Config(_) | Self::Io(_) | Self::Http(_) | Self::Schema(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
