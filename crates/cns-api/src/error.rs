//! Content navigation service — API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cns_core::error::{LoadError, NavigationError};
use serde::Serialize;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Tracing or span export could not be set up.
    #[error("telemetry error: {0}")]
    Telemetry(String),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer error that implements `IntoResponse`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The navigation engine rejected the request.
    #[error(transparent)]
    Navigation(#[from] NavigationError),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Navigation(NavigationError::NoActiveSession { .. }) => {
                (StatusCode::NOT_FOUND, "no_active_session")
            }
            Self::Navigation(NavigationError::NotStarted { .. }) => {
                (StatusCode::NOT_FOUND, "not_started")
            }
            Self::Navigation(NavigationError::EmptyStructure { .. }) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "empty_structure")
            }
            Self::Navigation(NavigationError::LoadTimeout { .. }) => {
                (StatusCode::GATEWAY_TIMEOUT, "load_timeout")
            }
            Self::Navigation(NavigationError::InvalidNodeRef(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "invalid_node_ref")
            }
            Self::Navigation(NavigationError::Load(load)) => match load {
                LoadError::MalformedIdentifier(_) => {
                    (StatusCode::BAD_REQUEST, "malformed_identifier")
                }
                LoadError::MissingDefinition(_) => (StatusCode::NOT_FOUND, "missing_definition"),
                LoadError::UnsupportedFormat(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "unsupported_format")
                }
                LoadError::Io(_) | LoadError::Parse(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "load_error")
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();

        let body = ErrorBody {
            error: error_code,
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
