//! Error types for the report server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use report_core::ReportError;
use serde::Serialize;
use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    /// Missing or invalid request fields, reported verbatim
    #[error("{0}")]
    InvalidRequest(String),

    /// A pipeline failure; `context` names what was being generated
    #[error("Error generating {context}: {source}")]
    Generation {
        context: &'static str,
        #[source]
        source: ReportError,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn generating(context: &'static str) -> impl FnOnce(ReportError) -> ServerError {
        move |source| ServerError::Generation { context, source }
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ServerError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ServerError::Generation { source, .. } if source.is_client_error() => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST")
            }
            ServerError::Generation { source, .. } => {
                let code = match source {
                    ReportError::TemplateLoad(_) => "TEMPLATE_LOAD_ERROR",
                    ReportError::DataBinding(_) => "DATA_BINDING_ERROR",
                    ReportError::ParameterApplication { .. } => "PARAMETER_ERROR",
                    _ => "EXPORT_ERROR",
                };
                (StatusCode::INTERNAL_SERVER_ERROR, code)
            }
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        // Client errors carry the bare message
        let message = match &self {
            ServerError::Generation { source, .. } if source.is_client_error() => {
                source.to_string()
            }
            other => other.to_string(),
        };
        if status.is_server_error() {
            tracing::error!(code, "{}", message);
        }

        let body = ErrorResponse {
            success: false,
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
