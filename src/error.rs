//! Error handler for renta.

use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use sqlx::Error as SQLxError;
use thiserror::Error;
use validator::ValidationErrors;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Enum representing server-side errors.
///
/// Validation and conflict failures are permanent; upstream failures carry
/// a `retryable` flag so callers can tell transient ones apart. Nothing is
/// retried automatically.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("validation error occurred")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Axum(#[from] JsonRejection),

    #[error("SQL request failed: {0}")]
    Sql(#[from] SQLxError),

    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("{0}")]
    Conflict(&'static str),

    #[error("invalid 'Authorization' header")]
    Unauthorized,

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("upstream service failed: {details}")]
    Upstream { details: String, retryable: bool },

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("mail queue error: {0}")]
    Queue(#[from] lapin::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("internal server error, {details}")]
    Internal {
        details: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ServerError {
    /// Permanent failure of an upstream collaborator: retrying the same
    /// request would fail again.
    pub fn upstream_permanent(details: impl Into<String>) -> Self {
        ServerError::Upstream {
            details: details.into(),
            retryable: false,
        }
    }

    /// Transient failure of an upstream collaborator.
    pub fn upstream_transient(details: impl Into<String>) -> Self {
        ServerError::Upstream {
            details: details.into(),
            retryable: true,
        }
    }
}

/// Structure for detailed error responses.
#[derive(Debug, Serialize)]
pub struct ResponseError {
    r#type: Option<String>,
    title: String,
    status: u16,
    detail: String,
    instance: Option<String>,
    errors: Option<Vec<FieldError>>,
}

impl ResponseError {
    /// Update error status code.
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code.as_u16();
        self
    }

    /// Update `title` field.
    pub fn title(mut self, title: &str) -> Self {
        self.title = title.into();
        self
    }

    /// Add detailed error.
    pub fn details(mut self, description: &str) -> Self {
        self.detail = description.into();
        self
    }

    /// Automatically add errors field.
    pub fn errors(mut self, errors: &ValidationErrors) -> Self {
        self.errors = Some(parse_validation_errors(errors));
        self
    }

    /// Transform [`ResponseError`] into axum [`Response`].
    pub fn into_response(self) -> std::result::Result<Response, axum::http::Error> {
        if let Ok(body) = serde_json::to_string(&self) {
            Response::builder()
                .status(self.status)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.into())
        } else {
            Ok(internal_server_error())
        }
    }
}

impl Default for ResponseError {
    fn default() -> Self {
        Self {
            r#type: None,
            title: "Internal server error.".to_owned(),
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            detail: String::default(),
            instance: None,
            errors: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct FieldError {
    field: String,
    message: String,
}

fn parse_validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, issues)| {
            issues.iter().map(move |issue| FieldError {
                field: field.to_string(),
                message: issue.to_string(),
            })
        })
        .collect()
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let response = ResponseError::default()
            .title("There were validation errors with your request.")
            .details(&self.to_string())
            .status(StatusCode::BAD_REQUEST);

        let response = match &self {
            ServerError::Validation(validation_errors) => response.errors(validation_errors),

            ServerError::NotFound { entity } => response
                .title("Resource not found.")
                .details(&format!("Unknown {entity}."))
                .status(StatusCode::NOT_FOUND),

            ServerError::Conflict(details) => response
                .title("Request conflicts with current state.")
                .details(details)
                .status(StatusCode::CONFLICT),

            ServerError::Unauthorized | ServerError::Token(_) => response
                .title("Missing or invalid 'Authorization' header.")
                .details("Log in to get access.")
                .status(StatusCode::UNAUTHORIZED),

            ServerError::Upstream { details, retryable } => {
                tracing::warn!(%details, retryable, "upstream service failed");

                response
                    .title("Upstream service failed.")
                    .details(if *retryable {
                        "Temporary upstream failure, try again later."
                    } else {
                        "Upstream service rejected the request."
                    })
                    .status(StatusCode::BAD_GATEWAY)
            },

            ServerError::Queue(err) => {
                tracing::warn!(error = %err, "mail queue unreachable");

                response
                    .title("Upstream service failed.")
                    .details("Temporary upstream failure, try again later.")
                    .status(StatusCode::BAD_GATEWAY)
            },

            ServerError::Sql(err) => {
                tracing::error!(error = %err, "sql request failed");

                ResponseError::default()
            },

            ServerError::Url(err) => {
                tracing::error!(error = %err, "invalid url");

                ResponseError::default()
            },

            ServerError::Json(err) => {
                tracing::error!(error = %err, "serialization failed");

                ResponseError::default()
            },

            ServerError::Internal { details, source } => {
                tracing::error!(err = ?source, %details, "server returned 500 status");

                ResponseError::default()
            },

            ServerError::Axum(_) => response,
        };

        response
            .into_response()
            .unwrap_or_else(|_| internal_server_error())
    }
}

fn internal_server_error() -> Response {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(
            serde_json::json!({
                "type": null,
                "title": "Internal server error.",
                "status": StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                "detail": null,
                "instance": null,
                "errors": null,
            })
            .to_string()
            .into(),
        )
        .unwrap_or_else(|_| Response::new("Internal server error".into()))
}
