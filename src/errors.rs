use crate::models::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::fmt;

/// Application-specific error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Bad request error (invalid input).
    BadRequest(String),
    /// The registry that owns the identification has no record for it.
    NotFound(String),
    /// A registry answered, but reported a failure.
    BackendReported {
        /// HTTP status to surface to the caller.
        status: u16,
        /// The registry's own domain code, when it sent one.
        code: Option<i64>,
        /// The registry's own message.
        message: String,
    },
    /// The registry could not be reached or did not answer in time.
    Transport {
        /// HTTP status to surface to the caller.
        status: u16,
        message: String,
    },
    /// Internal server error.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl AppError {
    /// HTTP status this error is surfaced with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BackendReported { status, .. } | AppError::Transport { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::WithContext { source, .. } => source.status_code(),
        }
    }

    /// Message placed in the `error` field of the response body.
    ///
    /// Registry messages are passed through verbatim; internal details are not.
    pub fn public_message(&self) -> String {
        match self {
            AppError::BadRequest(msg) | AppError::NotFound(msg) => msg.clone(),
            AppError::BackendReported { message, .. } | AppError::Transport { message, .. } => {
                message.clone()
            }
            AppError::InternalError(_) => "Internal server error".to_string(),
            AppError::WithContext { source, .. } => source.public_message(),
        }
    }

    /// Strips context wrappers.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BackendReported {
                status,
                code,
                message,
            } => match code {
                Some(code) => write!(
                    f,
                    "Backend error (status {}, code {}): {}",
                    status, code, message
                ),
                None => write!(f, "Backend error (status {}): {}", status, message),
            },
            AppError::Transport { status, message } => {
                write!(f, "Transport error (status {}): {}", status, message)
            }
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// The body is the canonical record with every field blank plus
    /// `error`/`errorCode`, and the HTTP status always equals `errorCode`.
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self.root() {
            AppError::BadRequest(msg) | AppError::NotFound(msg) => {
                tracing::warn!("Request rejected ({}): {}", status, msg);
            }
            _ => {
                tracing::error!("Request failed ({}): {}", status, self);
            }
        }

        let body = ErrorResponse::new(self.public_message(), status.as_u16());
        (status, Json(body)).into_response()
    }
}

impl From<serde_json::Error> for AppError {
    /// Converts a `serde_json::Error` into an `AppError`.
    fn from(err: serde_json::Error) -> Self {
        AppError::InternalError(format!("JSON error: {}", err))
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    ///
    /// # Arguments
    ///
    /// * `context` - The context message to add.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    ///
    /// # Arguments
    ///
    /// * `f` - A closure that produces the context message.
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Transport {
                status: 502,
                message: "x".into()
            }
            .status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::BackendReported {
                status: 1,
                code: None,
                message: "x".into()
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_context_delegates_status_and_message() {
        let err: Result<(), AppError> = Err(AppError::BackendReported {
            status: 503,
            code: Some(17),
            message: "Registry under maintenance".into(),
        });
        let err = err.context("master registry lookup").unwrap_err();

        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.public_message(), "Registry under maintenance");
        assert!(err.to_string().starts_with("master registry lookup: "));
    }

    #[test]
    fn test_internal_error_message_is_generic() {
        let err = AppError::InternalError("stack details".into());
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[tokio::test]
    async fn test_into_response_status_matches_error_code() {
        let response = AppError::NotFound("Client not found".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["errorCode"], 404);
        assert_eq!(body["error"], "Client not found");
        assert_eq!(body["cancellationDate"], "0001-01-01T00:00:00");
    }
}
