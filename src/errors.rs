use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::fmt;
use utoipa::ToSchema;

/// Application-specific error types.
#[derive(Debug)]
pub enum AppError {
    /// The model artifact is missing, corrupt or fails validation.
    ModelLoad(String),
    /// The feature record does not fit the loaded model's schema.
    Scoring(String),
    /// Bad request error (input outside the form's bounds).
    BadRequest(String),
    /// Internal server error.
    InternalError(String),
    /// Error wrapped with the operation that produced it.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

/// JSON body returned for every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl AppError {
    /// HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ModelLoad(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Scoring(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::WithContext { source, .. } => source.status(),
        }
    }

    /// Message safe to show to the user.
    ///
    /// Scoring and validation messages are shown as-is; internal failures are
    /// reduced to a generic message.
    pub fn public_message(&self) -> String {
        match self {
            AppError::ModelLoad(_) => "Model is not available".to_string(),
            AppError::Scoring(msg) => format!(
                "Prediction error: {}. Make sure all required columns are present in the input.",
                msg
            ),
            AppError::BadRequest(msg) => msg.clone(),
            AppError::InternalError(_) => "Internal server error".to_string(),
            AppError::WithContext { source, .. } => source.public_message(),
        }
    }

    /// Logs the error at a level matching its severity.
    pub fn log(&self) {
        match self {
            AppError::ModelLoad(msg) => tracing::error!("Model load error: {}", msg),
            AppError::Scoring(msg) => tracing::warn!("Scoring error: {}", msg),
            AppError::BadRequest(msg) => tracing::debug!("Rejected input: {}", msg),
            AppError::InternalError(msg) => tracing::error!("Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                tracing::error!("{} -> {}", context, source)
            }
        }
    }
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ModelLoad(msg) => write!(f, "Error loading model: {}", msg),
            AppError::Scoring(msg) => write!(f, "Scoring error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
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
    /// Maps each error variant to an appropriate HTTP status code and JSON body.
    fn into_response(self) -> Response {
        self.log();

        let body = Json(json!({
            "error": self.public_message(),
        }));

        (self.status(), body).into_response()
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
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
    fn test_status_mapping() {
        assert_eq!(
            AppError::Scoring("x".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::ModelLoad("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_context_delegates_to_source() {
        let result: Result<(), AppError> = Err(AppError::Scoring("columns are missing".into()));
        let err = result
            .with_context(|| "scoring request".to_string())
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            err.to_string(),
            "scoring request: Scoring error: columns are missing"
        );
        assert!(err.public_message().contains("columns are missing"));
    }

    #[test]
    fn test_internal_details_not_exposed() {
        let err = AppError::InternalError("serializer exploded".into());
        assert_eq!(err.public_message(), "Internal server error");
    }
}
