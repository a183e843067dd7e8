use crate::api::ApiResponse;
use axum::{http::StatusCode, response::Json};
use tracing::{error, info, warn};

/// Failures from the remote completion service boundary.
///
/// None of these are retried automatically; a single failed call surfaces
/// directly to the caller.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The completion service returned a non-success status. Carries the
    /// provider-supplied message when one is available.
    #[error("completion service error: {0}")]
    RemoteService(String),

    /// Success status but the body is not valid JSON, or valid JSON
    /// lacking a cards-shaped array.
    #[error("malformed completion response: {0}")]
    MalformedResponse(String),

    /// Well-formed response containing zero cards.
    #[error("completion returned no cards")]
    EmptyResult,
}

/// Failures from the document-text extraction collaborator.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("not a valid PDF document")]
    InvalidFormat,

    #[error("document is password protected")]
    PasswordProtected,

    #[error("failed to parse document: {0}")]
    ParseFailure(String),

    /// The document parsed but yielded no usable text.
    #[error("no extractable text in document")]
    EmptyText,
}

/// Failures from the image capture collaborator.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("camera permission denied")]
    PermissionDenied,
}

/// Centralized error types for consistent API error handling
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Error context for structured logging
#[derive(Debug)]
pub struct ErrorContext {
    pub operation: String,
    pub resource_id: Option<String>,
    pub resource_type: String,
}

impl ErrorContext {
    pub fn new(operation: &str, resource_type: &str) -> Self {
        Self {
            operation: operation.to_string(),
            resource_id: None,
            resource_type: resource_type.to_string(),
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.resource_id = Some(id.to_string());
        self
    }
}

impl ApiError {
    /// Convert API error to HTTP response with consistent structure and logging
    pub fn to_response_with_context(
        self,
        context: ErrorContext,
    ) -> (StatusCode, Json<ApiResponse<()>>) {
        match &self {
            ApiError::NotFound(_) => {
                info!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Resource not found"
                );
                (
                    StatusCode::NOT_FOUND,
                    Json(ApiResponse::error(self.to_string())),
                )
            }
            ApiError::ValidationError(_) => {
                warn!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Validation error"
                );
                (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::error(self.to_string())),
                )
            }
            ApiError::Conflict(_) => {
                warn!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Conflicting request"
                );
                (
                    StatusCode::CONFLICT,
                    Json(ApiResponse::error(self.to_string())),
                )
            }
            ApiError::Generation(source) => {
                error!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Generation service error"
                );
                let status = match source {
                    GenerationError::EmptyResult => StatusCode::UNPROCESSABLE_ENTITY,
                    GenerationError::RemoteService(_) | GenerationError::MalformedResponse(_) => {
                        StatusCode::BAD_GATEWAY
                    }
                };
                (status, Json(ApiResponse::error(self.to_string())))
            }
            ApiError::Extraction(_) => {
                warn!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Document extraction error"
                );
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(ApiResponse::error(self.to_string())),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context_creation() {
        let context = ErrorContext::new("create_deck", "deck").with_id("123");

        assert_eq!(context.operation, "create_deck");
        assert_eq!(context.resource_type, "deck");
        assert_eq!(context.resource_id, Some("123".to_string()));
    }

    #[test]
    fn test_api_error_status_mapping() {
        let context = ErrorContext::new("get_deck", "deck").with_id("123");
        let (status, _) = ApiError::NotFound("Deck not found".to_string())
            .to_response_with_context(context);
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = ApiError::ValidationError("empty input".to_string())
            .to_response_with_context(ErrorContext::new("generate", "deck"));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = ApiError::Conflict("generation already in flight".to_string())
            .to_response_with_context(ErrorContext::new("request_more", "session"));
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[test]
    fn test_generation_error_status_mapping() {
        let (status, _) = ApiError::Generation(GenerationError::RemoteService("401".into()))
            .to_response_with_context(ErrorContext::new("generate", "deck"));
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (status, _) = ApiError::Generation(GenerationError::EmptyResult)
            .to_response_with_context(ErrorContext::new("generate", "deck"));
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_capture_error_message() {
        assert_eq!(
            CaptureError::PermissionDenied.to_string(),
            "camera permission denied"
        );
    }

    #[test]
    fn test_extraction_error_variants_are_distinct() {
        assert_ne!(
            ExtractionError::PasswordProtected,
            ExtractionError::ParseFailure("x".to_string())
        );
        assert_ne!(ExtractionError::InvalidFormat, ExtractionError::EmptyText);
    }
}
