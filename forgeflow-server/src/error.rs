//! Mapping of forgeflow errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use forgeflow::errors::{ArtifactError, ComposerFault, PipelineError, ServiceError};
use serde::Serialize;
use serde_json::Value;

/// Error body: `{"success": false, "message": ..., "data"?: ...}`.
#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

/// An error returned by a route handler.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    data: Option<Value>,
}

impl ApiError {
    /// Creates an error without attached data.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            data: None,
        }
    }

    /// Creates a 400 error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Attaches data to the body.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Returns the status code.
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, message = %self.message, "Request failed");
        } else {
            tracing::debug!(status = %self.status, message = %self.message, "Request rejected");
        }
        let body = ErrorBody {
            success: false,
            message: self.message,
            data: self.data,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        let status = match &err {
            PipelineError::RequiredStage(_) => StatusCode::BAD_GATEWAY,
            PipelineError::TimedOut { .. } => StatusCode::GATEWAY_TIMEOUT,
            PipelineError::Cancelled { .. } => StatusCode::SERVICE_UNAVAILABLE,
            PipelineError::Composer(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Pipeline(err) => err.into(),
            ServiceError::Persist { result, source } => {
                let message = format!("generated code could not be saved: {source}");
                let err = Self::new(StatusCode::INTERNAL_SERVER_ERROR, message);
                match serde_json::to_value(*result) {
                    Ok(data) => err.with_data(data),
                    Err(_) => err,
                }
            }
        }
    }
}

impl From<ComposerFault> for ApiError {
    fn from(fault: ComposerFault) -> Self {
        Self::bad_request(fault.to_string())
    }
}

impl From<ArtifactError> for ApiError {
    fn from(err: ArtifactError) -> Self {
        let status = match &err {
            ArtifactError::NotFound { .. } => StatusCode::NOT_FOUND,
            ArtifactError::InvalidName { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgeflow::core::StageName;
    use forgeflow::errors::PipelineFailure;
    use std::time::Duration;

    #[test]
    fn test_pipeline_error_statuses() {
        let failure: ApiError = PipelineError::from(PipelineFailure::new(StageName::Plan, "down")).into();
        assert_eq!(failure.status(), StatusCode::BAD_GATEWAY);

        let timeout: ApiError = PipelineError::TimedOut {
            timeout: Duration::from_secs(1),
        }
        .into();
        assert_eq!(timeout.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_artifact_error_statuses() {
        assert_eq!(ApiError::from(ArtifactError::not_found("x")).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(ArtifactError::invalid_name("../x", "bad")).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
