use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use utoipa::ToSchema;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Missing or incorrect `x-api-key`
    #[error("Not authenticated")]
    Unauthenticated,

    /// Missing or malformed required field
    #[error("{message}")]
    BadRequest { message: String },

    /// Uploaded file extension outside the allowed set
    #[error("unsupported file type: {extension:?}")]
    UnsupportedFileType { extension: Option<String> },

    /// Request body exceeded the configured upload limit
    #[error("file too large")]
    PayloadTooLarge,

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// JSON envelope for every error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl Error {
    /// Shorthand for the "missing required field" condition.
    pub fn missing_field(name: &str) -> Self {
        Error::BadRequest {
            message: format!("{name} required"),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            Error::BadRequest { .. } | Error::UnsupportedFileType { .. } => StatusCode::BAD_REQUEST,
            Error::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Internal { .. } | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated => "unauthorized".to_string(),
            Error::BadRequest { message } => message.clone(),
            Error::UnsupportedFileType { .. } => "unsupported file type".to_string(),
            Error::PayloadTooLarge => "file too large".to_string(),
            Error::Internal { .. } | Error::Other(_) => "internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Unauthenticated => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::BadRequest { .. } | Error::UnsupportedFileType { .. } | Error::PayloadTooLarge => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let body = ErrorBody {
            error: self.user_message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(Error::missing_field("file_url").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::UnsupportedFileType {
                extension: Some("exe".to_string())
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(Error::PayloadTooLarge.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            Error::Other(anyhow::anyhow!("disk on fire")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_user_messages_do_not_leak_internals() {
        assert_eq!(Error::Unauthenticated.user_message(), "unauthorized");
        assert_eq!(Error::missing_field("text").user_message(), "text required");
        assert_eq!(
            Error::Internal {
                operation: "write /secret/path".to_string()
            }
            .user_message(),
            "internal server error"
        );
    }

    #[tokio::test]
    async fn test_into_response_is_json_envelope() {
        let response = Error::Unauthenticated.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "unauthorized");
    }
}
