use thiserror::Error;

use super::common::VtmError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error (HTTP {status}): {message}")]
    ApiError {
        status: u16,
        message: String,
        #[source]
        details: Option<Box<VtmError>>,
    },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Authentication failed")]
    AuthError,

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Service unavailable, retry later")]
    ServiceUnavailable,
}

impl ApiError {
    /// The remote answered 404: the object does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::ApiError { status: 404, .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::ApiError { status, .. } => Some(*status),
            ApiError::AuthError => Some(401),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_detected_by_status() {
        let err = ApiError::ApiError {
            status: 404,
            message: "not found".to_string(),
            details: None,
        };
        assert!(err.is_not_found());
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn other_statuses_are_not_not_found() {
        let err = ApiError::ApiError {
            status: 400,
            message: "bad".to_string(),
            details: None,
        };
        assert!(!err.is_not_found());
        assert!(!ApiError::ServiceUnavailable.is_not_found());
    }

    #[test]
    fn remote_detail_is_the_error_source() {
        use std::error::Error as _;

        let err = ApiError::ApiError {
            status: 400,
            message: "invalid".to_string(),
            details: Some(Box::new(VtmError {
                error_id: "resource.validation_error".to_string(),
                error_text: "The resource provided is invalid".to_string(),
                error_info: None,
            })),
        };
        let source = err.source().map(|s| s.to_string()).unwrap_or_default();
        assert!(source.contains("resource.validation_error"));
    }
}
