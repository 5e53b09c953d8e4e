//! Error types for the interview platform client.

use thiserror::Error;

/// Errors that can occur when talking to the interview platform API.
#[derive(Debug, Error)]
pub enum InterviewApiError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API returned a non-success response
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// The requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

impl InterviewApiError {
    /// HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            InterviewApiError::ApiError { status, .. } => Some(*status),
            InterviewApiError::HttpError(err) => err.status().map(|s| s.as_u16()),
            InterviewApiError::NotFound(_) => Some(404),
            InterviewApiError::ParseError(_) | InterviewApiError::ConfigError(_) => None,
        }
    }
}

impl From<serde_json::Error> for InterviewApiError {
    fn from(err: serde_json::Error) -> Self {
        InterviewApiError::ParseError(err.to_string())
    }
}

impl From<url::ParseError> for InterviewApiError {
    fn from(err: url::ParseError) -> Self {
        InterviewApiError::ConfigError(err.to_string())
    }
}
