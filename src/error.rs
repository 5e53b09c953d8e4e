use interview_api::InterviewApiError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InterviewError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Remote failure{}: {message}", status_suffix(.status))]
    RemoteFailure {
        status: Option<u16>,
        message: String,
    },

    #[error("Evaluation pending for session {0}")]
    NotYetEvaluated(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({})", s)).unwrap_or_default()
}

impl InterviewError {
    /// Whether re-issuing the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            InterviewError::RemoteFailure { .. } | InterviewError::NotYetEvaluated(_)
        )
    }
}

impl From<InterviewApiError> for InterviewError {
    fn from(err: InterviewApiError) -> Self {
        match err {
            InterviewApiError::NotFound(message) => InterviewError::SessionNotFound(message),
            InterviewApiError::ApiError { status, message } => InterviewError::RemoteFailure {
                status: Some(status),
                message,
            },
            other => InterviewError::RemoteFailure {
                status: other.status(),
                message: other.to_string(),
            },
        }
    }
}

// Front-ends receive errors as plain strings
impl Serialize for InterviewError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, InterviewError>;
