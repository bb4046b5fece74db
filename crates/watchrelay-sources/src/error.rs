use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{operation} failed: {status} - {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} authorization timed out after {waited_secs}s")]
    AuthorizationTimedOut {
        service: &'static str,
        waited_secs: u64,
    },

    #[error("{service} authorization failed: {reason}")]
    AuthorizationDenied {
        service: &'static str,
        reason: String,
    },

    #[error("Authorization prompt failed: {0}")]
    Prompt(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SourceError {
    /// HTTP status code, when the failure was a non-success response.
    pub fn status(&self) -> Option<u16> {
        match self {
            SourceError::Status { status, .. } => Some(*status),
            SourceError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub(crate) async fn from_response(operation: &'static str, response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        SourceError::Status {
            operation,
            status,
            body,
        }
    }
}
