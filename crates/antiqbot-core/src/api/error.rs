use reqwest::StatusCode;
use thiserror::Error;

/// Error raised by every API call.
///
/// The message is what the backend (or the transport) said, unchanged.
/// Callers that need to branch on the failure use [`RequestError::status`]
/// or [`RequestError::is_unauthorized`] rather than the message text.
#[derive(Error, Debug)]
pub enum RequestError {
    /// Non-2xx response from the backend.
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    /// No response was received.
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// 2xx response whose body could not be decoded.
    #[error("Invalid response: {message}")]
    InvalidResponse { status: StatusCode, message: String },

    /// The request could not be built.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Maximum length for error response bodies in log output
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl RequestError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Build the error for a non-2xx response.
    ///
    /// Uses the `message` field of a JSON body when there is one, otherwise
    /// falls back to a generic message naming the status code.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.get("message")
                    .and_then(|m| m.as_str())
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));

        RequestError::Status { status, message }
    }

    /// Human-readable message, without any variant prefix for backend errors.
    pub fn message(&self) -> String {
        match self {
            RequestError::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// HTTP status of the response, if one was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            RequestError::Status { status, .. } | RequestError::InvalidResponse { status, .. } => {
                Some(*status)
            }
            RequestError::Network(e) => e.status(),
            RequestError::InvalidRequest(_) => None,
        }
    }

    /// True when the backend rejected the credential.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, RequestError::Status { status, .. } if *status == StatusCode::UNAUTHORIZED)
    }
}
