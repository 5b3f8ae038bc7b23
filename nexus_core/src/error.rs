// src/error.rs
use reqwest::StatusCode;

/// Errors raised by source connectors and the text-generation client.
///
/// None of these ever escape [`crate::aggregator::Aggregator::aggregate`]; they
/// are turned into empty result lists or fallback text at the edges.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serde JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Upstream returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Upstream response was empty")]
    EmptyResponse,

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl SourceError {
    pub fn code_str(&self) -> &'static str {
        match self {
            SourceError::Http(_) => "upstream_error",
            SourceError::Json(_) => "parse_error",
            SourceError::Status { .. } => "upstream_status",
            SourceError::Parse(_) => "parse_error",
            SourceError::InvalidInput(_) => "invalid_input",
            SourceError::MissingCredentials(_) => "auth_failed",
            SourceError::EmptyResponse => "empty_response",
            SourceError::Timeout(_) => "timeout",
            SourceError::Other(_) => "internal_error",
        }
    }

    /// HTTP status to surface for this error when it reaches a caller-facing
    /// boundary (the generation proxy is the only one).
    pub fn status_code(&self) -> StatusCode {
        match self {
            SourceError::Status { status, .. } => *status,
            SourceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            SourceError::EmptyResponse => StatusCode::BAD_GATEWAY,
            SourceError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_status() {
        let err = SourceError::Status {
            status: StatusCode::TOO_MANY_REQUESTS,
            message: "quota exceeded".into(),
        };
        assert_eq!(
            err.to_string(),
            "Upstream returned 429 Too Many Requests: quota exceeded"
        );
        assert_eq!(err.code_str(), "upstream_status");
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn invalid_input_maps_to_bad_request() {
        let err = SourceError::InvalidInput("Prompt is required.".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code_str(), "invalid_input");
    }

    #[test]
    fn empty_response_maps_to_bad_gateway() {
        assert_eq!(
            SourceError::EmptyResponse.status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SourceError>();
    }
}
