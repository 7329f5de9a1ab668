use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never produced a response: connection refused, DNS
    /// failure, or the 10-second timeout elapsed.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-success status that the pipeline
    /// did not recover from. A 401 here means the retry after a token
    /// refresh was rejected again.
    #[error("Server error {status}: {body}")]
    Server {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The refresh endpoint itself rejected the stored refresh token.
    /// The session is unrecoverable without a fresh login.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The server answered 2xx but the body did not parse as expected.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies carried in error values
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid dragging large payloads into logs
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..MAX_ERROR_BODY_LENGTH],
                body.len()
            )
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        ApiError::Server {
            status,
            body: Self::truncate_body(body),
        }
    }

    /// True when the server rejected the bearer token on this response.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            ApiError::Server { status, .. } if *status == reqwest::StatusCode::UNAUTHORIZED
        )
    }

    /// True when the session is beyond recovery and the user must log
    /// in again. Callers use this to decide whether to purge stored
    /// tokens.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::Auth(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_carries_status_and_body() {
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, "bad input");
        match err {
            ApiError::Server { status, body } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(body, "bad input");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_truncates_long_bodies() {
        let long = "x".repeat(2000);
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, &long);
        let text = err.to_string();
        assert!(text.contains("truncated, 2000 total bytes"));
        assert!(text.len() < 700);
    }

    #[test]
    fn test_unauthorized_detection() {
        assert!(ApiError::from_status(StatusCode::UNAUTHORIZED, "").is_unauthorized());
        assert!(!ApiError::from_status(StatusCode::FORBIDDEN, "").is_unauthorized());
        assert!(!ApiError::Auth("refresh rejected".to_string()).is_unauthorized());
    }

    #[test]
    fn test_auth_failure_detection() {
        assert!(ApiError::Auth("refresh rejected".to_string()).is_auth_failure());
        assert!(!ApiError::from_status(StatusCode::UNAUTHORIZED, "").is_auth_failure());
    }
}
