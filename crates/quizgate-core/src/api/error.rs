use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Request timed out")]
    Timeout,

    #[error("Authentication failed. Please log in again.")]
    AuthExpired,

    #[error("{message}")]
    Remote { status: u16, message: String },

    #[error("Invalid response: {0}")]
    Malformed(String),

    #[error("Network error: {0}")]
    TransportFailure(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl RequestError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    /// Build a `Remote` error from a non-success status and its raw body.
    ///
    /// The message comes from the body's `msg` field, then `message`, and
    /// falls back to a generic text when neither is present.
    pub fn from_status(status: u16, body: &str) -> Self {
        RequestError::Remote {
            status,
            message: remote_message(body)
                .unwrap_or_else(|| format!("request failed with status {}", status)),
        }
    }

    pub fn is_auth_expired(&self) -> bool {
        matches!(self, RequestError::AuthExpired)
    }
}

/// Conventional message field of an error body, if any.
pub(crate) fn remote_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["msg", "message"]
        .iter()
        .find_map(|field| value.get(*field).and_then(Value::as_str).filter(|m| !m.is_empty()))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_uses_msg_field() {
        let err = RequestError::from_status(400, r#"{"msg": "Username already exists"}"#);
        assert_eq!(
            err,
            RequestError::Remote {
                status: 400,
                message: "Username already exists".to_string()
            }
        );
    }

    #[test]
    fn test_from_status_falls_back_to_message_field() {
        let err = RequestError::from_status(404, r#"{"message": "Quiz not found"}"#);
        assert_eq!(err.to_string(), "Quiz not found");
    }

    #[test]
    fn test_from_status_skips_empty_msg() {
        let err = RequestError::from_status(404, r#"{"msg": "", "message": "Quiz not found"}"#);
        assert_eq!(err.to_string(), "Quiz not found");
    }

    #[test]
    fn test_from_status_generic_message() {
        let err = RequestError::from_status(500, "<html>Internal Server Error</html>");
        assert_eq!(err.to_string(), "request failed with status 500");

        let err = RequestError::from_status(502, "");
        assert_eq!(err.to_string(), "request failed with status 502");
    }

    #[test]
    fn test_truncate_body() {
        assert_eq!(RequestError::truncate_body("short"), "short");
        let long = "x".repeat(600);
        let truncated = RequestError::truncate_body(&long);
        assert!(truncated.starts_with(&"x".repeat(500)));
        assert!(truncated.ends_with("(truncated, 600 total bytes)"));
    }
}
