//! Remote store error types.

/// Errors that can occur while talking to the remote document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The configured store does not exist (HTTP 404)
    NotFound,
    /// Any other non-success status. `message` is the response body, or
    /// `HTTP <status>` when the body was empty.
    Http { status: u16, message: String },
    /// Request could not be sent or the response could not be read
    Transport(String),
    /// Response body was not the expected JSON envelope
    Decode(String),
}

impl RemoteError {
    /// Builds an HTTP error from a status code and response body.
    pub fn http(status: u16, body: &str) -> Self {
        let body = body.trim();
        let message = if body.is_empty() {
            format!("HTTP {}", status)
        } else {
            body.to_string()
        };
        RemoteError::Http { status, message }
    }

    /// Returns true if the store itself is missing rather than unreachable.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound)
    }
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteError::NotFound => write!(f, "Store not found (404)"),
            RemoteError::Http { message, .. } => write!(f, "{}", message),
            RemoteError::Transport(e) => write!(f, "Connection error: {}", e),
            RemoteError::Decode(e) => write!(f, "Invalid response: {}", e),
        }
    }
}

impl std::error::Error for RemoteError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_uses_body() {
        let err = RemoteError::http(401, "Invalid X-Master-Key provided");
        assert_eq!(err.to_string(), "Invalid X-Master-Key provided");
    }

    #[test]
    fn test_http_error_falls_back_to_status() {
        let err = RemoteError::http(500, "  ");
        assert_eq!(err.to_string(), "HTTP 500");
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_not_found() {
        assert!(RemoteError::NotFound.is_not_found());
        assert!(RemoteError::NotFound.to_string().contains("404"));
    }
}
