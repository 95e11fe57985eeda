// Error types shared by the acquisition layers and the presentation
// functions. Only `ErrorMessage` ever reaches the user; the enums are
// converted into it at the `follows` boundary.

use std::fmt;
use thiserror::Error;

/// Failures raised while talking to the REST API.
#[derive(Debug, Error)]
pub enum FetchError {
    /// 403 from the API.
    #[error("403 Forbidden - You may be rate-limited or token doesn't have proper scope.")]
    Forbidden,

    /// 404 from the API.
    #[error("404 Not Found - The specified user or endpoint may not exist.")]
    NotFound,

    /// Any other non-2xx status.
    #[error("API request failed with status {status} ({reason})")]
    Request { status: u16, reason: String },

    /// Transport-level failure (DNS, TLS, connection reset...)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A page body that is not a JSON array.
    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Token contains characters that cannot be sent in a header")]
    InvalidToken(#[from] reqwest::header::InvalidHeaderValue),
}

/// Failures raised by the browser-scrape variant.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Failed to build browser config: {0}")]
    Config(String),

    #[error("Browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("Failed to start browser runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("Browser handler task failed: {0}")]
    Handler(#[from] tokio::task::JoinError),

    #[error("Invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },
}

/// Input rejected before any network call is made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Please provide a valid GitHub username.")]
    MissingAccount,

    #[error("Personal Access Token is required.\nVisit https://github.com/settings/tokens to create one.")]
    MissingToken,

    #[error("Please provide at least one username to unfollow.")]
    EmptyUnfollowList,
}

/// Display-safe failure description. Always rendered with an `Error: `
/// prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMessage(String);

impl ErrorMessage {
    pub fn from_error(err: &dyn std::error::Error) -> Self {
        ErrorMessage(err.to_string())
    }

    /// The description without the prefix.
    pub fn description(&self) -> &str {
        &self.0
    }
}

impl From<InputError> for ErrorMessage {
    fn from(err: InputError) -> Self {
        ErrorMessage::from_error(&err)
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error: {}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_is_prefixed() {
        let msg = ErrorMessage::from_error(&FetchError::NotFound);
        assert!(msg.to_string().starts_with("Error: 404 Not Found"));
        assert!(msg.description().starts_with("404"));
    }

    #[test]
    fn forbidden_mentions_rate_limit_and_scope() {
        let text = FetchError::Forbidden.to_string();
        assert!(text.contains("rate-limited"));
        assert!(text.contains("scope"));
    }

    #[test]
    fn request_error_carries_status() {
        let err = FetchError::Request { status: 500, reason: "Internal Server Error".into() };
        assert_eq!(err.to_string(), "API request failed with status 500 (Internal Server Error)");
    }
}
