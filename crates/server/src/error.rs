//! Error type shared by every operation.
//!
//! Only the reason of the path that actually terminated an operation ever
//! reaches a caller; failures on the CLI path are logged and turned into a
//! fallback by the [`executor`](crate::executor).

use thiserror::Error;

/// Errors surfaced by operations, collaborators and configuration.
#[derive(Error, Debug)]
pub enum Error {
    /// The API answered with a non-success status.
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The request never produced a response.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body did not match the expected shape.
    #[error("unexpected response body: {0}")]
    Json(#[from] serde_json::Error),

    /// Parameters were rejected before any execution path ran.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No credential was configured or carried by the request.
    #[error("Missing API token in X-Val-Town-Token header or Authorization header")]
    MissingToken,

    /// The configured API base cannot be used to build request URLs.
    #[error("invalid API base URL: {0}")]
    BaseUrl(String),

    /// A `vt` invocation failed, or the CLI is unavailable.
    #[error("{0}")]
    Cli(String),

    /// Local filesystem error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// An operation panicked.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Error::InvalidInput(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn api_error_names_status_and_body() {
        let err = Error::Api {
            status: 404,
            body: "val not found".into(),
        };
        assert_eq!(err.to_string(), "API error (404): val not found");
    }
}
