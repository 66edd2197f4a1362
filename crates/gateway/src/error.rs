use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors returned by the gateway client.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request never produced a response.
    #[error("Failed to connect to LiteLLM at {url}: {message}")]
    ConnectionFailed { url: String, message: String },

    /// The gateway answered with a non-success status.
    #[error("LiteLLM returned {status} {reason}")]
    Status { status: u16, reason: String, body: String },

    /// The response body did not have the expected shape.
    #[error("Failed to parse response from {url}: {message}")]
    ParseError { url: String, message: String },

    /// Endpoint URL could not be built from the base URL.
    #[error("Invalid endpoint URL '{0}'")]
    InvalidUrl(String),

    /// The login response set no session cookie.
    #[error("Login response did not set the '{0}' session cookie")]
    MissingSessionCookie(String),
}

impl GatewayError {
    pub(crate) fn connection(url: &url::Url, err: reqwest::Error) -> Self {
        Self::ConnectionFailed {
            url: url.to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn parse(url: &url::Url, message: impl ToString) -> Self {
        Self::ParseError {
            url: url.to_string(),
            message: message.to_string(),
        }
    }
}
