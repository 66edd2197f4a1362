use gateway::GatewayError;
use thiserror::Error;

pub type ProvisionResult<T> = Result<T, ProvisionError>;

/// Everything that can go wrong while resolving the session, verifying entities or generating a key.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Required user input is missing. Never reaches the network.
    #[error("{0}")]
    Validation(String),

    /// The gateway credential is missing or was rejected.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A prerequisite team, budget or user is missing on the gateway.
    #[error("{0}")]
    Verification(String),

    /// The key generation request was answered with a failure.
    #[error(transparent)]
    Request(#[from] KeyRequestError),

    /// The gateway answered with success but without the expected content.
    #[error("{0}")]
    ResponseShape(String),

    /// Another key generation is still in flight.
    #[error("A key is already being generated. Wait for it to finish before submitting again.")]
    Busy,

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl ProvisionError {
    /// Message suitable for showing to the operator.
    pub fn user_message(&self) -> String {
        match self {
            Self::Request(err) => format!("Error generating key: {err}"),
            _ => self.to_string(),
        }
    }
}

/// Failed `POST /key/generate`, classified by status code.
#[derive(Debug, Error)]
pub enum KeyRequestError {
    #[error(
        "Failed to generate key: {status} Bad Request - This might be due to a duplicate key name. Please try a different name."
    )]
    DuplicateAlias { status: u16 },

    #[error(
        "Failed to generate key: {status} Internal Server Error - Tags and budgets on keys may be a paid feature of this gateway. Try again without tags or a budget."
    )]
    PaidFeature { status: u16 },

    #[error("Failed to generate key: {status} {reason}")]
    Http { status: u16, reason: String },

    #[error("Failed to generate key: {0}")]
    Connection(String),
}
