use config::CredentialHeader;
use reqwest::{RequestBuilder, header::AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};

/// Credential attached to every administrative request.
#[derive(Debug, Clone)]
pub enum Credential {
    /// Pre-issued administrative key.
    Admin { header: CredentialHeader, key: SecretString },
    /// Opaque value handed out by the gateway on login.
    Session(SecretString),
}

impl Credential {
    pub fn admin(header: CredentialHeader, key: SecretString) -> Self {
        Self::Admin { header, key }
    }

    pub(crate) fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Self::Admin {
                header: CredentialHeader::Authorization,
                key,
            } => request.header(AUTHORIZATION, format!("Bearer {}", key.expose_secret())),
            Self::Admin {
                header: CredentialHeader::Custom(name),
                key,
            } => request.header(name.as_str(), key.expose_secret()),
            Self::Session(token) => request.header(AUTHORIZATION, format!("Bearer {}", token.expose_secret())),
        }
    }
}
