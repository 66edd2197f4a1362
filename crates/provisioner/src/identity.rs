//! Operator identity as seen by the gateway.

use std::fmt;

use async_trait::async_trait;
use config::{IdentityConfig, IdentityFailurePolicy};

use crate::error::{ProvisionError, ProvisionResult};

/// Profile of the operator, as reported by the host's identity provider.
#[derive(Debug, Clone, Default)]
pub struct ProfileInfo {
    pub email: Option<String>,
}

/// Host collaborator that knows who is operating the provisioner.
#[async_trait]
pub trait IdentityApi: Send + Sync {
    async fn profile_info(&self) -> anyhow::Result<ProfileInfo>;
}

/// Where a resolved identity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    /// The username of an interactive login.
    Login,
    /// The `user_id` setting.
    Configured,
    /// The operator's email from the identity provider.
    IdentityProvider,
    /// The identity provider failed and the configured fallback is used.
    Fallback,
}

/// The user id keys and user records are attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    user_id: String,
    source: IdentitySource,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, source: IdentitySource) -> Self {
        Self {
            user_id: user_id.into(),
            source,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn source(&self) -> IdentitySource {
        self.source
    }

    pub fn is_fallback(&self) -> bool {
        self.source == IdentitySource::Fallback
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_id)
    }
}

/// Strips the directory annotation from federated addresses.
///
/// `jane.doe_external#EXT#@tenant.onmicrosoft.com` becomes `jane.doe_external`; addresses
/// without the marker are returned unchanged.
pub fn normalize_email<'a>(email: &'a str, federation_marker: &str) -> &'a str {
    let email = email.trim();

    match email.split_once(federation_marker) {
        Some((local, _)) => local,
        None => email,
    }
}

/// Looks up the operator email and applies the configured failure policy.
pub(crate) async fn lookup_identity(api: &dyn IdentityApi, config: &IdentityConfig) -> ProvisionResult<Identity> {
    let lookup = match api.profile_info().await {
        Ok(profile) => profile
            .email
            .as_deref()
            .map(|email| normalize_email(email, &config.federation_marker).to_string())
            .filter(|email| !email.is_empty())
            .ok_or_else(|| "User email not found".to_string()),
        Err(err) => Err(err.to_string()),
    };

    match lookup {
        Ok(email) => {
            log::debug!("Resolved operator identity '{email}'");
            Ok(Identity::new(email, IdentitySource::IdentityProvider))
        }
        Err(reason) => match config.on_failure {
            IdentityFailurePolicy::Fallback => {
                log::warn!(
                    "Could not resolve the operator email ({reason}), continuing as '{}'",
                    config.fallback_user
                );

                Ok(Identity::new(config.fallback_user.clone(), IdentitySource::Fallback))
            }
            IdentityFailurePolicy::Fail => Err(ProvisionError::Auth(format!(
                "could not resolve the operator email: {reason}"
            ))),
        },
    }
}
