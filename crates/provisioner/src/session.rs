//! Resolves the gateway credential and the identity keys are attributed to.

use config::{AuthStrategy, LitellmConfig};
use gateway::{Credential, GatewayClient, GatewayError};
use secrecy::{ExposeSecret, SecretString};

use crate::{
    error::{ProvisionError, ProvisionResult},
    identity::{Identity, IdentityApi, IdentitySource, lookup_identity},
};

/// An authenticated gateway client, plus who it acts for.
#[derive(Debug, Clone)]
pub struct Session {
    client: GatewayClient,
    identity: Option<Identity>,
    strategy: AuthStrategy,
}

impl Session {
    pub fn client(&self) -> &GatewayClient {
        &self.client
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn strategy(&self) -> AuthStrategy {
        self.strategy
    }

    /// Whether the identity needs a user record created on the gateway.
    pub fn provisions_user(&self) -> bool {
        self.strategy == AuthStrategy::IdentityLookup && self.identity.is_some()
    }
}

pub async fn resolve_session(config: &LitellmConfig, identity_api: &dyn IdentityApi) -> ProvisionResult<Session> {
    let client = GatewayClient::new(config.base_url.clone())?;
    let strategy = config.auth.strategy;

    log::debug!("Resolving gateway session with the {strategy:?} strategy");

    let (client, identity) = match strategy {
        AuthStrategy::LoginSession => login(client, config).await?,
        AuthStrategy::AdminCredential => {
            let client = client.with_credential(admin_credential(config)?);
            let identity = config
                .user_id
                .as_deref()
                .map(str::trim)
                .filter(|user_id| !user_id.is_empty())
                .map(|user_id| Identity::new(user_id, IdentitySource::Configured));

            (client, identity)
        }
        AuthStrategy::IdentityLookup => {
            let client = client.with_credential(admin_credential(config)?);
            let identity = lookup_identity(identity_api, &config.identity).await?;

            (client, Some(identity))
        }
    };

    Ok(Session {
        client,
        identity,
        strategy,
    })
}

fn admin_credential(config: &LitellmConfig) -> ProvisionResult<Credential> {
    match &config.admin_key {
        Some(key) if !key.expose_secret().trim().is_empty() => {
            Ok(Credential::admin(config.credential_header.clone(), key.clone()))
        }
        _ => Err(ProvisionError::Auth("the LiteLLM admin key is not set".to_string())),
    }
}

async fn login(client: GatewayClient, config: &LitellmConfig) -> ProvisionResult<(GatewayClient, Option<Identity>)> {
    let auth = &config.auth;

    let username = auth
        .username
        .as_deref()
        .map(str::trim)
        .filter(|username| !username.is_empty())
        .ok_or_else(|| ProvisionError::Auth("username is required to log in".to_string()))?;

    let password: &SecretString = auth
        .password
        .as_ref()
        .filter(|password| !password.expose_secret().is_empty())
        .ok_or_else(|| ProvisionError::Auth("password is required to log in".to_string()))?;

    let token = match client.login(username, password, &auth.session_cookie).await {
        Ok(token) => token,
        Err(GatewayError::Status { status, reason, .. }) => {
            return Err(ProvisionError::Auth(format!("login rejected with {status} {reason}")));
        }
        Err(err @ GatewayError::MissingSessionCookie(_)) => return Err(ProvisionError::Auth(err.to_string())),
        Err(err) => return Err(err.into()),
    };

    log::info!("Logged in to LiteLLM as '{username}'");

    let client = client.with_credential(Credential::Session(token));

    Ok((client, Some(Identity::new(username, IdentitySource::Login))))
}
