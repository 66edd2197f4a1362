//! Key generation requests and their outcome.

use std::{
    fmt,
    sync::atomic::{AtomicBool, Ordering},
};

use config::LitellmConfig;
use gateway::{
    GatewayError,
    types::{GenerateKeyRequest, GenerateKeyResponse},
};
use secrecy::{ExposeSecret, SecretString};

use crate::{
    error::{KeyRequestError, ProvisionError, ProvisionResult},
    identity::Identity,
};

/// What the operator asks for. Empty budget, models and tags fall back to the configured defaults.
#[derive(Debug, Clone, Default)]
pub struct KeyOptions {
    pub alias: String,
    pub budget_id: Option<String>,
    pub models: Vec<String>,
    pub tags: Vec<String>,
}

impl KeyOptions {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            ..Self::default()
        }
    }

    pub fn budget(mut self, budget_id: impl Into<String>) -> Self {
        self.budget_id = Some(budget_id.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.models.push(model.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// A freshly issued key. It is shown once and never stored.
#[derive(Clone)]
pub struct GeneratedKey {
    key: SecretString,
    alias: String,
}

impl GeneratedKey {
    pub fn expose(&self) -> &str {
        self.key.expose_secret()
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }
}

impl fmt::Debug for GeneratedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedKey")
            .field("key", &"[REDACTED]")
            .field("alias", &self.alias)
            .finish()
    }
}

/// State of the key generation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitState {
    Idle,
    Submitting,
}

/// Allows one submission at a time. The flag is released when the guard drops,
/// whatever the outcome of the request.
pub(crate) struct SubmissionGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SubmissionGuard<'a> {
    pub(crate) fn acquire(flag: &'a AtomicBool) -> ProvisionResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self { flag })
            .map_err(|_| ProvisionError::Busy)
    }
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Builds the `/key/generate` body, refusing requests that cannot succeed.
pub(crate) fn build_request(
    options: &KeyOptions,
    config: &LitellmConfig,
    user: Option<&Identity>,
) -> ProvisionResult<GenerateKeyRequest> {
    let alias = options.alias.trim();

    if alias.is_empty() {
        return Err(ProvisionError::Validation("Please provide a key name.".to_string()));
    }

    let budget_id = options
        .budget_id
        .as_deref()
        .map(str::trim)
        .filter(|budget_id| !budget_id.is_empty())
        .map(str::to_string)
        .or_else(|| config.budget_id.clone());

    if config.budget_required && budget_id.is_none() {
        return Err(ProvisionError::Validation("Please select a budget for the key.".to_string()));
    }

    let models = if options.models.is_empty() {
        config.models.clone()
    } else {
        options.models.clone()
    };

    let tags = if options.tags.is_empty() {
        config.tags.clone()
    } else {
        options.tags.clone()
    };

    Ok(GenerateKeyRequest {
        key_alias: alias.to_string(),
        user_id: user.map(|user| user.user_id().to_string()),
        team_id: config.team_id.clone(),
        budget_id,
        models,
        tags,
    })
}

/// A success response must carry a non-empty key.
pub(crate) fn extract_key(response: GenerateKeyResponse, alias: &str) -> ProvisionResult<GeneratedKey> {
    match response.key.filter(|key| !key.trim().is_empty()) {
        Some(key) => Ok(GeneratedKey {
            key: SecretString::from(key),
            alias: response.key_alias.unwrap_or_else(|| alias.to_string()),
        }),
        None => Err(ProvisionError::ResponseShape("No key returned from API.".to_string())),
    }
}

/// Maps gateway failures of `/key/generate` to the operator-facing taxonomy.
pub(crate) fn classify(err: GatewayError) -> ProvisionError {
    match err {
        GatewayError::Status { status: 400, .. } => KeyRequestError::DuplicateAlias { status: 400 }.into(),
        GatewayError::Status { status: 500, .. } => KeyRequestError::PaidFeature { status: 500 }.into(),
        GatewayError::Status { status, reason, .. } => KeyRequestError::Http { status, reason }.into(),
        err @ GatewayError::ConnectionFailed { .. } => KeyRequestError::Connection(err.to_string()).into(),
        GatewayError::ParseError { message, .. } => {
            ProvisionError::ResponseShape(format!("Unexpected response from API: {message}"))
        }
        err => ProvisionError::Gateway(err),
    }
}
