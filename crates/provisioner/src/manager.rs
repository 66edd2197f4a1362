use std::sync::atomic::{AtomicBool, Ordering};

use config::{BaseUrl, LitellmConfig};
use gateway::types::Budget;

use crate::{
    error::ProvisionResult,
    identity::{Identity, IdentityApi},
    keys::{self, GeneratedKey, KeyOptions, SubmissionGuard, SubmitState},
    samples::{self, Sample},
    session::{Session, resolve_session},
    verify::Verifier,
};

/// Issues API keys for one operator.
///
/// A manager only exists once the session has been resolved and the gateway entities have
/// been verified, so every key it hands out is attributed to a checked identity.
#[derive(Debug)]
pub struct KeyManager {
    config: LitellmConfig,
    session: Session,
    available_budgets: Vec<Budget>,
    notices: Vec<String>,
    submitting: AtomicBool,
}

impl KeyManager {
    pub async fn initialize(config: LitellmConfig, identity_api: &dyn IdentityApi) -> ProvisionResult<Self> {
        log::info!("Initializing LiteLLM key manager for {}", config.base_url);

        let session = resolve_session(&config, identity_api).await?;
        let user = session.identity().filter(|_| session.provisions_user());

        let verification = Verifier::new(session.client(), &config).run(user).await?;

        match session.identity() {
            Some(identity) => log::info!("LiteLLM key manager ready for '{identity}'"),
            None => log::info!("LiteLLM key manager ready"),
        }

        Ok(Self {
            config,
            session,
            available_budgets: verification.available_budgets,
            notices: verification.notices,
            submitting: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &LitellmConfig {
        &self.config
    }

    pub fn base_url(&self) -> &BaseUrl {
        &self.config.base_url
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.session.identity()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn available_budgets(&self) -> &[Budget] {
        &self.available_budgets
    }

    /// Non-fatal problems found during initialization.
    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    pub fn submit_state(&self) -> SubmitState {
        if self.submitting.load(Ordering::Acquire) {
            SubmitState::Submitting
        } else {
            SubmitState::Idle
        }
    }

    /// Requests a new key. Invalid options are rejected before anything is sent, and a
    /// second call while one is in flight fails with [`crate::ProvisionError::Busy`].
    pub async fn generate_key(&self, options: KeyOptions) -> ProvisionResult<GeneratedKey> {
        let request = keys::build_request(&options, &self.config, self.session.identity())?;
        let _guard = SubmissionGuard::acquire(&self.submitting)?;

        log::debug!("Requesting key '{}'", request.key_alias);

        let response = self
            .session
            .client()
            .generate_key(&request)
            .await
            .map_err(keys::classify)?;

        let key = keys::extract_key(response, &request.key_alias)?;

        log::info!("Generated key '{}'", key.alias());

        Ok(key)
    }

    /// Usage samples for `key`, or with a placeholder before a key exists.
    pub fn samples(&self, key: Option<&GeneratedKey>) -> Vec<Sample> {
        samples::render_all(
            key.map(GeneratedKey::expose),
            self.config.base_url.as_str(),
            &self.config.sample_model,
        )
    }
}
