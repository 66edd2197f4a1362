//! Checks that the team, budget and user a key is scoped to exist on the gateway.

use config::{LitellmConfig, VerificationPolicy};
use gateway::{GatewayClient, GatewayResult, types::Budget, types::NewUserRequest};

use crate::{
    error::{ProvisionError, ProvisionResult},
    identity::Identity,
};

/// Outcome of a successful verification pass.
#[derive(Debug, Clone, Default)]
pub struct Verification {
    /// Budgets offered for selection when requesting a key.
    pub available_budgets: Vec<Budget>,
    /// Non-fatal problems the operator should know about.
    pub notices: Vec<String>,
}

pub struct Verifier<'a> {
    client: &'a GatewayClient,
    config: &'a LitellmConfig,
}

impl<'a> Verifier<'a> {
    pub fn new(client: &'a GatewayClient, config: &'a LitellmConfig) -> Self {
        Self { client, config }
    }

    /// Runs team, budget and user checks in that order, each gating the next.
    pub async fn run(&self, user: Option<&Identity>) -> ProvisionResult<Verification> {
        let policy = self.config.verification.policy;
        let mut verification = Verification::default();

        log::debug!("Verifying gateway entities with the {policy:?} policy");

        match policy {
            VerificationPolicy::Strict => {
                if let Some(team_id) = self.config.team_id.as_deref() {
                    self.verify_team(team_id).await?;
                }

                verification.available_budgets = match self.config.budget_id.as_deref() {
                    Some(budget_id) => self.verify_budget(budget_id).await?,
                    None => self.selectable_budgets().await,
                };
            }
            VerificationPolicy::Permissive => {
                if let Some(team_id) = self.config.team_id.as_deref()
                    && let Err(err) = self.verify_team(team_id).await
                {
                    log::warn!("{err}");
                    verification.notices.push(err.to_string());
                }

                verification.available_budgets = self.selectable_budgets().await;

                if let Some(budget_id) = self.config.budget_id.as_deref()
                    && !contains_budget(&verification.available_budgets, budget_id)
                {
                    let notice = format!("Budget '{budget_id}' is not in the budget list of the LiteLLM gateway");

                    log::warn!("{notice}");
                    verification.notices.push(notice);
                }
            }
            VerificationPolicy::None => (),
        }

        if let Some(user) = user {
            self.ensure_user(user, policy, &mut verification).await?;
        }

        Ok(verification)
    }

    /// `GET /team/{id}/callback` must report an explicit success.
    pub async fn verify_team(&self, team_id: &str) -> ProvisionResult<()> {
        match self.client.team_callback(team_id).await {
            Ok(callback) if callback.is_success() => {
                log::debug!("Team '{team_id}' verified");
                Ok(())
            }
            Ok(_) => Err(ProvisionError::Verification(format!(
                "Team '{team_id}' was not found on the LiteLLM gateway"
            ))),
            Err(err) => Err(ProvisionError::Verification(format!(
                "Team '{team_id}' could not be verified: {err}"
            ))),
        }
    }

    /// The budget must be part of `GET /budget/list`. Returns the whole list.
    pub async fn verify_budget(&self, budget_id: &str) -> ProvisionResult<Vec<Budget>> {
        let budgets = self.list_budgets().await.map_err(|err| {
            ProvisionError::Verification(format!("Budget '{budget_id}' could not be verified: {err}"))
        })?;

        if !contains_budget(&budgets, budget_id) {
            return Err(ProvisionError::Verification(format!(
                "Budget '{budget_id}' was not found on the LiteLLM gateway"
            )));
        }

        log::debug!("Budget '{budget_id}' verified");

        Ok(budgets)
    }

    pub async fn list_budgets(&self) -> GatewayResult<Vec<Budget>> {
        self.client.list_budgets().await
    }

    /// Best-effort budget list. A failure leaves nothing to select.
    async fn selectable_budgets(&self) -> Vec<Budget> {
        match self.list_budgets().await {
            Ok(budgets) => budgets,
            Err(err) => {
                log::warn!("Failed to list budgets, no budgets can be selected: {err}");
                Vec::new()
            }
        }
    }

    /// A failed lookup counts as "absent".
    pub async fn user_exists(&self, user_id: &str) -> bool {
        match self.client.count_users(user_id).await {
            Ok(count) => count > 0,
            Err(err) => {
                log::warn!("Failed to check whether user '{user_id}' exists: {err}");
                false
            }
        }
    }

    /// Not idempotent; callers check [`Verifier::user_exists`] first.
    pub async fn create_user(&self, user_id: &str) -> ProvisionResult<()> {
        let max_budget = self.config.max_budget_per_user.ok_or_else(|| {
            ProvisionError::Verification(format!("Cannot create user '{user_id}' without max_budget_per_user"))
        })?;

        let request = NewUserRequest {
            max_budget,
            user_id: user_id.to_string(),
            team_id: self.config.team_id.clone(),
        };

        let created = self
            .client
            .create_user(&request)
            .await
            .map_err(|err| ProvisionError::Verification(format!("Failed to create user '{user_id}' in LiteLLM: {err}")))?;

        let created_id = created.user_id.as_deref().unwrap_or(user_id);
        log::info!("Created LiteLLM user '{created_id}'");

        Ok(())
    }

    async fn ensure_user(
        &self,
        user: &Identity,
        policy: VerificationPolicy,
        verification: &mut Verification,
    ) -> ProvisionResult<()> {
        if self.user_exists(user.user_id()).await {
            log::debug!("LiteLLM user '{user}' already exists");
            return Ok(());
        }

        match self.create_user(user.user_id()).await {
            Ok(()) => Ok(()),
            Err(err) if policy == VerificationPolicy::Strict => Err(err),
            Err(err) => {
                log::warn!("{err}");
                verification.notices.push(err.to_string());
                Ok(())
            }
        }
    }
}

fn contains_budget(budgets: &[Budget], budget_id: &str) -> bool {
    budgets.iter().any(|budget| budget.budget_id == budget_id)
}
