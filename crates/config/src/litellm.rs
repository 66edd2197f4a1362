//! Connection and provisioning settings for the LiteLLM gateway.

use std::{borrow::Cow, fmt};

use http::header::{AUTHORIZATION, HeaderName};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use url::Url;

/// Settings under the `[litellm]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LitellmConfig {
    /// Root URL of the gateway, without a trailing slash.
    pub base_url: BaseUrl,
    /// Administrative key. Required by the `admin_credential` and `identity_lookup` strategies.
    #[serde(default)]
    pub admin_key: Option<SecretString>,
    /// Header the administrative key is sent in.
    #[serde(default)]
    pub credential_header: CredentialHeader,
    /// Team new users and keys are scoped to.
    #[serde(default)]
    pub team_id: Option<String>,
    /// Budget new keys are scoped to, unless another one is selected per key.
    #[serde(default)]
    pub budget_id: Option<String>,
    /// Spending cap given to users created by the provisioner.
    #[serde(default)]
    pub max_budget_per_user: Option<f64>,
    /// Refuse to request a key without a budget.
    #[serde(default)]
    pub budget_required: bool,
    /// Fixed user keys are attributed to with the `admin_credential` strategy.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Default model allowlist for new keys.
    #[serde(default)]
    pub models: Vec<String>,
    /// Default tags for new keys.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Model name used in the rendered usage samples.
    #[serde(default = "default_sample_model")]
    pub sample_model: String,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub verification: VerificationConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
}

fn default_sample_model() -> String {
    "gpt-3.5-turbo".to_string()
}

/// Validated gateway base URL.
#[derive(Clone, PartialEq, Eq)]
pub struct BaseUrl(String);

impl BaseUrl {
    pub fn new(url: &str) -> Result<Self, String> {
        let trimmed = url.trim();
        let parsed = Url::parse(trimmed).map_err(|err| format!("invalid base_url '{trimmed}': {err}"))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(format!(
                "invalid base_url '{trimmed}': scheme must be http or https, got '{}'",
                parsed.scheme()
            ));
        }

        Ok(Self(trimmed.trim_end_matches('/').to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BaseUrl").field(&self.0).finish()
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for BaseUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let url = Cow::<'de, str>::deserialize(deserializer)?;
        BaseUrl::new(url.as_ref()).map_err(serde::de::Error::custom)
    }
}

/// Where the administrative key goes on each request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CredentialHeader {
    /// `Authorization: Bearer <key>`.
    #[default]
    Authorization,
    /// The raw key in a custom header, e.g. `x-goog-api-key`.
    Custom(String),
}

impl<'de> Deserialize<'de> for CredentialHeader {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = Cow::<'de, str>::deserialize(deserializer)?;
        let name = name.trim();

        if name.is_empty() {
            return Err(serde::de::Error::custom("credential_header cannot be empty"));
        }

        let header = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| serde::de::Error::custom(format!("credential_header '{name}' is not a valid HTTP header name")))?;

        if header == AUTHORIZATION {
            Ok(Self::Authorization)
        } else {
            Ok(Self::Custom(header.as_str().to_string()))
        }
    }
}

/// How the provisioner authenticates against the gateway and who the keys belong to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStrategy {
    /// Exchange username and password for a session credential.
    LoginSession,
    /// Use the administrative key; keys belong to the optional `user_id`.
    AdminCredential,
    /// Use the administrative key; keys belong to the operator's email from the identity provider.
    #[default]
    IdentityLookup,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    pub strategy: AuthStrategy,
    /// Login name for the `login_session` strategy.
    pub username: Option<String>,
    /// Login password for the `login_session` strategy.
    pub password: Option<SecretString>,
    /// Cookie carrying the session credential after a login.
    pub session_cookie: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            strategy: AuthStrategy::default(),
            username: None,
            password: None,
            session_cookie: "token".to_string(),
        }
    }
}

/// How strictly prerequisite gateway entities are checked before keys can be issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationPolicy {
    /// A missing team or budget blocks key generation.
    #[default]
    Strict,
    /// Missing entities are logged; the budget list only feeds the selectable budgets.
    Permissive,
    /// No team or budget calls at all.
    None,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerificationConfig {
    pub policy: VerificationPolicy,
}

/// What happens when the operator's email cannot be resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityFailurePolicy {
    /// Continue as `fallback_user`.
    #[default]
    Fallback,
    /// Abort initialization.
    Fail,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdentityConfig {
    pub on_failure: IdentityFailurePolicy,
    pub fallback_user: String,
    /// Everything from this marker on is stripped from directory-federated addresses.
    pub federation_marker: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            on_failure: IdentityFailurePolicy::default(),
            fallback_user: "FALLBACK_USER_EMAIL".to_string(),
            federation_marker: "#EXT#".to_string(),
        }
    }
}
