//! Request and response bodies of the LiteLLM administrative API.

use serde::{Deserialize, Serialize, de::IgnoredAny};

/// Body of `POST /user/new`.
#[derive(Debug, Clone, Serialize)]
pub struct NewUserRequest {
    pub max_budget: f64,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
}

/// Response of `POST /user/new`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUserResponse {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Response of `GET /user/get_users`. Only the number of users matters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserList {
    #[serde(default)]
    pub users: Vec<IgnoredAny>,
}

/// Response of `GET /team/{id}/callback`.
#[derive(Debug, Clone, Deserialize)]
pub struct TeamCallback {
    #[serde(default)]
    pub status: Option<String>,
}

impl TeamCallback {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success")
    }
}

/// Element of the `GET /budget/list` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub budget_id: String,
    #[serde(default)]
    pub max_budget: Option<f64>,
    #[serde(default)]
    pub budget_duration: Option<String>,
}

/// Body of `POST /key/generate`. Empty optional parts are left out of the request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerateKeyRequest {
    pub key_alias: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Response of `POST /key/generate`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateKeyResponse {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub key_alias: Option<String>,
}
