use config::BaseUrl;
use hyper::ext::ReasonPhrase;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, de::DeserializeOwned};
use url::Url;

use crate::{
    credential::Credential,
    error::{GatewayError, GatewayResult},
    http_client::default_http_client_builder,
    types::{Budget, GenerateKeyRequest, GenerateKeyResponse, NewUserRequest, NewUserResponse, TeamCallback, UserList},
};

/// Page size used for user lookups.
const USER_PAGE_SIZE: &str = "25";

/// Client for the LiteLLM administrative endpoints.
///
/// Cloning is cheap and clones share the connection pool and the cookie jar.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: BaseUrl,
    credential: Option<Credential>,
}

impl GatewayClient {
    pub fn new(base_url: BaseUrl) -> GatewayResult<Self> {
        let client = default_http_client_builder()
            .build()
            .map_err(|err| GatewayError::ConnectionFailed {
                url: base_url.to_string(),
                message: err.to_string(),
            })?;

        Ok(Self {
            client,
            base_url,
            credential: None,
        })
    }

    /// Returns a client that sends `credential` with every request.
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// `POST /login` with form-encoded credentials.
    ///
    /// A success or redirect status counts as a successful login. The returned value is the
    /// session cookie the gateway set, which also stays in the client's cookie jar.
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
        session_cookie: &str,
    ) -> GatewayResult<SecretString> {
        let url = self.endpoint(&["login"])?;

        log::debug!("POST {url} as '{username}'");

        let response = self
            .client
            .post(url.clone())
            .form(&[("username", username), ("password", password.expose_secret())])
            .send()
            .await
            .map_err(|err| GatewayError::connection(&url, err))?;

        let status = response.status();

        if !status.is_success() && !status.is_redirection() {
            return Err(status_error(response).await);
        }

        let token = response
            .cookies()
            .find(|cookie| cookie.name() == session_cookie)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty());

        match token {
            Some(token) => Ok(SecretString::from(token)),
            None => Err(GatewayError::MissingSessionCookie(session_cookie.to_string())),
        }
    }

    /// `GET /user/get_users` filtered by user id. Returns the number of matching users.
    pub async fn count_users(&self, user_id: &str) -> GatewayResult<usize> {
        let mut url = self.endpoint(&["user", "get_users"])?;

        url.query_pairs_mut()
            .append_pair("user_ids", user_id)
            .append_pair("page", "1")
            .append_pair("page_size", USER_PAGE_SIZE);

        let list: UserList = self.get_json(url).await?;

        Ok(list.users.len())
    }

    /// `POST /user/new`. The gateway rejects duplicates; check [`GatewayClient::count_users`] first.
    pub async fn create_user(&self, request: &NewUserRequest) -> GatewayResult<NewUserResponse> {
        let url = self.endpoint(&["user", "new"])?;
        self.post_json(url, request).await
    }

    /// `GET /team/{id}/callback`.
    pub async fn team_callback(&self, team_id: &str) -> GatewayResult<TeamCallback> {
        let url = self.endpoint(&["team", team_id, "callback"])?;
        self.get_json(url).await
    }

    /// `GET /budget/list`.
    pub async fn list_budgets(&self) -> GatewayResult<Vec<Budget>> {
        let url = self.endpoint(&["budget", "list"])?;
        self.get_json(url).await
    }

    /// `POST /key/generate`.
    pub async fn generate_key(&self, request: &GenerateKeyRequest) -> GatewayResult<GenerateKeyResponse> {
        let url = self.endpoint(&["key", "generate"])?;
        self.post_json(url, request).await
    }

    fn endpoint(&self, segments: &[&str]) -> GatewayResult<Url> {
        let mut url =
            Url::parse(self.base_url.as_str()).map_err(|_| GatewayError::InvalidUrl(self.base_url.to_string()))?;

        url.path_segments_mut()
            .map_err(|_| GatewayError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> GatewayResult<T> {
        log::debug!("GET {url}");

        let mut request = self.client.get(url.clone());

        if let Some(credential) = &self.credential {
            request = credential.apply(request);
        }

        let response = request.send().await.map_err(|err| GatewayError::connection(&url, err))?;

        handle_response(&url, response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(&self, url: Url, body: &B) -> GatewayResult<T> {
        log::debug!("POST {url}");

        let mut request = self.client.post(url.clone()).json(body);

        if let Some(credential) = &self.credential {
            request = credential.apply(request);
        }

        let response = request.send().await.map_err(|err| GatewayError::connection(&url, err))?;

        handle_response(&url, response).await
    }
}

async fn handle_response<T: DeserializeOwned>(url: &Url, response: Response) -> GatewayResult<T> {
    if !response.status().is_success() {
        return Err(status_error(response).await);
    }

    let body = response.text().await.map_err(|err| GatewayError::parse(url, err))?;

    serde_json::from_str(&body).map_err(|err| GatewayError::parse(url, err))
}

async fn status_error(response: Response) -> GatewayError {
    let status = response.status();

    // hyper only records the phrase when it differs from the canonical one.
    let reason = response
        .extensions()
        .get::<ReasonPhrase>()
        .and_then(|phrase| std::str::from_utf8(phrase.as_bytes()).ok())
        .or_else(|| status.canonical_reason())
        .unwrap_or("Unknown Status")
        .to_string();

    let body = response.text().await.unwrap_or_default();

    log::debug!("LiteLLM answered {status}: {body}");

    GatewayError::Status {
        status: status.as_u16(),
        reason,
        body,
    }
}
