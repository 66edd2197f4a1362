//! A LiteLLM gateway stand-in that records every request it receives.

use std::{
    collections::{HashMap, HashSet},
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// One request as the gateway saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }

    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let query = self.query.as_deref().unwrap_or_default();

        url::form_urlencoded::parse(query.as_bytes())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }

    fn form_value(&self, name: &str) -> Option<String> {
        url::form_urlencoded::parse(self.body.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

/// How `POST /key/generate` answers.
#[derive(Debug, Clone)]
pub enum KeyBehavior {
    Issue(String),
    Status(StatusCode),
    WithoutKey,
}

#[derive(Debug, Clone)]
struct Login {
    username: String,
    password: String,
    cookie: Option<(String, String)>,
}

#[derive(Debug, Clone)]
struct Behavior {
    credential: Option<(String, String)>,
    login: Option<Login>,
    /// Team id to the `status` its callback reports.
    teams: HashMap<String, &'static str>,
    budgets: Vec<Value>,
    budget_list_status: Option<StatusCode>,
    user_creation_status: Option<StatusCode>,
    key: KeyBehavior,
    key_delay: Option<Duration>,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            credential: None,
            login: None,
            teams: HashMap::new(),
            budgets: Vec::new(),
            budget_list_status: None,
            user_creation_status: None,
            key: KeyBehavior::Issue("sk-test123".to_string()),
            key_delay: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct MockGatewayBuilder {
    behavior: Behavior,
    users: HashSet<String>,
}

impl MockGatewayBuilder {
    /// Requires `Authorization: Bearer <key>` on every administrative call.
    pub fn admin_key(mut self, key: &str) -> Self {
        self.behavior.credential = Some(("authorization".to_string(), format!("Bearer {key}")));
        self
    }

    /// Requires the raw key in a custom header on every administrative call.
    pub fn credential_header(mut self, name: &str, key: &str) -> Self {
        self.behavior.credential = Some((name.to_ascii_lowercase(), key.to_string()));
        self
    }

    /// Accepts a form login and answers with a redirect that sets the session cookie.
    pub fn login(mut self, username: &str, password: &str, cookie_name: &str, cookie_value: &str) -> Self {
        self.behavior.login = Some(Login {
            username: username.to_string(),
            password: password.to_string(),
            cookie: Some((cookie_name.to_string(), cookie_value.to_string())),
        });
        self
    }

    /// Accepts a form login but never sets a session cookie.
    pub fn login_without_cookie(mut self, username: &str, password: &str) -> Self {
        self.behavior.login = Some(Login {
            username: username.to_string(),
            password: password.to_string(),
            cookie: None,
        });
        self
    }

    pub fn team(mut self, team_id: &str) -> Self {
        self.behavior.teams.insert(team_id.to_string(), "success");
        self
    }

    /// A team whose callback answers `200 OK` with an error status in the body.
    pub fn team_with_error_callback(mut self, team_id: &str) -> Self {
        self.behavior.teams.insert(team_id.to_string(), "error");
        self
    }

    pub fn budget(mut self, budget_id: &str, max_budget: f64) -> Self {
        self.behavior.budgets.push(json!({
            "budget_id": budget_id,
            "max_budget": max_budget,
            "budget_duration": "30d",
        }));
        self
    }

    pub fn budget_list_status(mut self, status: StatusCode) -> Self {
        self.behavior.budget_list_status = Some(status);
        self
    }

    pub fn user(mut self, user_id: &str) -> Self {
        self.users.insert(user_id.to_string());
        self
    }

    pub fn user_creation_status(mut self, status: StatusCode) -> Self {
        self.behavior.user_creation_status = Some(status);
        self
    }

    pub fn key_response(mut self, key: KeyBehavior) -> Self {
        self.behavior.key = key;
        self
    }

    /// Holds key generation responses back, to observe an in-flight submission.
    pub fn key_delay(mut self, delay: Duration) -> Self {
        self.behavior.key_delay = Some(delay);
        self
    }

    pub async fn start(self) -> MockGateway {
        let state = Arc::new(GatewayState {
            behavior: self.behavior,
            users: Mutex::new(self.users),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        let shutdown = CancellationToken::new();
        let signal = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(signal.cancelled_owned())
                .await
                .unwrap();
        });

        MockGateway {
            address,
            state,
            shutdown,
        }
    }
}

/// Running mock gateway. Stops when dropped.
pub struct MockGateway {
    address: SocketAddr,
    state: Arc<GatewayState>,
    shutdown: CancellationToken,
}

impl MockGateway {
    pub fn builder() -> MockGatewayBuilder {
        MockGatewayBuilder::default()
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.address)
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Requests to one path, in arrival order.
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.path == path)
            .collect()
    }

    /// `METHOD /path` of every request, in arrival order.
    pub fn request_log(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|request| format!("{} {}", request.method, request.path))
            .collect()
    }

    pub fn has_user(&self, user_id: &str) -> bool {
        self.state.users.lock().unwrap().contains(user_id)
    }
}

impl Drop for MockGateway {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[derive(Debug)]
struct GatewayState {
    behavior: Behavior,
    users: Mutex<HashSet<String>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

async fn handle(
    State(state): State<Arc<GatewayState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = RecordedRequest {
        method,
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    };

    state.requests.lock().unwrap().push(request.clone());

    if request.path == "/login" && request.method == Method::POST {
        return state.login(&request);
    }

    if !state.authorized(&request) {
        return error(StatusCode::UNAUTHORIZED, "Authentication Error, invalid user key");
    }

    match (request.method.as_str(), request.path.as_str()) {
        ("GET", "/user/get_users") => state.get_users(&request),
        ("POST", "/user/new") => state.new_user(&request),
        ("GET", "/budget/list") => state.list_budgets(),
        ("POST", "/key/generate") => state.generate_key(&request).await,
        ("GET", path) => match path.strip_prefix("/team/").and_then(|rest| rest.strip_suffix("/callback")) {
            Some(team_id) => state.team_callback(team_id),
            None => error(StatusCode::NOT_FOUND, "Not Found"),
        },
        _ => error(StatusCode::NOT_FOUND, "Not Found"),
    }
}

impl GatewayState {
    fn authorized(&self, request: &RecordedRequest) -> bool {
        let behavior = &self.behavior;

        if behavior.credential.is_none() && behavior.login.is_none() {
            return true;
        }

        if let Some((name, value)) = &behavior.credential
            && request.header(name) == Some(value.as_str())
        {
            return true;
        }

        match behavior.login.as_ref().and_then(|login| login.cookie.as_ref()) {
            Some((_, token)) => request.header("authorization") == Some(format!("Bearer {token}").as_str()),
            None => false,
        }
    }

    fn login(&self, request: &RecordedRequest) -> Response {
        let Some(login) = &self.behavior.login else {
            return error(StatusCode::NOT_FOUND, "Not Found");
        };

        let accepted = request.form_value("username").as_deref() == Some(login.username.as_str())
            && request.form_value("password").as_deref() == Some(login.password.as_str());

        if !accepted {
            return error(StatusCode::UNAUTHORIZED, "Invalid credentials used to access UI.");
        }

        match &login.cookie {
            Some((name, value)) => (
                StatusCode::SEE_OTHER,
                [
                    (header::LOCATION, "/ui/".to_string()),
                    (header::SET_COOKIE, format!("{name}={value}; Path=/; HttpOnly")),
                ],
            )
                .into_response(),
            None => (StatusCode::SEE_OTHER, [(header::LOCATION, "/ui/".to_string())]).into_response(),
        }
    }

    fn get_users(&self, request: &RecordedRequest) -> Response {
        let users = self.users.lock().unwrap();

        let found: Vec<Value> = request
            .query_pairs()
            .into_iter()
            .filter(|(key, _)| key == "user_ids")
            .filter(|(_, user_id)| users.contains(user_id))
            .map(|(_, user_id)| json!({ "user_id": user_id, "user_email": user_id }))
            .collect();

        Json(json!({ "users": found, "total": found.len(), "page": 1 })).into_response()
    }

    fn new_user(&self, request: &RecordedRequest) -> Response {
        if let Some(status) = self.behavior.user_creation_status {
            return error(status, "User could not be created");
        }

        let body = request.json();

        let Some(user_id) = body.get("user_id").and_then(Value::as_str) else {
            return error(StatusCode::UNPROCESSABLE_ENTITY, "user_id is required");
        };

        self.users.lock().unwrap().insert(user_id.to_string());

        Json(json!({ "user_id": user_id, "key": "sk-user-default" })).into_response()
    }

    fn team_callback(&self, team_id: &str) -> Response {
        if let Some(status) = self.behavior.teams.get(team_id) {
            Json(json!({
                "status": status,
                "team_id": team_id,
                "data": { "success_callbacks": [], "failure_callbacks": [], "callback_vars": {} },
            }))
            .into_response()
        } else {
            error(StatusCode::NOT_FOUND, &format!("Team not found, passed team_id={team_id}"))
        }
    }

    fn list_budgets(&self) -> Response {
        match self.behavior.budget_list_status {
            Some(status) => error(status, "Budgets could not be listed"),
            None => Json(Value::Array(self.behavior.budgets.clone())).into_response(),
        }
    }

    async fn generate_key(&self, request: &RecordedRequest) -> Response {
        if let Some(delay) = self.behavior.key_delay {
            tokio::time::sleep(delay).await;
        }

        let alias = request.json().get("key_alias").cloned().unwrap_or(Value::Null);

        match &self.behavior.key {
            KeyBehavior::Issue(key) => Json(json!({ "key": key, "key_alias": alias })).into_response(),
            KeyBehavior::Status(status) => error(*status, "Key could not be generated"),
            KeyBehavior::WithoutKey => Json(json!({ "key_alias": alias })).into_response(),
        }
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": { "message": message } }))).into_response()
}
