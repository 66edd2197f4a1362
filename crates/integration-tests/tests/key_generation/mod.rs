use std::time::Duration;

use axum::http::StatusCode;
use indoc::formatdoc;
use integration_tests::*;
use provisioner::{KeyManager, KeyOptions, ProvisionError, SubmitState};
use serde_json::json;

fn admin_config(gateway: &MockGateway) -> String {
    formatdoc! {r#"
        [litellm]
        base_url = "{}"
        admin_key = "sk-admin"

        [litellm.auth]
        strategy = "admin_credential"

        [litellm.verification]
        policy = "none"
    "#, gateway.url()}
}

async fn admin_manager(gateway: &MockGateway) -> KeyManager {
    let config = load_config(&admin_config(gateway));
    KeyManager::initialize(config, &TestIdentity::unknown()).await.unwrap()
}

#[tokio::test]
async fn key_is_scoped_to_team_budget_and_user() {
    let gateway = MockGateway::builder()
        .admin_key("sk-admin")
        .team("team-1")
        .budget("b-1", 25.0)
        .user("jane@example.com")
        .start()
        .await;

    let config = load_config(&formatdoc! {r#"
        [litellm]
        base_url = "{}"
        admin_key = "sk-admin"
        team_id = "team-1"
        budget_id = "b-1"
        max_budget_per_user = 10.0
        models = ["gpt-4o"]
    "#, gateway.url()});

    let manager = KeyManager::initialize(config, &TestIdentity::email("jane@example.com"))
        .await
        .unwrap();

    let key = manager.generate_key(KeyOptions::new("  laptop  ")).await.unwrap();

    assert_eq!(key.expose(), "sk-test123");
    assert_eq!(key.alias(), "laptop");

    insta::assert_debug_snapshot!(gateway.request_log(), @r#"
    [
        "GET /team/team-1/callback",
        "GET /budget/list",
        "GET /user/get_users",
        "POST /key/generate",
    ]
    "#);

    let request = &gateway.requests_to("/key/generate")[0];

    assert_eq!(request.header("authorization"), Some("Bearer sk-admin"));
    assert_eq!(
        request.json(),
        json!({
            "key_alias": "laptop",
            "user_id": "jane@example.com",
            "team_id": "team-1",
            "budget_id": "b-1",
            "models": ["gpt-4o"],
        })
    );
}

#[tokio::test]
async fn options_override_configured_scope() {
    let gateway = MockGateway::builder().admin_key("sk-admin").start().await;
    let manager = admin_manager(&gateway).await;

    let options = KeyOptions::new("ci").budget("b-2").model("claude").tag("pipeline");
    manager.generate_key(options).await.unwrap();

    let request = &gateway.requests_to("/key/generate")[0];

    assert_eq!(
        request.json(),
        json!({
            "key_alias": "ci",
            "budget_id": "b-2",
            "models": ["claude"],
            "tags": ["pipeline"],
        })
    );
}

#[tokio::test]
async fn blank_alias_sends_nothing() {
    let gateway = MockGateway::builder().admin_key("sk-admin").start().await;
    let manager = admin_manager(&gateway).await;

    for alias in ["", "   ", "\t"] {
        let error = manager.generate_key(KeyOptions::new(alias)).await.unwrap_err();

        assert!(matches!(error, ProvisionError::Validation(_)));
        assert_eq!(error.user_message(), "Please provide a key name.");
    }

    assert!(gateway.requests().is_empty());
}

#[tokio::test]
async fn missing_required_budget_sends_nothing() {
    let gateway = MockGateway::builder().admin_key("sk-admin").start().await;

    let config = load_config(&formatdoc! {r#"
        [litellm]
        base_url = "{}"
        admin_key = "sk-admin"
        budget_required = true

        [litellm.auth]
        strategy = "admin_credential"

        [litellm.verification]
        policy = "none"
    "#, gateway.url()});

    let manager = KeyManager::initialize(config, &TestIdentity::unknown()).await.unwrap();
    let error = manager.generate_key(KeyOptions::new("laptop")).await.unwrap_err();

    insta::assert_snapshot!(error.user_message(), @"Please select a budget for the key.");
    assert!(gateway.requests().is_empty());
}

#[tokio::test]
async fn duplicate_alias_hint() {
    let gateway = MockGateway::builder()
        .admin_key("sk-admin")
        .key_response(KeyBehavior::Status(StatusCode::BAD_REQUEST))
        .start()
        .await;

    let manager = admin_manager(&gateway).await;
    let error = manager.generate_key(KeyOptions::new("laptop")).await.unwrap_err();

    insta::assert_snapshot!(
        error.user_message(),
        @"Error generating key: Failed to generate key: 400 Bad Request - This might be due to a duplicate key name. Please try a different name."
    );
}

#[tokio::test]
async fn server_error_hint() {
    let gateway = MockGateway::builder()
        .admin_key("sk-admin")
        .key_response(KeyBehavior::Status(StatusCode::INTERNAL_SERVER_ERROR))
        .start()
        .await;

    let manager = admin_manager(&gateway).await;
    let error = manager
        .generate_key(KeyOptions::new("laptop").tag("paid"))
        .await
        .unwrap_err();

    insta::assert_snapshot!(
        error.user_message(),
        @"Error generating key: Failed to generate key: 500 Internal Server Error - Tags and budgets on keys may be a paid feature of this gateway. Try again without tags or a budget."
    );
}

#[tokio::test]
async fn other_status_is_reported_verbatim() {
    let gateway = MockGateway::builder()
        .admin_key("sk-admin")
        .key_response(KeyBehavior::Status(StatusCode::FORBIDDEN))
        .start()
        .await;

    let manager = admin_manager(&gateway).await;
    let error = manager.generate_key(KeyOptions::new("laptop")).await.unwrap_err();

    insta::assert_snapshot!(error.user_message(), @"Error generating key: Failed to generate key: 403 Forbidden");
}

#[tokio::test]
async fn success_without_key() {
    let gateway = MockGateway::builder()
        .admin_key("sk-admin")
        .key_response(KeyBehavior::WithoutKey)
        .start()
        .await;

    let manager = admin_manager(&gateway).await;
    let error = manager.generate_key(KeyOptions::new("laptop")).await.unwrap_err();

    insta::assert_snapshot!(error.user_message(), @"No key returned from API.");
}

#[tokio::test]
async fn second_submission_is_rejected_while_in_flight() {
    let gateway = MockGateway::builder()
        .admin_key("sk-admin")
        .key_delay(Duration::from_millis(300))
        .start()
        .await;

    let manager = admin_manager(&gateway).await;

    let first = manager.generate_key(KeyOptions::new("first"));

    let second = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let state = manager.submit_state();
        let result = manager.generate_key(KeyOptions::new("second")).await;

        (state, result)
    };

    let (first, (state, second)) = tokio::join!(first, second);

    assert_eq!(first.unwrap().alias(), "first");
    assert_eq!(state, SubmitState::Submitting);
    assert!(matches!(second, Err(ProvisionError::Busy)));
    assert_eq!(gateway.requests_to("/key/generate").len(), 1);

    assert_eq!(manager.submit_state(), SubmitState::Idle);
    assert!(manager.generate_key(KeyOptions::new("third")).await.is_ok());
}

#[tokio::test]
async fn failed_submission_returns_to_idle() {
    let gateway = MockGateway::builder()
        .admin_key("sk-admin")
        .key_response(KeyBehavior::Status(StatusCode::BAD_REQUEST))
        .start()
        .await;

    let manager = admin_manager(&gateway).await;

    assert!(manager.generate_key(KeyOptions::new("laptop")).await.is_err());
    assert_eq!(manager.submit_state(), SubmitState::Idle);

    let error = manager.generate_key(KeyOptions::new("laptop-2")).await.unwrap_err();

    assert!(!matches!(error, ProvisionError::Busy));
    assert_eq!(gateway.requests_to("/key/generate").len(), 2);
}

#[tokio::test]
async fn unreachable_gateway() {
    let config = load_config(indoc::indoc! {r#"
        [litellm]
        base_url = "http://127.0.0.1:9"
        admin_key = "sk-admin"

        [litellm.auth]
        strategy = "admin_credential"

        [litellm.verification]
        policy = "none"
    "#});

    let manager = KeyManager::initialize(config, &TestIdentity::unknown()).await.unwrap();
    let error = manager.generate_key(KeyOptions::new("laptop")).await.unwrap_err();

    assert!(
        error
            .user_message()
            .starts_with("Error generating key: Failed to generate key: Failed to connect to LiteLLM"),
        "{}",
        error.user_message()
    );
}
