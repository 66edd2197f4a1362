use axum::http::StatusCode;
use indoc::formatdoc;
use integration_tests::*;
use provisioner::{KeyManager, KeyOptions, ProvisionError};

#[tokio::test]
async fn strict_team_failure_stops_before_budget_and_user() {
    let gateway = MockGateway::builder()
        .admin_key("sk-admin")
        .budget("b-1", 25.0)
        .start()
        .await;

    let config = load_config(&formatdoc! {r#"
        [litellm]
        base_url = "{}"
        admin_key = "sk-admin"
        team_id = "missing-team"
        budget_id = "b-1"
        max_budget_per_user = 10.0
    "#, gateway.url()});

    let error = KeyManager::initialize(config, &TestIdentity::email("jane@example.com"))
        .await
        .unwrap_err();

    assert!(matches!(error, ProvisionError::Verification(_)));
    assert!(error.user_message().contains("missing-team"), "{}", error.user_message());

    insta::assert_debug_snapshot!(gateway.request_log(), @r#"
    [
        "GET /team/missing-team/callback",
    ]
    "#);
}

#[tokio::test]
async fn strict_team_callback_reporting_an_error_stops_verification() {
    let gateway = MockGateway::builder()
        .admin_key("sk-admin")
        .team_with_error_callback("team-1")
        .budget("b-1", 25.0)
        .start()
        .await;

    let config = load_config(&formatdoc! {r#"
        [litellm]
        base_url = "{}"
        admin_key = "sk-admin"
        team_id = "team-1"
        budget_id = "b-1"
        max_budget_per_user = 10.0
    "#, gateway.url()});

    let error = KeyManager::initialize(config, &TestIdentity::email("jane@example.com"))
        .await
        .unwrap_err();

    assert!(matches!(error, ProvisionError::Verification(_)));
    insta::assert_snapshot!(error.user_message(), @"Team 'team-1' was not found on the LiteLLM gateway");

    insta::assert_debug_snapshot!(gateway.request_log(), @r#"
    [
        "GET /team/team-1/callback",
    ]
    "#);
}

#[tokio::test]
async fn strict_missing_budget_stops_before_user() {
    let gateway = MockGateway::builder()
        .admin_key("sk-admin")
        .team("team-1")
        .budget("b-1", 25.0)
        .start()
        .await;

    let config = load_config(&formatdoc! {r#"
        [litellm]
        base_url = "{}"
        admin_key = "sk-admin"
        team_id = "team-1"
        budget_id = "b-404"
        max_budget_per_user = 10.0
    "#, gateway.url()});

    let error = KeyManager::initialize(config, &TestIdentity::email("jane@example.com"))
        .await
        .unwrap_err();

    insta::assert_snapshot!(error.user_message(), @"Budget 'b-404' was not found on the LiteLLM gateway");

    insta::assert_debug_snapshot!(gateway.request_log(), @r#"
    [
        "GET /team/team-1/callback",
        "GET /budget/list",
    ]
    "#);
}

#[tokio::test]
async fn strict_verification_offers_the_budget_list() {
    let gateway = MockGateway::builder()
        .admin_key("sk-admin")
        .team("team-1")
        .budget("b-1", 25.0)
        .budget("b-2", 100.0)
        .start()
        .await;

    let config = load_config(&formatdoc! {r#"
        [litellm]
        base_url = "{}"
        admin_key = "sk-admin"
        team_id = "team-1"
        budget_id = "b-2"
        max_budget_per_user = 10.0
    "#, gateway.url()});

    let manager = KeyManager::initialize(config, &TestIdentity::email("jane@example.com"))
        .await
        .unwrap();

    let budgets: Vec<_> = manager
        .available_budgets()
        .iter()
        .map(|budget| (budget.budget_id.as_str(), budget.max_budget))
        .collect();

    assert_eq!(budgets, vec![("b-1", Some(25.0)), ("b-2", Some(100.0))]);
    assert!(manager.notices().is_empty());
    assert!(gateway.has_user("jane@example.com"));

    insta::assert_debug_snapshot!(gateway.request_log(), @r#"
    [
        "GET /team/team-1/callback",
        "GET /budget/list",
        "GET /user/get_users",
        "POST /user/new",
    ]
    "#);
}

#[tokio::test]
async fn existing_user_is_not_created_again() {
    let gateway = MockGateway::builder()
        .admin_key("sk-admin")
        .user("jane@example.com")
        .start()
        .await;

    let config = load_config(&formatdoc! {r#"
        [litellm]
        base_url = "{}"
        admin_key = "sk-admin"
        max_budget_per_user = 10.0
    "#, gateway.url()});

    KeyManager::initialize(config, &TestIdentity::email("jane@example.com"))
        .await
        .unwrap();

    assert!(gateway.requests_to("/user/new").is_empty());
}

#[tokio::test]
async fn permissive_policy_degrades_and_stays_usable() {
    let gateway = MockGateway::builder()
        .admin_key("sk-admin")
        .budget_list_status(StatusCode::INTERNAL_SERVER_ERROR)
        .user_creation_status(StatusCode::INTERNAL_SERVER_ERROR)
        .start()
        .await;

    let config = load_config(&formatdoc! {r#"
        [litellm]
        base_url = "{}"
        admin_key = "sk-admin"
        team_id = "missing-team"
        max_budget_per_user = 10.0

        [litellm.verification]
        policy = "permissive"
    "#, gateway.url()});

    let manager = KeyManager::initialize(config, &TestIdentity::email("jane@example.com"))
        .await
        .unwrap();

    assert!(manager.available_budgets().is_empty());

    insta::assert_debug_snapshot!(manager.notices(), @r#"
    [
        "Team 'missing-team' could not be verified: LiteLLM returned 404 Not Found",
        "Failed to create user 'jane@example.com' in LiteLLM: LiteLLM returned 500 Internal Server Error",
    ]
    "#);

    let key = manager.generate_key(KeyOptions::new("laptop")).await.unwrap();
    assert_eq!(key.expose(), "sk-test123");
}

#[tokio::test]
async fn permissive_policy_reports_unknown_budget() {
    let gateway = MockGateway::builder()
        .admin_key("sk-admin")
        .budget("b-1", 25.0)
        .start()
        .await;

    let config = load_config(&formatdoc! {r#"
        [litellm]
        base_url = "{}"
        admin_key = "sk-admin"
        budget_id = "b-404"

        [litellm.auth]
        strategy = "admin_credential"

        [litellm.verification]
        policy = "permissive"
    "#, gateway.url()});

    let manager = KeyManager::initialize(config, &TestIdentity::unknown()).await.unwrap();

    assert_eq!(manager.available_budgets().len(), 1);

    insta::assert_debug_snapshot!(manager.notices(), @r#"
    [
        "Budget 'b-404' is not in the budget list of the LiteLLM gateway",
    ]
    "#);
}

#[tokio::test]
async fn no_verification_only_provisions_the_user() {
    let gateway = MockGateway::builder().admin_key("sk-admin").start().await;

    let config = load_config(&formatdoc! {r#"
        [litellm]
        base_url = "{}"
        admin_key = "sk-admin"
        team_id = "team-1"
        budget_id = "b-1"
        max_budget_per_user = 10.0

        [litellm.verification]
        policy = "none"
    "#, gateway.url()});

    KeyManager::initialize(config, &TestIdentity::email("jane@example.com"))
        .await
        .unwrap();

    insta::assert_debug_snapshot!(gateway.request_log(), @r#"
    [
        "GET /user/get_users",
        "POST /user/new",
    ]
    "#);
}

#[tokio::test]
async fn strict_policy_offers_budgets_without_a_default_budget() {
    let gateway = MockGateway::builder()
        .admin_key("sk-admin")
        .budget("b-1", 25.0)
        .budget("b-2", 100.0)
        .start()
        .await;

    let config = load_config(&formatdoc! {r#"
        [litellm]
        base_url = "{}"
        admin_key = "sk-admin"
        budget_required = true

        [litellm.auth]
        strategy = "admin_credential"
    "#, gateway.url()});

    let manager = KeyManager::initialize(config, &TestIdentity::unknown()).await.unwrap();

    let budgets: Vec<_> = manager
        .available_budgets()
        .iter()
        .map(|budget| budget.budget_id.as_str())
        .collect();

    assert_eq!(budgets, vec!["b-1", "b-2"]);
    assert!(manager.notices().is_empty());

    insta::assert_debug_snapshot!(gateway.request_log(), @r#"
    [
        "GET /budget/list",
    ]
    "#);
}

#[tokio::test]
async fn strict_policy_tolerates_a_failed_budget_list_without_a_default_budget() {
    let gateway = MockGateway::builder()
        .admin_key("sk-admin")
        .budget_list_status(StatusCode::INTERNAL_SERVER_ERROR)
        .start()
        .await;

    let config = load_config(&formatdoc! {r#"
        [litellm]
        base_url = "{}"
        admin_key = "sk-admin"

        [litellm.auth]
        strategy = "admin_credential"
    "#, gateway.url()});

    let manager = KeyManager::initialize(config, &TestIdentity::unknown()).await.unwrap();

    assert!(manager.available_budgets().is_empty());
    assert!(manager.notices().is_empty());
}

#[tokio::test]
async fn admin_credential_never_provisions_users() {
    let gateway = MockGateway::builder().admin_key("sk-admin").start().await;

    let config = load_config(&formatdoc! {r#"
        [litellm]
        base_url = "{}"
        admin_key = "sk-admin"
        user_id = "svc-user"

        [litellm.auth]
        strategy = "admin_credential"
    "#, gateway.url()});

    KeyManager::initialize(config, &TestIdentity::unknown()).await.unwrap();

    assert!(gateway.requests_to("/user/get_users").is_empty());
    assert!(gateway.requests_to("/user/new").is_empty());

    insta::assert_debug_snapshot!(gateway.request_log(), @r#"
    [
        "GET /budget/list",
    ]
    "#);
}
