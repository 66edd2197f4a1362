use indoc::formatdoc;
use integration_tests::*;
use provisioner::{KEY_PLACEHOLDER, KeyManager, KeyOptions, SampleKind};

#[tokio::test]
async fn samples_carry_the_generated_key_and_gateway_url() {
    let gateway = MockGateway::builder()
        .admin_key("sk-admin")
        .key_response(KeyBehavior::Issue("sk-test123".to_string()))
        .start()
        .await;

    let config = load_config(&formatdoc! {r#"
        [litellm]
        base_url = "{}/"
        admin_key = "sk-admin"

        [litellm.auth]
        strategy = "admin_credential"

        [litellm.verification]
        policy = "none"
    "#, gateway.url()});

    let manager = KeyManager::initialize(config, &TestIdentity::unknown()).await.unwrap();
    let key = manager.generate_key(KeyOptions::new("laptop")).await.unwrap();

    let samples = manager.samples(Some(&key));
    let labels: Vec<_> = samples.iter().map(|sample| sample.kind.label()).collect();

    assert_eq!(labels, vec!["Python OpenAI", "Python Langchain", "JS Langchain", "cURL"]);

    for sample in &samples {
        assert!(sample.code.contains("sk-test123"), "{}", sample.kind.label());
        assert!(!sample.code.contains(KEY_PLACEHOLDER), "{}", sample.kind.label());
    }

    let python = samples.iter().find(|sample| sample.kind == SampleKind::PythonOpenAi).unwrap();
    assert!(python.code.contains(&format!(r#"base_url="{}""#, gateway.url())));

    let curl = samples.iter().find(|sample| sample.kind == SampleKind::Curl).unwrap();
    assert!(curl.code.contains("Bearer sk-test123"));
    assert!(curl.code.contains(&format!("{}/chat/completions", gateway.url())));
}
