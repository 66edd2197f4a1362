mod mock;

use async_trait::async_trait;
use config::{Config, LitellmConfig};
use provisioner::{IdentityApi, ProfileInfo};

pub use mock::{KeyBehavior, MockGateway, MockGatewayBuilder, RecordedRequest};

/// Loads `config_toml` through the file loader, so validation and warnings run as in production.
pub fn load_config(config_toml: &str) -> LitellmConfig {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("litellm-keys.toml");
    std::fs::write(&config_path, config_toml).unwrap();

    Config::load(&config_path).unwrap().litellm
}

/// Identity provider with a fixed answer.
pub struct TestIdentity {
    email: Option<String>,
    fail: bool,
}

impl TestIdentity {
    pub fn email(email: &str) -> Self {
        Self {
            email: Some(email.to_string()),
            fail: false,
        }
    }

    pub fn unknown() -> Self {
        Self {
            email: None,
            fail: false,
        }
    }

    pub fn broken() -> Self {
        Self {
            email: None,
            fail: true,
        }
    }
}

#[async_trait]
impl IdentityApi for TestIdentity {
    async fn profile_info(&self) -> anyhow::Result<ProfileInfo> {
        if self.fail {
            anyhow::bail!("identity provider unavailable");
        }

        Ok(ProfileInfo {
            email: self.email.clone(),
        })
    }
}
