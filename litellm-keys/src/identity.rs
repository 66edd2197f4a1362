use async_trait::async_trait;
use provisioner::{IdentityApi, ProfileInfo};

/// Operator profile taken from the command line.
pub struct CommandLineIdentity {
    email: Option<String>,
}

impl CommandLineIdentity {
    pub fn new(email: Option<String>) -> Self {
        Self { email }
    }
}

#[async_trait]
impl IdentityApi for CommandLineIdentity {
    async fn profile_info(&self) -> anyhow::Result<ProfileInfo> {
        match self.email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() => Ok(ProfileInfo {
                email: Some(email.to_string()),
            }),
            _ => anyhow::bail!("no operator email given, pass --email or set LITELLM_KEYS_EMAIL"),
        }
    }
}
