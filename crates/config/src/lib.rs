mod error;
mod litellm;
mod loader;

use std::path::Path;

use serde::Deserialize;

pub use error::Error;
pub use litellm::{
    AuthConfig, AuthStrategy, BaseUrl, CredentialHeader, IdentityConfig, IdentityFailurePolicy, LitellmConfig,
    VerificationConfig, VerificationPolicy,
};

pub(crate) type Result<T> = std::result::Result<T, error::Error>;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub litellm: LitellmConfig,
}

impl Config {
    /// Reads, expands and validates the configuration file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
        loader::load(path)
    }

    /// Same as [`Config::load`], for configuration already held in memory.
    pub fn from_toml(content: &str) -> anyhow::Result<Config> {
        loader::parse(content)
    }
}
