use std::path::PathBuf;

use clap::{Parser, Subcommand};
use provisioner::SampleKind;

#[derive(Debug, Parser)]
#[command(name = "litellm-keys", version, about = "Self-service API keys for a LiteLLM gateway")]
pub struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "LITELLM_KEYS_CONFIG", default_value = "litellm-keys.toml")]
    pub config: PathBuf,

    /// Log filter, e.g. "info" or "provisioner=debug,gateway=debug"
    #[arg(long, env = "LITELLM_KEYS_LOG", default_value = "info")]
    pub log: String,

    /// Operator email, used as the gateway user with the identity_lookup strategy
    #[arg(long, env = "LITELLM_KEYS_EMAIL")]
    pub email: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a new API key and print usage samples for it
    Generate {
        /// Name of the key, must be unique on the gateway
        #[arg(long)]
        alias: String,

        /// Budget to attach, overrides the configured budget
        #[arg(long)]
        budget: Option<String>,

        /// Model the key may call, repeatable. Overrides the configured models
        #[arg(long = "model")]
        models: Vec<String>,

        /// Tag to attach, repeatable. Overrides the configured tags
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Only print this sample
        #[arg(long)]
        sample: Option<SampleKind>,
    },
    /// List the budgets a key can be attached to
    Budgets,
    /// Print usage samples with a placeholder key, without contacting the gateway
    Samples {
        /// Only print this sample
        #[arg(long)]
        sample: Option<SampleKind>,
    },
    /// Verify the gateway setup and print the resolved identity
    Status,
}
