//! Client for the administrative API of a LiteLLM gateway.
//!
//! Every call is a single attempt; retrying is left to the caller.

mod client;
mod credential;
mod error;
mod http_client;
pub mod types;

pub use client::GatewayClient;
pub use credential::Credential;
pub use error::{GatewayError, GatewayResult};
