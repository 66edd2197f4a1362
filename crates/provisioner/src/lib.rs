//! Self-service API key provisioning against a LiteLLM gateway.
//!
//! [`KeyManager::initialize`] resolves the gateway session and verifies the team, budget and
//! user a key is scoped to. The manager then issues keys and renders usage samples for them.

mod error;
mod identity;
mod keys;
mod manager;
mod samples;
mod session;
mod verify;

pub use error::{KeyRequestError, ProvisionError, ProvisionResult};
pub use identity::{Identity, IdentityApi, IdentitySource, ProfileInfo, normalize_email};
pub use keys::{GeneratedKey, KeyOptions, SubmitState};
pub use manager::KeyManager;
pub use samples::{KEY_PLACEHOLDER, Sample, SampleKind, render, render_all};
pub use session::{Session, resolve_session};
pub use verify::{Verification, Verifier};
