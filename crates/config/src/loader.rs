use std::{fmt::Write, path::Path, sync::OnceLock};

use anyhow::bail;
use indoc::indoc;
use regex::Regex;
use secrecy::ExposeSecret;
use serde::Deserialize;
use toml::Value;

use crate::{AuthStrategy, Config, error::Error};

pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let path = path.as_ref().to_path_buf();
    let content = std::fs::read_to_string(&path).map_err(Error::from)?;

    log::debug!("Loading configuration from {}", path.display());

    parse(&content)
}

pub(crate) fn parse(content: &str) -> anyhow::Result<Config> {
    let mut raw_config: Value = toml::from_str(content).map_err(Error::from)?;

    validate_has_litellm(&raw_config)?;
    expand_dynamic_strings(&mut Vec::new(), &mut raw_config)?;

    let config = Config::deserialize(raw_config)?;
    validate_credentials(&config)?;
    validate_user_provisioning(&config)?;

    for warning in collect_warnings(&config) {
        log::warn!("{warning}");
    }

    Ok(config)
}

fn validate_has_litellm(raw_config: &Value) -> anyhow::Result<()> {
    if raw_config.get("litellm").is_some_and(Value::is_table) {
        return Ok(());
    }

    bail!(indoc! {r#"
        LiteLLM config is not set. The provisioner needs at least the gateway address and a credential.

        Example configuration:

          [litellm]
          base_url = "https://litellm.example.com"
          admin_key = "{{ env.LITELLM_ADMIN_KEY }}"
          team_id = "my-team"
          max_budget_per_user = 10.0
    "#});
}

fn validate_credentials(config: &Config) -> anyhow::Result<()> {
    let litellm = &config.litellm;

    match litellm.auth.strategy {
        AuthStrategy::AdminCredential | AuthStrategy::IdentityLookup => {
            let has_key = litellm
                .admin_key
                .as_ref()
                .is_some_and(|key| !key.expose_secret().trim().is_empty());

            if !has_key {
                bail!(indoc! {r#"
                    LiteLLM admin_key is not set. The admin_credential and identity_lookup strategies send it with every request.

                      [litellm]
                      admin_key = "{{ env.LITELLM_ADMIN_KEY }}"

                    Use strategy = "login_session" in [litellm.auth] to log in with a username and password instead.
                "#});
            }
        }
        AuthStrategy::LoginSession => {
            if litellm.auth.session_cookie.trim().is_empty() {
                bail!("litellm.auth.session_cookie cannot be empty with the login_session strategy");
            }
        }
    }

    if litellm.identity.federation_marker.is_empty() {
        bail!("litellm.identity.federation_marker cannot be empty");
    }

    Ok(())
}

fn validate_user_provisioning(config: &Config) -> anyhow::Result<()> {
    let litellm = &config.litellm;

    if litellm.auth.strategy != AuthStrategy::IdentityLookup {
        return Ok(());
    }

    match litellm.max_budget_per_user {
        None => bail!(indoc! {r#"
            LiteLLM max_budget_per_user is not set. Users created for the identity_lookup strategy need a spending cap.

              [litellm]
              max_budget_per_user = 10.0
        "#}),
        Some(budget) if !budget.is_finite() || budget < 0.0 => {
            bail!("litellm.max_budget_per_user must be a non-negative number, got {budget}")
        }
        Some(_) => Ok(()),
    }
}

/// Settings that are accepted but probably not what the operator meant.
pub(crate) fn collect_warnings(config: &Config) -> Vec<String> {
    let litellm = &config.litellm;
    let mut warnings = Vec::new();

    if litellm.auth.strategy == AuthStrategy::LoginSession && litellm.admin_key.is_some() {
        warnings.push("litellm.admin_key is ignored with the login_session strategy".to_string());
    }

    if litellm.auth.strategy != AuthStrategy::AdminCredential && litellm.user_id.is_some() {
        warnings.push("litellm.user_id is only used with the admin_credential strategy".to_string());
    }

    if litellm.budget_required && litellm.budget_id.is_none() {
        warnings.push(
            "litellm.budget_required is set without a default budget_id; every key request must select a budget"
                .to_string(),
        );
    }

    warnings
}

fn env_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();

    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{\s*env\.([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("environment pattern should be valid")
    })
}

/// Replaces `{{ env.NAME }}` placeholders with the value of the environment variable.
fn expand_env(input: &str) -> Result<String, String> {
    let pattern = env_pattern();
    let mut output = String::with_capacity(input.len());
    let mut last = 0;

    for captures in pattern.captures_iter(input) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };

        let value = std::env::var(name.as_str())
            .map_err(|err| format!("'{}': {err}", name.as_str()))?;

        output.push_str(&input[last..whole.start()]);
        output.push_str(&value);
        last = whole.end();
    }

    output.push_str(&input[last..]);

    Ok(output)
}

fn expand_dynamic_strings<'a>(path: &mut Vec<Result<&'a str, usize>>, value: &'a mut Value) -> crate::Result<()> {
    match value {
        Value::String(s) => match expand_env(s) {
            Ok(out) => *s = out,
            Err(reason) => {
                let mut p = String::new();

                for segment in path.iter() {
                    match segment {
                        Ok(s) => {
                            p.push_str(s);
                            p.push('.');
                        }
                        Err(i) => {
                            let _ = write!(p, "[{i}]");
                        }
                    }
                }

                if p.ends_with('.') {
                    p.pop();
                }

                return Err(Error::EnvVarSubstitution { path: p, reason });
            }
        },
        Value::Array(values) => {
            for (i, value) in values.iter_mut().enumerate() {
                path.push(Err(i));
                expand_dynamic_strings(path, value)?;
                path.pop();
            }
        }
        Value::Table(map) => {
            for (key, value) in map {
                path.push(Ok(key.as_str()));
                expand_dynamic_strings(path, value)?;
                path.pop();
            }
        }
        Value::Integer(_) | Value::Float(_) | Value::Boolean(_) | Value::Datetime(_) => (),
    }

    Ok(())
}
