//! Best-effort acquisition of an API key from a freshly started engine.
//!
//! Each strategy gets exactly one attempt, in order. The first success wins;
//! if none succeeds the result is a terminal `ManualSetupRequired`.

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use rand::Rng;
use rand::distributions::Alphanumeric;
use reqwest::{Client, Response, StatusCode, header};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{info, warn};

use super::API_PREFIX;
use crate::core::config::ConfigStore;
use crate::core::settings::HubSettings;

const KEY_LABEL: &str = "workflow-hub";

pub struct BootstrapContext {
    pub http: Client,
    pub base: String,
    pub owner_email: String,
    pub password: String,
    pub timeout: Duration,
}

impl BootstrapContext {
    fn rest_url(&self, path: &str) -> String {
        format!("{}/rest{}", self.base, path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    ApiKey(String),
    /// The engine answers API calls without any key.
    OpenAccess,
}

#[async_trait]
pub trait BootstrapStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    async fn attempt(&self, ctx: &BootstrapContext) -> Result<Credential>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyFailure {
    pub strategy: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Configured {
        strategy: &'static str,
        api_key: String,
    },
    OpenAccess {
        strategy: &'static str,
    },
    ManualSetupRequired {
        failures: Vec<StrategyFailure>,
    },
}

pub struct CredentialBootstrapper {
    strategies: Vec<Box<dyn BootstrapStrategy>>,
}

impl CredentialBootstrapper {
    pub fn new(strategies: Vec<Box<dyn BootstrapStrategy>>) -> Self {
        Self { strategies }
    }

    /// Owner setup, then login with remembered credentials, then no-auth.
    pub fn with_default_strategies() -> Self {
        Self::new(vec![
            Box::new(OwnerSetup),
            Box::new(LoginAndCreateKey),
            Box::new(NoAuth),
        ])
    }

    pub async fn run(&self, ctx: &BootstrapContext) -> BootstrapOutcome {
        let mut failures = Vec::new();
        for strategy in &self.strategies {
            match strategy.attempt(ctx).await {
                Ok(Credential::ApiKey(api_key)) => {
                    return BootstrapOutcome::Configured {
                        strategy: strategy.name(),
                        api_key,
                    };
                }
                Ok(Credential::OpenAccess) => {
                    return BootstrapOutcome::OpenAccess {
                        strategy: strategy.name(),
                    };
                }
                Err(e) => {
                    info!("Credential strategy '{}' failed: {:#}", strategy.name(), e);
                    failures.push(StrategyFailure {
                        strategy: strategy.name(),
                        reason: format!("{:#}", e),
                    });
                }
            }
        }
        BootstrapOutcome::ManualSetupRequired { failures }
    }
}

/// Run `bootstrapper` against the configured engine and persist a minted key.
/// The owner password is remembered before any attempt so a later boot can
/// log in with it.
pub async fn bootstrap_credentials(
    settings: &HubSettings,
    store: &ConfigStore,
    bootstrapper: &CredentialBootstrapper,
) -> Result<BootstrapOutcome> {
    let cfg = store.read();
    let owner_email = cfg
        .owner_email
        .clone()
        .unwrap_or_else(|| settings.owner_email.clone());
    let password = cfg.setup_password.clone().unwrap_or_else(generate_password);
    store.remember_owner(&owner_email, &password)?;

    let ctx = BootstrapContext {
        http: Client::builder().build()?,
        base: settings.engine_base(),
        owner_email,
        password,
        timeout: settings.request_timeout(),
    };

    let outcome = bootstrapper.run(&ctx).await;
    match &outcome {
        BootstrapOutcome::Configured { strategy, api_key } => {
            store.set_api_key(api_key)?;
            info!("Engine API key configured via '{}'", strategy);
        }
        BootstrapOutcome::OpenAccess { .. } => {
            info!("Engine accepts API calls without a key");
        }
        BootstrapOutcome::ManualSetupRequired { failures } => {
            warn!(
                "Could not configure an engine API key automatically ({} strategies failed); set one in Settings",
                failures.len()
            );
        }
    }
    Ok(outcome)
}

/// Satisfies the engine's password rules: 8+ chars, an uppercase letter and
/// a digit.
pub fn generate_password() -> String {
    let body: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(20)
        .map(char::from)
        .collect();
    format!("{}Wh7", body)
}

/// `name=value` pairs from every `Set-Cookie` header, joined for a `Cookie`
/// request header.
fn session_cookie(res: &Response) -> Option<String> {
    let pairs: Vec<&str> = res
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect();
    (!pairs.is_empty()).then(|| pairs.join("; "))
}

fn extract_api_key(body: &Value) -> Option<String> {
    let data = body.get("data").unwrap_or(body);
    ["rawApiKey", "apiKey"]
        .iter()
        .find_map(|k| data.get(*k).and_then(Value::as_str))
        .filter(|k| !k.is_empty())
        .map(str::to_string)
}

async fn create_api_key(ctx: &BootstrapContext, cookie: &str) -> Result<String> {
    let res = ctx
        .http
        .post(ctx.rest_url("/api-keys"))
        .timeout(ctx.timeout)
        .header(header::COOKIE, cookie)
        .json(&json!({ "label": KEY_LABEL }))
        .send()
        .await?;

    // Older engines expose a single key per user instead.
    let res = if res.status() == StatusCode::NOT_FOUND {
        ctx.http
            .post(ctx.rest_url("/me/api-key"))
            .timeout(ctx.timeout)
            .header(header::COOKIE, cookie)
            .send()
            .await?
    } else {
        res
    };

    let status = res.status();
    if !status.is_success() {
        bail!("API key creation returned {}", status);
    }
    let body: Value = res.json().await?;
    extract_api_key(&body).ok_or_else(|| anyhow!("API key creation returned no key"))
}

pub struct OwnerSetup;

#[async_trait]
impl BootstrapStrategy for OwnerSetup {
    fn name(&self) -> &'static str {
        "owner-setup"
    }

    async fn attempt(&self, ctx: &BootstrapContext) -> Result<Credential> {
        let res = ctx
            .http
            .post(ctx.rest_url("/owner/setup"))
            .timeout(ctx.timeout)
            .json(&json!({
                "email": ctx.owner_email,
                "firstName": "Workflow",
                "lastName": "Hub",
                "password": ctx.password,
            }))
            .send()
            .await?;
        if !res.status().is_success() {
            bail!("owner setup returned {}", res.status());
        }
        let cookie =
            session_cookie(&res).ok_or_else(|| anyhow!("owner setup returned no session"))?;
        Ok(Credential::ApiKey(create_api_key(ctx, &cookie).await?))
    }
}

pub struct LoginAndCreateKey;

#[async_trait]
impl BootstrapStrategy for LoginAndCreateKey {
    fn name(&self) -> &'static str {
        "login-create-key"
    }

    async fn attempt(&self, ctx: &BootstrapContext) -> Result<Credential> {
        let res = ctx
            .http
            .post(ctx.rest_url("/login"))
            .timeout(ctx.timeout)
            .json(&json!({
                "emailOrLdapLoginId": ctx.owner_email,
                "email": ctx.owner_email,
                "password": ctx.password,
            }))
            .send()
            .await?;
        if !res.status().is_success() {
            bail!("login returned {}", res.status());
        }
        let cookie = session_cookie(&res).ok_or_else(|| anyhow!("login returned no session"))?;
        Ok(Credential::ApiKey(create_api_key(ctx, &cookie).await?))
    }
}

pub struct NoAuth;

#[async_trait]
impl BootstrapStrategy for NoAuth {
    fn name(&self) -> &'static str {
        "no-auth"
    }

    async fn attempt(&self, ctx: &BootstrapContext) -> Result<Credential> {
        let res = ctx
            .http
            .get(format!("{}{}/workflows", ctx.base, API_PREFIX))
            .timeout(ctx.timeout)
            .send()
            .await?;
        if !res.status().is_success() {
            bail!("engine requires an API key ({})", res.status());
        }
        Ok(Credential::OpenAccess)
    }
}
