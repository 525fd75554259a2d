//! Credentials borrowed from a signed-in Azure CLI or Azure Developer CLI session

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use log::debug;
use serde::Deserialize;
use tokio::process::Command;

use super::{AccessToken, TokenCredential, expiry_from_epoch};

/// Run a CLI tool through the platform shell so `.cmd` shims resolve on Windows
fn shell_command(program: &str, args: &[String]) -> Command {
    if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.arg("/C").arg(program).args(args);
        command
    } else {
        let mut command = Command::new(program);
        command.args(args);
        command
    }
}

async fn run_tool(credential: &str, program: &str, args: Vec<String>) -> Result<String> {
    debug!("{}: running {} {}", credential, program, args.join(" "));

    let output = shell_command(program, &args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| anyhow::anyhow!("{}: failed to run '{}': {}", credential, program, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("{}: '{}' exited with {}: {}", credential, program, output.status, stderr.trim())
    }

    String::from_utf8(output.stdout).with_context(|| format!("{}: output was not UTF-8", credential))
}

#[derive(Debug, Deserialize)]
struct AzCliToken {
    #[serde(rename = "accessToken")]
    access_token: String,
    #[serde(rename = "expiresOn")]
    expires_on_local: Option<String>,
    /// Epoch seconds, only printed by newer CLI versions
    expires_on: Option<serde_json::Value>,
}

fn parse_az_output(stdout: &str) -> Result<AccessToken> {
    let token: AzCliToken =
        serde_json::from_str(stdout).context("AzureCliCredential: unexpected output from 'az'")?;

    let expires_on = token
        .expires_on
        .as_ref()
        .and_then(expiry_from_epoch)
        .or_else(|| token.expires_on_local.as_deref().and_then(parse_local_timestamp))
        .ok_or_else(|| anyhow::anyhow!("AzureCliCredential: token has no usable expiry"))?;

    Ok(AccessToken::new(token.access_token, expires_on))
}

/// Older `az` versions print expiry as a local timestamp like `2024-01-31 10:00:00.000000`
fn parse_local_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f").ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

/// Uses the account signed in with `az login`
#[derive(Debug, Clone, Default)]
pub struct AzureCliCredential {
    tenant_id: Option<String>,
}

impl AzureCliCredential {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tenant(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: Some(tenant_id.into()),
        }
    }

    fn args(&self, scopes: &[String]) -> Vec<String> {
        let mut args: Vec<String> = ["account", "get-access-token", "--output", "json", "--scope"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        args.extend(scopes.iter().cloned());
        if let Some(tenant_id) = &self.tenant_id {
            args.push("--tenant".to_string());
            args.push(tenant_id.clone());
        }
        args
    }
}

#[async_trait]
impl TokenCredential for AzureCliCredential {
    fn name(&self) -> &'static str {
        "AzureCliCredential"
    }

    async fn get_token(&self, scopes: &[String]) -> Result<AccessToken> {
        if scopes.is_empty() {
            anyhow::bail!("AzureCliCredential: no scope requested");
        }
        let stdout = run_tool(self.name(), "az", self.args(scopes)).await?;
        parse_az_output(&stdout)
    }
}

#[derive(Debug, Deserialize)]
struct AzdToken {
    token: String,
    #[serde(rename = "expiresOn")]
    expires_on: DateTime<Utc>,
}

fn parse_azd_output(stdout: &str) -> Result<AccessToken> {
    let token: AzdToken = serde_json::from_str(stdout)
        .context("AzureDeveloperCliCredential: unexpected output from 'azd'")?;
    Ok(AccessToken::new(token.token, token.expires_on))
}

/// Uses the account signed in with `azd auth login`
#[derive(Debug, Clone, Default)]
pub struct AzureDeveloperCliCredential {
    tenant_id: Option<String>,
}

impl AzureDeveloperCliCredential {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tenant(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: Some(tenant_id.into()),
        }
    }

    fn args(&self, scopes: &[String]) -> Vec<String> {
        let mut args: Vec<String> = ["auth", "token", "--output", "json", "--no-prompt"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        for scope in scopes {
            args.push("--scope".to_string());
            args.push(scope.clone());
        }
        if let Some(tenant_id) = &self.tenant_id {
            args.push("--tenant-id".to_string());
            args.push(tenant_id.clone());
        }
        args
    }
}

#[async_trait]
impl TokenCredential for AzureDeveloperCliCredential {
    fn name(&self) -> &'static str {
        "AzureDeveloperCliCredential"
    }

    async fn get_token(&self, scopes: &[String]) -> Result<AccessToken> {
        if scopes.is_empty() {
            anyhow::bail!("AzureDeveloperCliCredential: no scope requested");
        }
        let stdout = run_tool(self.name(), "azd", self.args(scopes)).await?;
        parse_azd_output(&stdout)
    }
}
