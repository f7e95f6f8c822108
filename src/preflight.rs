//! # Preflight Check
//!
//! Optional operator tool run before a deployment: asks AWS whether the
//! externally owned application secret exists and whether it lives in the
//! caller's account. Findings are reported as they are; nothing is created,
//! retried or repaired, and synthesis never depends on this module.

use crate::arn::SecretArn;
use crate::constructs::import_application_secret;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use std::fmt;
use tracing::{debug, info, warn};

/// What Secrets Manager reports about a secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretDescription {
    pub arn: String,
    pub name: String,
    /// Scheduled for deletion
    pub deleted: bool,
}

/// Read-only questions the preflight check asks the cloud provider
#[async_trait]
pub trait PreflightProbe: Send + Sync {
    /// Account ID of the credentials in use
    async fn caller_account(&self) -> Result<String>;

    /// Describe a secret by ARN; `None` when it does not exist
    async fn describe_secret(&self, arn: &str) -> Result<Option<SecretDescription>>;
}

/// Probe backed by the AWS SDK default credential chain
#[derive(Debug, Clone)]
pub struct AwsPreflight {
    secrets: aws_sdk_secretsmanager::Client,
    sts: aws_sdk_sts::Client,
}

impl AwsPreflight {
    /// Build clients for `region`, or the environment's default region
    pub async fn new(region: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        let sdk_config = loader.load().await;
        Self {
            secrets: aws_sdk_secretsmanager::Client::new(&sdk_config),
            sts: aws_sdk_sts::Client::new(&sdk_config),
        }
    }
}

#[async_trait]
impl PreflightProbe for AwsPreflight {
    async fn caller_account(&self) -> Result<String> {
        let output = self.sts.get_caller_identity().send().await.map_err(|e| {
            anyhow!(
                "GetCallerIdentity failed: {}",
                aws_sdk_sts::error::DisplayErrorContext(&e)
            )
        })?;
        output
            .account()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("GetCallerIdentity returned no account"))
    }

    async fn describe_secret(&self, arn: &str) -> Result<Option<SecretDescription>> {
        debug!(secret = arn, "Describing secret");
        match self.secrets.describe_secret().secret_id(arn).send().await {
            Ok(output) => Ok(Some(SecretDescription {
                arn: output.arn().unwrap_or(arn).to_string(),
                name: output.name().unwrap_or_default().to_string(),
                deleted: output.deleted_date().is_some(),
            })),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_resource_not_found_exception() {
                    Ok(None)
                } else {
                    Err(anyhow!(
                        "DescribeSecret failed for {arn}: {}",
                        aws_sdk_secretsmanager::error::DisplayErrorContext(&service_error)
                    ))
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Fail,
    /// Not run because an earlier check failed
    Skipped,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CheckStatus::Pass => "PASS",
            CheckStatus::Fail => "FAIL",
            CheckStatus::Skipped => "SKIP",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub name: &'static str,
    pub status: CheckStatus,
    pub detail: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreflightReport {
    pub checks: Vec<CheckResult>,
}

impl PreflightReport {
    fn record(&mut self, name: &'static str, status: CheckStatus, detail: impl Into<String>) {
        let detail = detail.into();
        match status {
            CheckStatus::Pass => info!(check = name, %detail, "Preflight check passed"),
            CheckStatus::Fail => warn!(check = name, %detail, "Preflight check failed"),
            CheckStatus::Skipped => debug!(check = name, %detail, "Preflight check skipped"),
        }
        self.checks.push(CheckResult {
            name,
            status,
            detail,
        });
    }

    /// True when no check failed
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.status != CheckStatus::Fail)
    }

    pub fn status_of(&self, name: &str) -> Option<CheckStatus> {
        self.checks.iter().find(|c| c.name == name).map(|c| c.status)
    }
}

impl fmt::Display for PreflightReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for check in &self.checks {
            writeln!(f, "[{}] {}: {}", check.status, check.name, check.detail)?;
        }
        Ok(())
    }
}

/// Check the application secret named by `arn`
pub async fn run_preflight(probe: &dyn PreflightProbe, arn: Option<&str>) -> PreflightReport {
    let mut report = PreflightReport::default();

    let arn = match import_application_secret(arn) {
        Ok(_) => arn.map(str::trim).unwrap_or_default(),
        Err(e) => {
            report.record("secret-configured", CheckStatus::Fail, e.to_string());
            return report;
        }
    };
    report.record("secret-configured", CheckStatus::Pass, arn);

    let parsed = match SecretArn::parse(arn) {
        Ok(parsed) => parsed,
        Err(e) => {
            report.record("secret-arn", CheckStatus::Fail, e.to_string());
            return report;
        }
    };
    report.record(
        "secret-arn",
        CheckStatus::Pass,
        format!("region {} account {}", parsed.region, parsed.account_id),
    );

    match probe.caller_account().await {
        Ok(account) => {
            report.record("caller-identity", CheckStatus::Pass, account.clone());
            if account == parsed.account_id {
                report.record("account-match", CheckStatus::Pass, account);
            } else {
                report.record(
                    "account-match",
                    CheckStatus::Fail,
                    format!(
                        "secret is owned by {} but the caller is {account}",
                        parsed.account_id
                    ),
                );
            }
        }
        Err(e) => {
            report.record("caller-identity", CheckStatus::Fail, format!("{e:#}"));
            report.record("account-match", CheckStatus::Skipped, "caller unknown");
        }
    }

    match probe.describe_secret(arn).await {
        Ok(Some(secret)) if secret.deleted => report.record(
            "secret-exists",
            CheckStatus::Fail,
            format!("{} is scheduled for deletion", secret.name),
        ),
        Ok(Some(secret)) => report.record("secret-exists", CheckStatus::Pass, secret.arn),
        Ok(None) => report.record("secret-exists", CheckStatus::Fail, format!("{arn} not found")),
        Err(e) => report.record("secret-exists", CheckStatus::Fail, format!("{e:#}")),
    }

    report
}
