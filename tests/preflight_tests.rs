//! # Preflight Tests
//!
//! The preflight check against a fake probe; no AWS calls are made.

mod common;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use common::FAKE_SECRET_ARN;
use running_log_infrastructure::preflight::{
    run_preflight, CheckStatus, PreflightProbe, SecretDescription,
};
use std::sync::Mutex;

struct FakeProbe {
    account: Result<String, String>,
    secret: Option<SecretDescription>,
    described: Mutex<Vec<String>>,
}

impl FakeProbe {
    fn healthy() -> Self {
        Self {
            account: Ok("111122223333".to_string()),
            secret: Some(SecretDescription {
                arn: FAKE_SECRET_ARN.to_string(),
                name: "running-log/test".to_string(),
                deleted: false,
            }),
            described: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PreflightProbe for FakeProbe {
    async fn caller_account(&self) -> Result<String> {
        self.account.clone().map_err(|e| anyhow!(e))
    }

    async fn describe_secret(&self, arn: &str) -> Result<Option<SecretDescription>> {
        self.described.lock().unwrap().push(arn.to_string());
        Ok(self.secret.clone())
    }
}

#[tokio::test]
async fn test_all_checks_pass() {
    let probe = FakeProbe::healthy();
    let report = run_preflight(&probe, Some(FAKE_SECRET_ARN)).await;

    assert!(report.passed(), "{report}");
    assert_eq!(report.checks.len(), 5);
    assert_eq!(report.status_of("account-match"), Some(CheckStatus::Pass));
    assert_eq!(*probe.described.lock().unwrap(), vec![FAKE_SECRET_ARN.to_string()]);
}

#[tokio::test]
async fn test_missing_secret_configuration_stops_early() {
    let probe = FakeProbe::healthy();
    let report = run_preflight(&probe, None).await;

    assert!(!report.passed());
    assert_eq!(report.checks.len(), 1);
    assert_eq!(report.status_of("secret-configured"), Some(CheckStatus::Fail));
    assert!(probe.described.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_arn_is_reported() {
    let probe = FakeProbe::healthy();
    let report = run_preflight(&probe, Some("running-log/flask")).await;

    assert_eq!(report.status_of("secret-configured"), Some(CheckStatus::Pass));
    assert_eq!(report.status_of("secret-arn"), Some(CheckStatus::Fail));
    assert_eq!(report.status_of("secret-exists"), None);
}

#[tokio::test]
async fn test_cross_account_secret_is_flagged() {
    let mut probe = FakeProbe::healthy();
    probe.account = Ok("999988887777".to_string());
    let report = run_preflight(&probe, Some(FAKE_SECRET_ARN)).await;

    assert!(!report.passed());
    assert_eq!(report.status_of("account-match"), Some(CheckStatus::Fail));
    assert_eq!(report.status_of("secret-exists"), Some(CheckStatus::Pass));
}

#[tokio::test]
async fn test_unknown_caller_skips_account_match() {
    let mut probe = FakeProbe::healthy();
    probe.account = Err("ExpiredToken: the security token included in the request is expired".to_string());
    let report = run_preflight(&probe, Some(FAKE_SECRET_ARN)).await;

    assert_eq!(report.status_of("caller-identity"), Some(CheckStatus::Fail));
    assert_eq!(report.status_of("account-match"), Some(CheckStatus::Skipped));
    assert!(report.to_string().contains("ExpiredToken"));
}

#[tokio::test]
async fn test_deleted_and_absent_secrets_fail() {
    let mut probe = FakeProbe::healthy();
    if let Some(secret) = probe.secret.as_mut() {
        secret.deleted = true;
    }
    let report = run_preflight(&probe, Some(FAKE_SECRET_ARN)).await;
    assert_eq!(report.status_of("secret-exists"), Some(CheckStatus::Fail));
    assert!(report.to_string().contains("scheduled for deletion"));

    probe.secret = None;
    let report = run_preflight(&probe, Some(FAKE_SECRET_ARN)).await;
    assert_eq!(report.status_of("secret-exists"), Some(CheckStatus::Fail));
    assert!(report.to_string().contains("not found"));
}
