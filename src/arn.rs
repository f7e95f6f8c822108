//! # Secret ARNs
//!
//! Parses Secrets Manager ARNs into their components. Synthesis accepts the
//! application secret identifier opaquely; this parser is used where the
//! components matter (the preflight check needs the region and account).

use crate::error::SynthError;
use regex::Regex;
use std::fmt;

/// Components of `arn:<partition>:secretsmanager:<region>:<account>:secret:<name>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretArn {
    pub partition: String,
    pub region: String,
    pub account_id: String,
    /// Secret name including the random six-character suffix, when present
    pub name: String,
}

impl SecretArn {
    /// Parse a Secrets Manager ARN
    /// Reference: https://docs.aws.amazon.com/secretsmanager/latest/userguide/reference_iam-permissions.html#iam-resources
    pub fn parse(arn: &str) -> Result<Self, SynthError> {
        let arn = arn.trim();
        if arn.is_empty() {
            return Err(SynthError::MissingApplicationSecret);
        }

        let arn_regex = Regex::new(
            r"^arn:(aws[a-z-]*):secretsmanager:([a-z]{2}(?:-[a-z]+)+-\d+):(\d{12}):secret:([A-Za-z0-9/_+=.@-]+)$",
        )
        .map_err(|e| SynthError::InvalidSecretArn {
            arn: arn.to_string(),
            reason: format!("failed to compile regex: {e}"),
        })?;

        let captures = arn_regex
            .captures(arn)
            .ok_or_else(|| SynthError::InvalidSecretArn {
                arn: arn.to_string(),
                reason: "expected arn:<partition>:secretsmanager:<region>:<account>:secret:<name>"
                    .to_string(),
            })?;

        Ok(Self {
            partition: captures[1].to_string(),
            region: captures[2].to_string(),
            account_id: captures[3].to_string(),
            name: captures[4].to_string(),
        })
    }

    /// Whether the name carries the six-character suffix Secrets Manager appends
    ///
    /// Partial ARNs (no suffix) need a `-??????` wildcard in IAM policies.
    pub fn is_complete(&self) -> bool {
        self.name
            .rsplit_once('-')
            .is_some_and(|(_, suffix)| {
                suffix.len() == 6 && suffix.chars().all(|c| c.is_ascii_alphanumeric())
            })
    }
}

impl fmt::Display for SecretArn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arn:{}:secretsmanager:{}:{}:secret:{}",
            self.partition, self.region, self.account_id, self.name
        )
    }
}
