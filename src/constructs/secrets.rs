//! # Secret References
//!
//! Two kinds of secret reach the service: the database credential, generated
//! and owned by the database layer, and the application secret, owned outside
//! this stack and referenced by ARN only. Neither value is ever read here.

use crate::arn::SecretArn;
use crate::error::SynthError;
use crate::graph::intrinsic::reference;
use crate::graph::LogicalId;
use serde_json::{json, Value};

/// A reference to a secret, never its value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretRef {
    /// Declared in this stack; `id` resolves (via `Ref`) to the secret ARN
    Generated { id: LogicalId },
    /// Owned externally and referenced verbatim
    Imported { arn: String },
}

impl SecretRef {
    /// `ValueFrom` of a container secret entry
    pub fn value_from(&self) -> Value {
        match self {
            SecretRef::Generated { id } => reference(id),
            SecretRef::Imported { arn } => json!(arn),
        }
    }

    /// `Resource` entry granting read access in an IAM policy
    ///
    /// Partial ARNs (no random suffix) match every version of the name.
    pub fn policy_resource(&self) -> Value {
        match self {
            SecretRef::Generated { id } => reference(id),
            SecretRef::Imported { arn } => match SecretArn::parse(arn) {
                Ok(parsed) if !parsed.is_complete() => json!(format!("{arn}-??????")),
                _ => json!(arn),
            },
        }
    }

    /// The logical ID this reference depends on, if it lives in the stack
    pub fn logical_id(&self) -> Option<&LogicalId> {
        match self {
            SecretRef::Generated { id } => Some(id),
            SecretRef::Imported { .. } => None,
        }
    }
}

/// Reference the externally owned application secret
///
/// The ARN is required but accepted opaquely: whether it exists, and whether
/// the task may read it, is only known at deployment.
pub fn import_application_secret(arn: Option<&str>) -> Result<SecretRef, SynthError> {
    match arn.map(str::trim) {
        Some(arn) if !arn.is_empty() => Ok(SecretRef::Imported {
            arn: arn.to_string(),
        }),
        _ => Err(SynthError::MissingApplicationSecret),
    }
}
