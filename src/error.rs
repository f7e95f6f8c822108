//! # Synthesis Errors
//!
//! Declaration-time failures. Anything that would only be detected by the
//! provisioning engine (quotas, permissions, missing images) is not modelled
//! here and surfaces when the template is deployed.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while declaring or rendering a stack
#[derive(Debug, Error)]
pub enum SynthError {
    /// Logical ID is not a valid CloudFormation identifier
    #[error("invalid logical id '{id}': {reason}")]
    InvalidLogicalId { id: String, reason: &'static str },

    /// Two resources (or outputs) were declared under the same logical ID
    #[error("duplicate logical id '{0}' in stack")]
    DuplicateLogicalId(String),

    /// A resource names another resource that has not been declared yet
    #[error("'{from}' references '{to}', which has not been declared before it")]
    UnresolvedReference { from: String, to: String },

    /// Explicit dependencies form a cycle
    #[error("dependency cycle detected among: {}", members.join(", "))]
    DependencyCycle { members: Vec<String> },

    /// No application secret identifier was supplied
    #[error("application secret ARN is required but was not provided")]
    MissingApplicationSecret,

    /// Secret ARN does not have the Secrets Manager shape
    #[error("invalid secret ARN '{arn}': {reason}")]
    InvalidSecretArn { arn: String, reason: String },

    /// Topology configuration cannot be turned into a resource graph
    #[error("invalid topology configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be parsed
    #[error("failed to parse topology configuration {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A `.env` file exists but could not be read or parsed
    #[error("failed to load environment file: {0}")]
    EnvFile(#[source] dotenvy::Error),

    #[error("failed to render template as JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to render template as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Reading configuration or writing the assembly failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SynthError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
