//! # Logical IDs
//!
//! CloudFormation logical IDs: alphanumeric (A-Za-z0-9), 1-255 characters,
//! unique within a template.

use crate::constants::MAX_LOGICAL_ID_LEN;
use crate::error::SynthError;
use serde::Serialize;
use std::borrow::Borrow;
use std::fmt;

/// Validated CloudFormation logical ID
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct LogicalId(String);

impl LogicalId {
    /// Validate and wrap a logical ID
    pub fn new(id: impl Into<String>) -> Result<Self, SynthError> {
        let id = id.into();
        if id.is_empty() {
            return Err(SynthError::InvalidLogicalId {
                id,
                reason: "must not be empty",
            });
        }
        if id.len() > MAX_LOGICAL_ID_LEN {
            return Err(SynthError::InvalidLogicalId {
                id,
                reason: "exceeds 255 characters",
            });
        }
        if !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(SynthError::InvalidLogicalId {
                id,
                reason: "must contain only alphanumeric characters",
            });
        }
        Ok(Self(id))
    }

    /// Derive a child ID by appending a suffix, the way nested constructs are named
    pub fn child(&self, suffix: &str) -> Result<Self, SynthError> {
        Self::new(format!("{}{suffix}", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LogicalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for LogicalId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
