//! # Resource Descriptors
//!
//! A resource is a configuration record submitted to the provisioning engine:
//! a type name, a property tree, and optional ordering/retention attributes.

use super::intrinsic::collect_references;
use super::LogicalId;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Retention policy applied when a resource is deleted or replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RetentionPolicy {
    Delete,
    Retain,
    Snapshot,
}

/// A single `Resources` entry of a CloudFormation template
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resource {
    #[serde(rename = "Type")]
    pub resource_type: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<LogicalId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_replace_policy: Option<RetentionPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<RetentionPolicy>,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            properties: Map::new(),
            depends_on: Vec::new(),
            update_replace_policy: None,
            deletion_policy: None,
        }
    }

    /// Set a property
    pub fn property(mut self, name: &str, value: Value) -> Self {
        self.properties.insert(name.to_string(), value);
        self
    }

    /// Add an explicit ordering dependency
    pub fn depends_on(mut self, id: &LogicalId) -> Self {
        if !self.depends_on.contains(id) {
            self.depends_on.push(id.clone());
        }
        self
    }

    /// Apply the same policy on update-replace and delete
    pub fn retention(mut self, policy: RetentionPolicy) -> Self {
        self.update_replace_policy = Some(policy);
        self.deletion_policy = Some(policy);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Every logical ID this resource needs, via properties or `DependsOn`
    pub fn references(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for value in self.properties.values() {
            collect_references(value, &mut out);
        }
        out.extend(self.depends_on.iter().map(ToString::to_string));
        out
    }
}

/// A stack output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Output {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn references(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        collect_references(&self.value, &mut out);
        out
    }
}
