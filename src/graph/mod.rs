//! # Resource Graph
//!
//! A [`Stack`] is the in-memory graph built by one synthesis pass.
//!
//! ## Rules
//!
//! - Logical IDs are unique within the stack (resources and outputs share no
//!   namespace in CloudFormation, but outputs must be unique among themselves)
//! - A resource may only reference resources declared before it
//! - Explicit edges added afterwards with [`Stack::add_dependency`] are the
//!   only way to introduce a cycle, which [`Stack::dependency_order`] reports

pub mod intrinsic;
mod logical_id;
mod order;
mod resource;

pub use logical_id::LogicalId;
pub use resource::{Output, Resource, RetentionPolicy};

use crate::error::SynthError;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Declared resources of one deployment unit, in declaration order
#[derive(Debug, Clone, Default)]
pub struct Stack {
    name: String,
    description: Option<String>,
    entries: Vec<(LogicalId, Resource)>,
    index: HashMap<LogicalId, usize>,
    outputs: BTreeMap<String, Output>,
}

impl Stack {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Declare a resource
    ///
    /// Fails on a duplicate ID or on any reference to an ID that is not
    /// already part of the stack.
    pub fn add(&mut self, id: LogicalId, resource: Resource) -> Result<LogicalId, SynthError> {
        if self.index.contains_key(&id) {
            return Err(SynthError::DuplicateLogicalId(id.to_string()));
        }
        for target in resource.references() {
            if !self.contains_name(&target) {
                return Err(SynthError::UnresolvedReference {
                    from: id.to_string(),
                    to: target,
                });
            }
        }

        debug!(
            logical_id = %id,
            resource_type = %resource.resource_type,
            "Declared resource"
        );
        self.index.insert(id.clone(), self.entries.len());
        self.entries.push((id.clone(), resource));
        Ok(id)
    }

    /// Make `from` wait for `to`, both already declared
    pub fn add_dependency(&mut self, from: &LogicalId, to: &LogicalId) -> Result<(), SynthError> {
        if !self.index.contains_key(to) {
            return Err(SynthError::UnresolvedReference {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        let Some(&position) = self.index.get(from) else {
            return Err(SynthError::UnresolvedReference {
                from: to.to_string(),
                to: from.to_string(),
            });
        };
        let resource = &mut self.entries[position].1;
        if !resource.depends_on.contains(to) {
            resource.depends_on.push(to.clone());
        }
        Ok(())
    }

    /// Declare a stack output; it may only reference declared resources
    pub fn add_output(&mut self, name: &LogicalId, output: Output) -> Result<(), SynthError> {
        if self.outputs.contains_key(name.as_str()) {
            return Err(SynthError::DuplicateLogicalId(name.to_string()));
        }
        for target in output.references() {
            if !self.contains_name(&target) {
                return Err(SynthError::UnresolvedReference {
                    from: name.to_string(),
                    to: target,
                });
            }
        }
        self.outputs.insert(name.to_string(), output);
        Ok(())
    }

    pub fn get(&self, id: &LogicalId) -> Option<&Resource> {
        self.index.get(id).map(|&i| &self.entries[i].1)
    }

    pub fn contains(&self, id: &LogicalId) -> bool {
        self.index.contains_key(id)
    }

    fn contains_name(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Resources in declaration order
    pub fn resources(&self) -> impl Iterator<Item = (&LogicalId, &Resource)> {
        self.entries.iter().map(|(id, resource)| (id, resource))
    }

    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = (&'a LogicalId, &'a Resource)> + 'a {
        self.resources()
            .filter(move |(_, resource)| resource.resource_type == resource_type)
    }

    pub fn outputs(&self) -> &BTreeMap<String, Output> {
        &self.outputs
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// IDs the given resource depends on
    pub fn references_of(&self, id: &LogicalId) -> BTreeSet<String> {
        self.get(id).map(Resource::references).unwrap_or_default()
    }

    /// Provisioning order: every resource after everything it depends on
    ///
    /// Ties are broken by declaration order, so a stack without explicit edges
    /// comes back exactly as declared.
    pub fn dependency_order(&self) -> Result<Vec<&LogicalId>, SynthError> {
        let edges: Vec<Vec<usize>> = self
            .entries
            .iter()
            .map(|(_, resource)| {
                resource
                    .references()
                    .iter()
                    .filter_map(|name| self.index.get(name.as_str()).copied())
                    .collect()
            })
            .collect();

        order::topological(&edges)
            .map(|positions| positions.into_iter().map(|i| &self.entries[i].0).collect())
            .map_err(|members| SynthError::DependencyCycle {
                members: members
                    .into_iter()
                    .map(|i| self.entries[i].0.to_string())
                    .collect(),
            })
    }
}
