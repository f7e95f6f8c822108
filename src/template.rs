//! # Template Synthesis
//!
//! Renders a [`Stack`] as a CloudFormation template and writes cloud
//! assemblies (a directory holding the template and a manifest describing it).
//!
//! A template is only produced from a graph that passes
//! [`Stack::dependency_order`], so a cyclic stack never reaches disk or stdout.

use crate::constants::{MAX_STACK_NAME_LEN, TEMPLATE_FORMAT_VERSION};
use crate::error::SynthError;
use crate::graph::{Output, Resource, Stack};
use clap::ValueEnum;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name recorded as the template generator
pub const GENERATOR: &str = env!("CARGO_PKG_NAME");

/// Rendering format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Generator {
    pub name: &'static str,
    pub version: &'static str,
    pub git_hash: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateMetadata {
    #[serde(rename = "Generator")]
    pub generator: Generator,
}

/// A CloudFormation template
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Template<'a> {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: &'static str,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    #[serde(rename = "Metadata")]
    pub metadata: TemplateMetadata,
    #[serde(rename = "Resources")]
    pub resources: BTreeMap<&'a str, &'a Resource>,
    #[serde(rename = "Outputs", skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<&'a str, &'a Output>,
}

impl<'a> Template<'a> {
    /// Validate the graph and build the template
    pub fn from_stack(stack: &'a Stack) -> Result<Self, SynthError> {
        let order = stack.dependency_order()?;
        debug!(stack = stack.name(), resources = order.len(), "Dependency order resolved");

        Ok(Self {
            format_version: TEMPLATE_FORMAT_VERSION,
            description: stack.description(),
            metadata: TemplateMetadata {
                generator: Generator {
                    name: GENERATOR,
                    version: env!("CARGO_PKG_VERSION"),
                    git_hash: env!("BUILD_GIT_HASH"),
                },
            },
            resources: stack
                .resources()
                .map(|(id, resource)| (id.as_str(), resource))
                .collect(),
            outputs: stack
                .outputs()
                .iter()
                .map(|(name, output)| (name.as_str(), output))
                .collect(),
        })
    }

    pub fn to_json(&self) -> Result<String, SynthError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml(&self) -> Result<String, SynthError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn render(&self, format: OutputFormat) -> Result<String, SynthError> {
        match format {
            OutputFormat::Json => self.to_json(),
            OutputFormat::Yaml => self.to_yaml(),
        }
    }
}

/// One stack entry of `manifest.json`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub stack_name: String,
    pub template_file: String,
    pub resource_count: usize,
    /// Hex SHA-256 of the template file contents
    pub template_sha256: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub version: &'static str,
    pub generator: &'static str,
    pub stacks: Vec<ManifestEntry>,
}

/// Check a stack name against the CloudFormation naming rule
///
/// A letter followed by letters, digits or hyphens, at most 128 characters.
/// Names that pass can be used as file names without leaving the directory.
pub fn validate_stack_name(name: &str) -> Result<(), SynthError> {
    let mut chars = name.chars();
    let valid = name.len() <= MAX_STACK_NAME_LEN
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(SynthError::InvalidConfig(format!(
            "invalid stack name '{name}': must start with a letter and contain only letters, digits and hyphens (max {MAX_STACK_NAME_LEN})"
        )))
    }
}

/// Write `<stack>.template.json` and `manifest.json` into `dir`
///
/// The directory is created when missing. Returns the template path.
pub fn write_assembly(dir: &Path, stack: &Stack) -> Result<PathBuf, SynthError> {
    validate_stack_name(stack.name())?;
    let template = Template::from_stack(stack)?;
    let body = template.to_json()?;

    fs::create_dir_all(dir).map_err(|e| SynthError::io(dir, e))?;

    let template_file = format!("{}.template.json", stack.name());
    let template_path = dir.join(&template_file);
    fs::write(&template_path, &body).map_err(|e| SynthError::io(&template_path, e))?;

    let manifest = Manifest {
        version: env!("CARGO_PKG_VERSION"),
        generator: GENERATOR,
        stacks: vec![ManifestEntry {
            stack_name: stack.name().to_string(),
            template_file,
            resource_count: stack.len(),
            template_sha256: format!("{:x}", Sha256::digest(body.as_bytes())),
        }],
    };
    let manifest_path = dir.join("manifest.json");
    fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)
        .map_err(|e| SynthError::io(&manifest_path, e))?;

    info!(
        path = %template_path.display(),
        resources = stack.len(),
        "Wrote cloud assembly"
    );
    Ok(template_path)
}
