//! Common test utilities for topology tests
//!
//! Provides topology fixtures with a substitute application secret and graph
//! assertions shared across test files.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use running_log_infrastructure::prelude::*;
use serde_json::Value;
use std::collections::BTreeSet;

/// Application secret used instead of the production one
pub const FAKE_SECRET_ARN: &str =
    "arn:aws:secretsmanager:eu-west-1:111122223333:secret:running-log/test-AbCdEf";

pub fn with_fake_secret(profile: Profile) -> TopologyConfig {
    let mut topology = profile.topology();
    topology.application_secret_arn = Some(FAKE_SECRET_ARN.to_string());
    topology
}

pub fn build(profile: Profile) -> Topology {
    build_stack("running-log-test", &with_fake_secret(profile)).expect("topology should build")
}

/// Every reference points at a resource declared earlier
pub fn assert_references_point_backwards(stack: &Stack) {
    let mut declared = BTreeSet::new();
    for (id, resource) in stack.resources() {
        for target in resource.references() {
            assert!(
                declared.contains(&target),
                "{id} references {target}, which is not declared before it"
            );
        }
        declared.insert(id.to_string());
    }
    for (name, output) in stack.outputs() {
        for target in output.references() {
            assert!(declared.contains(&target), "output {name} references {target}");
        }
    }
}

/// Logical IDs named by `Ref` entries of a JSON array
pub fn refs_in(list: &Value) -> Vec<String> {
    list.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("Ref").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Container secret entries as (name, ValueFrom)
pub fn container_secrets(topology: &Topology) -> Vec<(String, Value)> {
    let task = topology
        .stack
        .get(&topology.service.task_definition)
        .expect("task definition declared");
    task.get("ContainerDefinitions").expect("containers")[0]["Secrets"]
        .as_array()
        .expect("secrets array")
        .iter()
        .map(|entry| {
            (
                entry["Name"].as_str().unwrap_or_default().to_string(),
                entry["ValueFrom"].clone(),
            )
        })
        .collect()
}
