//! # Compute Cluster

use crate::error::SynthError;
use crate::graph::{LogicalId, Resource, Stack};
use serde_json::json;
use tracing::info;

/// ECS cluster bound to the VPC its services run in
#[derive(Debug, Clone)]
pub struct EcsCluster {
    pub id: LogicalId,
    pub name: String,
    /// VPC whose subnets host the cluster's tasks
    pub vpc: LogicalId,
}

pub fn declare_cluster(
    stack: &mut Stack,
    prefix: &str,
    name: &str,
    vpc: &LogicalId,
) -> Result<EcsCluster, SynthError> {
    if name.trim().is_empty() {
        return Err(SynthError::InvalidConfig(
            "service.clusterName must not be empty".to_string(),
        ));
    }
    let id = stack.add(
        LogicalId::new(format!("{prefix}Cluster"))?,
        Resource::new("AWS::ECS::Cluster").property("ClusterName", json!(name)),
    )?;
    info!(cluster = %id, name, "Declared compute cluster");
    Ok(EcsCluster {
        id,
        name: name.to_string(),
        vpc: vpc.clone(),
    })
}
