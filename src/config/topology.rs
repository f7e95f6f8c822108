//! # Topology Configuration
//!
//! Every variation point of the deployment: network layout, database backend,
//! service capacity and the application secret identifier.
//!
//! Numeric sizing values are capacity hints passed through verbatim to the
//! provisioning engine; nothing here interprets them.
//!
//! ## Example
//!
//! ```yaml
//! network:
//!   maxAzs: 2
//!   natGateways: 0
//!   subnets:
//!     - name: Public
//!       subnetType: public
//! database:
//!   kind: instance
//!   engineVersion: "5.7.28"
//!   instanceType: t3.micro
//!   masterUsername: erin
//! service:
//!   cpu: 256
//!   memoryLimitMib: 1024
//!   desiredCount: 2
//! applicationSecretArn: arn:aws:secretsmanager:us-east-2:412703736941:secret:running-log/flask-6NPAP2
//! ```

use crate::constants::{
    APP_NAME, CONSTRUCT_PREFIX, DEFAULT_ALLOCATED_STORAGE_GIB, DEFAULT_IMAGE_TAG,
    DEFAULT_VPC_CIDR, HTTP_PORT, MYSQL_PORT,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Complete description of one deployment
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TopologyConfig {
    /// Prefix of every logical ID in the stack (alphanumeric)
    #[serde(default = "default_construct_prefix")]
    pub construct_prefix: String,
    /// Template description
    #[serde(default)]
    pub description: Option<String>,
    pub network: NetworkConfig,
    /// Database backend: single instance or replicated cluster
    pub database: DatabaseBackend,
    pub service: ServiceConfig,
    /// ARN of the externally owned application secret (injected as FLASK_SECRET)
    /// Required: synthesis fails when it is absent or blank
    #[serde(default)]
    pub application_secret_arn: Option<String>,
}

/// VPC layout
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NetworkConfig {
    /// IPv4 address space of the VPC
    #[serde(default = "default_vpc_cidr")]
    pub cidr: String,
    /// Number of availability zones to spread subnets over
    pub max_azs: u32,
    /// NAT gateways for private subnets
    /// When omitted, one per availability zone is provisioned, but only if a
    /// private subnet group exists
    #[serde(default)]
    pub nat_gateways: Option<u32>,
    /// Subnet groups; one subnet per group per availability zone
    #[serde(default = "default_subnet_groups")]
    pub subnets: Vec<SubnetGroup>,
}

/// A subnet group, instantiated once per availability zone
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SubnetGroup {
    /// Group name, used in logical IDs (alphanumeric)
    pub name: String,
    pub subnet_type: SubnetType,
    /// Prefix length of each subnet; by default the VPC space is split evenly
    #[serde(default)]
    pub cidr_mask: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum SubnetType {
    /// Routed to the internet gateway; instances get public addresses
    Public,
    /// Egress through a NAT gateway, when one exists
    Private,
}

/// Database backend variant
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum DatabaseBackend {
    /// Single-instance relational database
    Instance(InstanceConfig),
    /// Replicated database cluster
    Cluster(ClusterConfig),
}

impl DatabaseBackend {
    pub fn port(&self) -> u16 {
        match self {
            DatabaseBackend::Instance(instance) => instance.port,
            DatabaseBackend::Cluster(cluster) => cluster.port,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DatabaseBackend::Instance(_) => "instance",
            DatabaseBackend::Cluster(_) => "cluster",
        }
    }
}

/// Single-instance database settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InstanceConfig {
    #[serde(default = "default_instance_engine")]
    pub engine: String,
    pub engine_version: String,
    /// EC2-style instance type (e.g., "t3.micro"); rendered as "db.t3.micro"
    pub instance_type: String,
    #[serde(default = "default_allocated_storage")]
    pub allocated_storage_gib: u32,
    /// Master username; the provider default is used when omitted
    #[serde(default)]
    pub master_username: Option<String>,
    #[serde(default)]
    pub deletion_protection: bool,
    #[serde(default = "default_mysql_port")]
    pub port: u16,
}

/// Replicated cluster settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClusterConfig {
    #[serde(default = "default_cluster_engine")]
    pub engine: String,
    pub engine_version: String,
    /// Instance type of every cluster member (e.g., "t3.small")
    pub instance_type: String,
    /// Number of cluster members
    pub instances: u32,
    /// Existing DB cluster parameter group name
    #[serde(default)]
    pub parameter_group: Option<String>,
    #[serde(default)]
    pub master_username: Option<String>,
    #[serde(default)]
    pub deletion_protection: bool,
    #[serde(default = "default_mysql_port")]
    pub port: u16,
}

/// Load-balanced container service settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServiceConfig {
    /// ECS cluster name
    #[serde(default = "default_app_name")]
    pub cluster_name: String,
    #[serde(default = "default_app_name")]
    pub container_name: String,
    /// Existing ECR repository holding the application image
    #[serde(default = "default_app_name")]
    pub repository_name: String,
    #[serde(default = "default_image_tag")]
    pub image_tag: String,
    #[serde(default = "default_http_port")]
    pub container_port: u16,
    /// Fargate CPU units per task
    pub cpu: u32,
    /// Fargate memory per task (MiB)
    pub memory_limit_mib: u32,
    /// Number of tasks kept running
    pub desired_count: u32,
    #[serde(default = "default_true")]
    pub public_load_balancer: bool,
    #[serde(default = "default_true")]
    pub assign_public_ip: bool,
    #[serde(default = "default_http_port")]
    pub listener_port: u16,
}

fn default_app_name() -> String {
    APP_NAME.to_string()
}

fn default_construct_prefix() -> String {
    CONSTRUCT_PREFIX.to_string()
}

fn default_vpc_cidr() -> String {
    DEFAULT_VPC_CIDR.to_string()
}

pub(crate) fn default_subnet_groups() -> Vec<SubnetGroup> {
    vec![SubnetGroup {
        name: "Public".to_string(),
        subnet_type: SubnetType::Public,
        cidr_mask: None,
    }]
}

fn default_instance_engine() -> String {
    "mysql".to_string()
}

fn default_cluster_engine() -> String {
    "aurora-mysql".to_string()
}

fn default_allocated_storage() -> u32 {
    DEFAULT_ALLOCATED_STORAGE_GIB
}

fn default_mysql_port() -> u16 {
    MYSQL_PORT
}

fn default_image_tag() -> String {
    DEFAULT_IMAGE_TAG.to_string()
}

fn default_http_port() -> u16 {
    HTTP_PORT
}

fn default_true() -> bool {
    true
}
