//! # Built-in Profiles
//!
//! The two capacity profiles the application is deployed with. They differ in
//! database backend and also in availability-zone count, NAT gateway policy and
//! master username handling; each of those is spelled out below rather than
//! left implicit.

use super::topology::{
    default_subnet_groups, ClusterConfig, DatabaseBackend, InstanceConfig, NetworkConfig,
    ServiceConfig, TopologyConfig,
};
use crate::constants::{
    APP_NAME, CONSTRUCT_PREFIX, DEFAULT_ALLOCATED_STORAGE_GIB, DEFAULT_IMAGE_TAG,
    DEFAULT_VPC_CIDR, FLASK_SECRET_ARN, HTTP_PORT, MYSQL_PORT,
};
use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named deployment profile
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema, ValueEnum,
)]
#[serde(rename_all = "camelCase")]
pub enum Profile {
    /// Single MySQL instance, 2 AZs, no NAT, 2 × (256 CPU / 1024 MiB) tasks
    #[default]
    Instance,
    /// Aurora MySQL cluster, 3 AZs, default NAT policy, 1 × (512 CPU / 2048 MiB) task
    Cluster,
}

impl Profile {
    pub fn as_str(self) -> &'static str {
        match self {
            Profile::Instance => "instance",
            Profile::Cluster => "cluster",
        }
    }

    /// Full topology for this profile
    pub fn topology(self) -> TopologyConfig {
        match self {
            Profile::Instance => instance_topology(),
            Profile::Cluster => cluster_topology(),
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "instance" => Ok(Profile::Instance),
            "cluster" => Ok(Profile::Cluster),
            other => Err(format!(
                "unknown profile '{other}' (expected 'instance' or 'cluster')"
            )),
        }
    }
}

fn service(cpu: u32, memory_limit_mib: u32, desired_count: u32) -> ServiceConfig {
    ServiceConfig {
        cluster_name: APP_NAME.to_string(),
        container_name: APP_NAME.to_string(),
        repository_name: APP_NAME.to_string(),
        image_tag: DEFAULT_IMAGE_TAG.to_string(),
        container_port: HTTP_PORT,
        cpu,
        memory_limit_mib,
        desired_count,
        public_load_balancer: true,
        assign_public_ip: true,
        listener_port: HTTP_PORT,
    }
}

fn instance_topology() -> TopologyConfig {
    TopologyConfig {
        construct_prefix: CONSTRUCT_PREFIX.to_string(),
        description: Some("running-log: MySQL instance backed Fargate service".to_string()),
        network: NetworkConfig {
            cidr: DEFAULT_VPC_CIDR.to_string(),
            max_azs: 2,
            // NAT gateways are billed per AZ per hour; this profile has no private subnets
            nat_gateways: Some(0),
            subnets: default_subnet_groups(),
        },
        database: DatabaseBackend::Instance(InstanceConfig {
            engine: "mysql".to_string(),
            engine_version: "5.7.28".to_string(),
            instance_type: "t3.micro".to_string(),
            allocated_storage_gib: DEFAULT_ALLOCATED_STORAGE_GIB,
            master_username: Some("erin".to_string()),
            deletion_protection: false,
            port: MYSQL_PORT,
        }),
        service: service(256, 1024, 2),
        application_secret_arn: Some(FLASK_SECRET_ARN.to_string()),
    }
}

fn cluster_topology() -> TopologyConfig {
    TopologyConfig {
        construct_prefix: CONSTRUCT_PREFIX.to_string(),
        description: Some("running-log: Aurora MySQL cluster backed Fargate service".to_string()),
        network: NetworkConfig {
            cidr: DEFAULT_VPC_CIDR.to_string(),
            max_azs: 3,
            nat_gateways: None,
            subnets: default_subnet_groups(),
        },
        database: DatabaseBackend::Cluster(ClusterConfig {
            engine: "aurora-mysql".to_string(),
            engine_version: "5.7.mysql_aurora.2.07.2".to_string(),
            instance_type: "t3.small".to_string(),
            instances: 1,
            parameter_group: Some("default.aurora-mysql5.7".to_string()),
            master_username: None,
            deletion_protection: false,
            port: MYSQL_PORT,
        }),
        service: service(512, 2048, 1),
        application_secret_arn: Some(FLASK_SECRET_ARN.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles_share_application_secret() {
        let instance = Profile::Instance.topology();
        let cluster = Profile::Cluster.topology();
        assert_eq!(
            instance.application_secret_arn,
            cluster.application_secret_arn
        );
        assert_eq!(
            instance.application_secret_arn.as_deref(),
            Some(FLASK_SECRET_ARN)
        );
    }

    #[test]
    fn test_profiles_differ_in_capacity_and_network() {
        let instance = Profile::Instance.topology();
        let cluster = Profile::Cluster.topology();

        assert_eq!(instance.network.max_azs, 2);
        assert_eq!(instance.network.nat_gateways, Some(0));
        assert_eq!(cluster.network.max_azs, 3);
        assert_eq!(cluster.network.nat_gateways, None);

        assert_eq!(
            (instance.service.cpu, instance.service.memory_limit_mib, instance.service.desired_count),
            (256, 1024, 2)
        );
        assert_eq!(
            (cluster.service.cpu, cluster.service.memory_limit_mib, cluster.service.desired_count),
            (512, 2048, 1)
        );
    }

    #[test]
    fn test_profile_round_trips_through_str() {
        assert_eq!("instance".parse::<Profile>(), Ok(Profile::Instance));
        assert_eq!(" Cluster ".parse::<Profile>(), Ok(Profile::Cluster));
        assert!("serverless".parse::<Profile>().is_err());
        assert_eq!(Profile::default(), Profile::Instance);
        assert_eq!(Profile::Cluster.to_string(), "cluster");
    }

    #[test]
    fn test_profile_topology_survives_yaml() {
        let original = Profile::Cluster.topology();
        let yaml = serde_yaml::to_string(&original).unwrap();
        let parsed: TopologyConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, original);
    }
}
