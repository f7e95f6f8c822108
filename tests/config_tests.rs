//! # Configuration Tests
//!
//! Topology files, secret overrides and the generated schema.

mod common;

use common::FAKE_SECRET_ARN;
use running_log_infrastructure::config::{load_topology, resolve_topology, SubnetType};
use running_log_infrastructure::prelude::*;
use std::io::Write;

const CLUSTER_TOPOLOGY: &str = r"
constructPrefix: RunningLogStaging
description: staging
network:
  maxAzs: 2
  natGateways: 1
  subnets:
    - name: Public
      subnetType: public
      cidrMask: 24
    - name: Private
      subnetType: private
      cidrMask: 24
database:
  kind: cluster
  engineVersion: 5.7.mysql_aurora.2.07.2
  instanceType: t3.small
  instances: 2
service:
  cpu: 512
  memoryLimitMib: 2048
  desiredCount: 3
  assignPublicIp: false
";

fn topology_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_file_without_secret_fails_synthesis() {
    let file = topology_file(CLUSTER_TOPOLOGY);
    let topology = resolve_topology(Profile::Instance, Some(file.path()), None).unwrap();
    assert_eq!(topology.application_secret_arn, None);
    assert!(matches!(
        build_stack("running-log-staging", &topology),
        Err(SynthError::MissingApplicationSecret)
    ));
}

#[test]
fn test_file_with_secret_override_builds() {
    let file = topology_file(CLUSTER_TOPOLOGY);
    let topology =
        resolve_topology(Profile::Instance, Some(file.path()), Some(FAKE_SECRET_ARN)).unwrap();
    let built = build_stack("running-log-staging", &topology).unwrap();

    assert_eq!(built.stack.description(), Some("staging"));
    assert_eq!(built.database.id.as_str(), "RunningLogStagingAurora");
    assert_eq!(built.database.members.len(), 2);
    assert_eq!(built.vpc.nat_gateways.len(), 1);

    // Private tasks, one NAT shared by both private subnets
    let private = built.vpc.subnet_ids(SubnetType::Private);
    assert_eq!(built.service.subnets, private);
    let service = built.stack.get(&built.service.id).unwrap();
    assert_eq!(
        service.get("NetworkConfiguration").unwrap()["AwsvpcConfiguration"]["AssignPublicIp"],
        "DISABLED"
    );
    assert_eq!(service.get("DesiredCount"), Some(&serde_json::json!(3)));

    let cidrs: Vec<&str> = built.vpc.subnets.iter().map(|s| s.cidr.as_str()).collect();
    assert_eq!(
        cidrs,
        vec!["10.0.0.0/24", "10.0.1.0/24", "10.0.2.0/24", "10.0.3.0/24"]
    );
}

#[test]
fn test_empty_override_removes_profile_secret() {
    let topology = resolve_topology(Profile::Cluster, None, Some("")).unwrap();
    assert!(matches!(
        build_stack("running-log-prod", &topology),
        Err(SynthError::MissingApplicationSecret)
    ));
}

#[test]
fn test_json_topology_file() {
    let config = serde_json::to_string(&common::with_fake_secret(Profile::Instance)).unwrap();
    let file = topology_file(&config);
    let loaded = load_topology(file.path()).unwrap();
    assert_eq!(loaded, common::with_fake_secret(Profile::Instance));
}

#[test]
fn test_invalid_layout_is_a_config_error() {
    let file = topology_file(
        r"
network:
  cidr: 10.0.0.0/28
  maxAzs: 3
  subnets:
    - name: Public
      subnetType: public
      cidrMask: 27
database:
  kind: instance
  engineVersion: 5.7.28
  instanceType: t3.micro
service:
  cpu: 256
  memoryLimitMib: 512
  desiredCount: 1
applicationSecretArn: arn:aws:secretsmanager:eu-west-1:111122223333:secret:running-log/test-AbCdEf
",
    );
    let topology = load_topology(file.path()).unwrap();
    assert!(matches!(
        build_stack("running-log-test", &topology),
        Err(SynthError::InvalidConfig(_))
    ));
}

#[test]
fn test_schema_describes_backend_variants() {
    let schema = serde_json::to_string(&schemars::schema_for!(TopologyConfig)).unwrap();
    assert!(schema.contains("\"kind\""));
    assert!(schema.contains("instance"));
    assert!(schema.contains("cluster"));
    assert!(schema.contains("applicationSecretArn"));
}

#[test]
fn test_environment_settings() {
    let settings = SynthConfig::from_lookup(|key| match key {
        "RUNNING_LOG_PROFILE" => Some("cluster".to_string()),
        "RUNNING_LOG_APP_SECRET_ARN" => Some(FAKE_SECRET_ARN.to_string()),
        _ => None,
    });
    let topology = resolve_topology(
        settings.profile().unwrap(),
        None,
        settings.app_secret_arn.as_deref(),
    )
    .unwrap();
    assert_eq!(topology.application_secret_arn.as_deref(), Some(FAKE_SECRET_ARN));
    assert!(matches!(topology.database, DatabaseBackend::Cluster(_)));
}
