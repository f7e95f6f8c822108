//! # Load-Balanced Fargate Service
//!
//! An application load balancer forwarding HTTP to Fargate tasks running a
//! single container. The container receives exactly two secrets through its
//! environment: the database credential and the application secret.
//!
//! ## Declared resources
//!
//! | Suffix | Type |
//! |---|---|
//! | `LBSecurityGroup` | `AWS::EC2::SecurityGroup` |
//! | `LB` | `AWS::ElasticLoadBalancingV2::LoadBalancer` |
//! | `LBPublicListenerECSGroup` | `AWS::ElasticLoadBalancingV2::TargetGroup` |
//! | `LBPublicListener` | `AWS::ElasticLoadBalancingV2::Listener` |
//! | `TaskDefLogGroup` | `AWS::Logs::LogGroup` |
//! | `TaskDefTaskRole` | `AWS::IAM::Role` |
//! | `TaskDefExecutionRole` | `AWS::IAM::Role` |
//! | `TaskDefExecutionRoleDefaultPolicy` | `AWS::IAM::Policy` |
//! | `TaskDef` | `AWS::ECS::TaskDefinition` |
//! | `SecurityGroup` | `AWS::EC2::SecurityGroup` |
//! | (none) | `AWS::ECS::Service` |

use crate::config::{ServiceConfig, SubnetType};
use crate::constants::{
    APPLICATION_SECRET_ENV, DATABASE_SECRET_ENV, HEALTH_CHECK_GRACE_PERIOD_SECS, HTTP_PORT,
};
use crate::error::SynthError;
use crate::graph::intrinsic::{get_att, join, pseudo, reference, Pseudo};
use crate::graph::{LogicalId, Output, Resource, RetentionPolicy, Stack};
use serde_json::{json, Value};
use tracing::info;

use super::cluster::EcsCluster;
use super::network::Vpc;
use super::repository::EcrImage;
use super::secrets::SecretRef;
use super::security_group::{IngressRule, Peer, SecurityGroup};

/// Secrets injected into the container environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSecrets {
    pub database: SecretRef,
    pub application: SecretRef,
}

impl ServiceSecrets {
    /// Environment entries in container order
    pub fn entries(&self) -> [(&'static str, &SecretRef); 2] {
        [
            (DATABASE_SECRET_ENV, &self.database),
            (APPLICATION_SECRET_ENV, &self.application),
        ]
    }
}

/// Handle to the declared service
#[derive(Debug, Clone)]
pub struct LoadBalancedFargateService {
    pub id: LogicalId,
    pub load_balancer: LogicalId,
    pub load_balancer_security_group: LogicalId,
    pub target_group: LogicalId,
    pub listener: LogicalId,
    pub task_definition: LogicalId,
    pub security_group: LogicalId,
    pub execution_role: LogicalId,
    pub task_role: LogicalId,
    pub log_group: LogicalId,
    /// Subnets the tasks are placed in
    pub subnets: Vec<LogicalId>,
    pub container_name: String,
    pub image: EcrImage,
    pub desired_count: u32,
    pub cpu: u32,
    pub memory_limit_mib: u32,
    pub secrets: ServiceSecrets,
}

fn assume_role_policy(service: &str) -> Value {
    json!({
        "Statement": [{
            "Action": "sts:AssumeRole",
            "Effect": "Allow",
            "Principal": { "Service": service },
        }],
        "Version": "2012-10-17",
    })
}

/// Pick task or load balancer subnets, preferring `preferred`
fn placement(vpc: &Vpc, preferred: SubnetType) -> Vec<LogicalId> {
    let subnets = vpc.subnet_ids(preferred);
    if subnets.is_empty() {
        vpc.all_subnet_ids()
    } else {
        subnets
    }
}

/// Declare the load balancer, task definition and service
pub fn declare_service(
    stack: &mut Stack,
    prefix: &str,
    config: &ServiceConfig,
    vpc: &Vpc,
    cluster: &EcsCluster,
    secrets: ServiceSecrets,
) -> Result<LoadBalancedFargateService, SynthError> {
    let id = LogicalId::new(format!("{prefix}Service"))?;
    let image = EcrImage::new(&config.repository_name, &config.image_tag);

    let lb_subnets = if config.public_load_balancer {
        vpc.subnet_ids(SubnetType::Public)
    } else {
        placement(vpc, SubnetType::Private)
    };
    if lb_subnets.is_empty() {
        return Err(SynthError::InvalidConfig(
            "a public load balancer needs a public subnet group".to_string(),
        ));
    }
    let task_subnets = if config.assign_public_ip {
        placement(vpc, SubnetType::Public)
    } else {
        placement(vpc, SubnetType::Private)
    };

    // Load balancer
    let lb_sg = SecurityGroup::new(
        id.child("LBSecurityGroup")?,
        format!("Automatically created Security Group for ELB {id}LB"),
    )
    .ingress(IngressRule::tcp(
        Peer::AnyIpv4,
        config.listener_port,
        format!("Allow from anyone on port {}", config.listener_port),
    ))
    .declare(stack, &vpc.id)?;

    let scheme = if config.public_load_balancer {
        "internet-facing"
    } else {
        "internal"
    };
    let mut load_balancer = Resource::new("AWS::ElasticLoadBalancingV2::LoadBalancer")
        .property(
            "LoadBalancerAttributes",
            json!([{ "Key": "deletion_protection.enabled", "Value": "false" }]),
        )
        .property("Scheme", json!(scheme))
        .property("SecurityGroups", json!([get_att(&lb_sg.id, "GroupId")]))
        .property(
            "Subnets",
            Value::Array(lb_subnets.iter().map(reference).collect()),
        )
        .property("Type", json!("application"));
    if config.public_load_balancer {
        // Reachable only once the public subnets route to the internet
        for route in vpc.internet_routes() {
            load_balancer = load_balancer.depends_on(&route);
        }
    }
    let load_balancer = stack.add(id.child("LB")?, load_balancer)?;

    let target_group = stack.add(
        id.child("LBPublicListenerECSGroup")?,
        Resource::new("AWS::ElasticLoadBalancingV2::TargetGroup")
            .property("Port", json!(config.container_port))
            .property("Protocol", json!("HTTP"))
            .property("TargetType", json!("ip"))
            .property("VpcId", reference(&vpc.id)),
    )?;

    let listener = stack.add(
        id.child("LBPublicListener")?,
        Resource::new("AWS::ElasticLoadBalancingV2::Listener")
            .property(
                "DefaultActions",
                json!([{ "TargetGroupArn": reference(&target_group), "Type": "forward" }]),
            )
            .property("LoadBalancerArn", reference(&load_balancer))
            .property("Port", json!(config.listener_port))
            .property("Protocol", json!("HTTP")),
    )?;

    // Task definition
    let log_group = stack.add(
        id.child("TaskDefLogGroup")?,
        Resource::new("AWS::Logs::LogGroup").retention(RetentionPolicy::Retain),
    )?;
    let task_role = stack.add(
        id.child("TaskDefTaskRole")?,
        Resource::new("AWS::IAM::Role")
            .property(
                "AssumeRolePolicyDocument",
                assume_role_policy("ecs-tasks.amazonaws.com"),
            ),
    )?;
    let execution_role = stack.add(
        id.child("TaskDefExecutionRole")?,
        Resource::new("AWS::IAM::Role")
            .property(
                "AssumeRolePolicyDocument",
                assume_role_policy("ecs-tasks.amazonaws.com"),
            ),
    )?;

    let secret_resources: Vec<Value> = secrets
        .entries()
        .iter()
        .map(|(_, secret)| secret.policy_resource())
        .collect();
    let execution_policy_id = id.child("TaskDefExecutionRoleDefaultPolicy")?;
    stack.add(
        execution_policy_id.clone(),
        Resource::new("AWS::IAM::Policy")
            .property(
                "PolicyDocument",
                json!({
                    "Statement": [
                        {
                            "Action": [
                                "ecr:BatchCheckLayerAvailability",
                                "ecr:GetDownloadUrlForLayer",
                                "ecr:BatchGetImage",
                            ],
                            "Effect": "Allow",
                            "Resource": image.repository_arn(),
                        },
                        {
                            "Action": "ecr:GetAuthorizationToken",
                            "Effect": "Allow",
                            "Resource": "*",
                        },
                        {
                            "Action": ["logs:CreateLogStream", "logs:PutLogEvents"],
                            "Effect": "Allow",
                            "Resource": get_att(&log_group, "Arn"),
                        },
                        {
                            "Action": [
                                "secretsmanager:GetSecretValue",
                                "secretsmanager:DescribeSecret",
                            ],
                            "Effect": "Allow",
                            "Resource": secret_resources,
                        },
                    ],
                    "Version": "2012-10-17",
                }),
            )
            .property("PolicyName", json!(execution_policy_id.as_str()))
            .property("Roles", json!([reference(&execution_role)])),
    )?;

    let container_secrets: Vec<Value> = secrets
        .entries()
        .iter()
        .map(|(name, secret)| json!({ "Name": name, "ValueFrom": secret.value_from() }))
        .collect();
    let task_definition = stack.add(
        id.child("TaskDef")?,
        Resource::new("AWS::ECS::TaskDefinition")
            .property(
                "ContainerDefinitions",
                json!([{
                    "Essential": true,
                    "Image": image.image_uri(),
                    "LogConfiguration": {
                        "LogDriver": "awslogs",
                        "Options": {
                            "awslogs-group": reference(&log_group),
                            "awslogs-stream-prefix": id.as_str(),
                            "awslogs-region": pseudo(Pseudo::Region),
                        },
                    },
                    "Name": config.container_name,
                    "PortMappings": [{
                        "ContainerPort": config.container_port,
                        "Protocol": "tcp",
                    }],
                    "Secrets": container_secrets,
                }]),
            )
            .property("Cpu", json!(config.cpu.to_string()))
            .property("ExecutionRoleArn", get_att(&execution_role, "Arn"))
            .property("Family", json!(id.child("TaskDef")?.as_str()))
            .property("Memory", json!(config.memory_limit_mib.to_string()))
            .property("NetworkMode", json!("awsvpc"))
            .property("RequiresCompatibilities", json!(["FARGATE"]))
            .property("TaskRoleArn", get_att(&task_role, "Arn")),
    )?;

    // Service
    let service_sg = SecurityGroup::new(
        id.child("SecurityGroup")?,
        format!("{}/{id}/Service/SecurityGroup", stack.name()),
    )
    .ingress(IngressRule::tcp(
        Peer::SecurityGroup(lb_sg.id.clone()),
        config.container_port,
        "Load balancer to target",
    ))
    .declare(stack, &vpc.id)?;

    let assign_public_ip = if config.assign_public_ip {
        "ENABLED"
    } else {
        "DISABLED"
    };
    let service_subnets: Vec<Value> = task_subnets.iter().map(reference).collect();
    stack.add(
        id.clone(),
        Resource::new("AWS::ECS::Service")
            .property("Cluster", reference(&cluster.id))
            .property(
                "DeploymentConfiguration",
                json!({ "MaximumPercent": 200, "MinimumHealthyPercent": 50 }),
            )
            .property("DesiredCount", json!(config.desired_count))
            .property("EnableECSManagedTags", json!(false))
            .property(
                "HealthCheckGracePeriodSeconds",
                json!(HEALTH_CHECK_GRACE_PERIOD_SECS),
            )
            .property("LaunchType", json!("FARGATE"))
            .property(
                "LoadBalancers",
                json!([{
                    "ContainerName": config.container_name,
                    "ContainerPort": config.container_port,
                    "TargetGroupArn": reference(&target_group),
                }]),
            )
            .property(
                "NetworkConfiguration",
                json!({
                    "AwsvpcConfiguration": {
                        "AssignPublicIp": assign_public_ip,
                        "SecurityGroups": [get_att(&service_sg.id, "GroupId")],
                        "Subnets": service_subnets,
                    },
                }),
            )
            .property("TaskDefinition", reference(&task_definition))
            .depends_on(&listener)
            .depends_on(&execution_policy_id),
    )?;

    let mut url = vec![json!("http://"), get_att(&load_balancer, "DNSName")];
    if config.listener_port != HTTP_PORT {
        url.push(json!(format!(":{}", config.listener_port)));
    }
    stack.add_output(
        &id.child("LoadBalancerDNS")?,
        Output::new(get_att(&load_balancer, "DNSName"))
            .with_description("DNS name of the service load balancer"),
    )?;
    stack.add_output(
        &id.child("ServiceURL")?,
        Output::new(join("", url)).with_description("HTTP endpoint of the service"),
    )?;

    info!(
        service = %id,
        desired_count = config.desired_count,
        cpu = config.cpu,
        memory_limit_mib = config.memory_limit_mib,
        public = config.public_load_balancer,
        "Declared load-balanced service"
    );

    Ok(LoadBalancedFargateService {
        id,
        load_balancer,
        load_balancer_security_group: lb_sg.id,
        target_group,
        listener,
        task_definition,
        security_group: service_sg.id,
        execution_role,
        task_role,
        log_group,
        subnets: task_subnets,
        container_name: config.container_name.clone(),
        image,
        desired_count: config.desired_count,
        cpu: config.cpu,
        memory_limit_mib: config.memory_limit_mib,
        secrets,
    })
}
