//! # Database
//!
//! Declares the relational database for either backend variant. Both variants
//! share the same pieces around the engine resource:
//!
//! - a DB subnet group over the chosen VPC subnets
//! - a generated master credential secret (username + random password)
//! - a secret target attachment, which adds host and port to the secret once
//!   the database exists; the service reads the credential through it
//!
//! The master credential is resolved by the provisioning engine from the
//! generated secret (`{{resolve:secretsmanager:...}}`); no value is ever
//! rendered into the template.

use crate::config::{ClusterConfig, DatabaseBackend, InstanceConfig, SubnetType};
use crate::constants::{
    DEFAULT_MASTER_USERNAME, GENERATED_PASSWORD_EXCLUDE, GENERATED_PASSWORD_LENGTH,
};
use crate::error::SynthError;
use crate::graph::intrinsic::{get_att, reference, sub};
use crate::graph::{LogicalId, Resource, RetentionPolicy, Stack};
use serde_json::{json, Value};
use tracing::info;

use super::network::Vpc;
use super::secrets::SecretRef;
use super::security_group::SecurityGroup;

/// Handle to the declared database
#[derive(Debug, Clone)]
pub struct Database {
    /// "instance" or "cluster"
    pub kind: &'static str,
    /// The engine resource (DBInstance or DBCluster)
    pub id: LogicalId,
    /// Member instances; for the instance variant this is `[id]`
    pub members: Vec<LogicalId>,
    pub subnet_group: LogicalId,
    /// VPC subnets the subnet group spans
    pub subnets: Vec<LogicalId>,
    pub security_groups: Vec<LogicalId>,
    pub port: u16,
    /// Master credential, including host and port once attached
    pub secret: SecretRef,
}

/// Declare the database described by `backend`
///
/// The database is placed in the public subnets when the VPC has any (the
/// access rule admits MySQL from anywhere), otherwise in the private ones.
pub fn declare_database(
    stack: &mut Stack,
    prefix: &str,
    backend: &DatabaseBackend,
    vpc: &Vpc,
    access_rule: &SecurityGroup,
) -> Result<Database, SynthError> {
    let mut subnets = vpc.subnet_ids(SubnetType::Public);
    if subnets.is_empty() {
        subnets = vpc.subnet_ids(SubnetType::Private);
    }
    if subnets.is_empty() {
        return Err(SynthError::InvalidConfig(
            "the database needs at least one subnet".to_string(),
        ));
    }
    let security_groups = vec![access_rule.id.clone()];

    let database = match backend {
        DatabaseBackend::Instance(config) => {
            let id = LogicalId::new(format!("{prefix}Mysql"))?;
            declare_instance(stack, &id, config, subnets, security_groups)?
        }
        DatabaseBackend::Cluster(config) => {
            let id = LogicalId::new(format!("{prefix}Aurora"))?;
            declare_cluster(stack, &id, config, subnets, security_groups)?
        }
    };

    info!(
        kind = database.kind,
        database = %database.id,
        members = database.members.len(),
        port = database.port,
        "Declared database"
    );
    Ok(database)
}

fn declare_subnet_group(
    stack: &mut Stack,
    id: &LogicalId,
    subnets: &[LogicalId],
) -> Result<LogicalId, SynthError> {
    stack.add(
        id.child("SubnetGroup")?,
        Resource::new("AWS::RDS::DBSubnetGroup")
            .property(
                "DBSubnetGroupDescription",
                json!(format!("Subnet group for {id} database")),
            )
            .property(
                "SubnetIds",
                Value::Array(subnets.iter().map(reference).collect()),
            ),
    )
}

fn declare_credential(
    stack: &mut Stack,
    id: &LogicalId,
    username: Option<&str>,
) -> Result<LogicalId, SynthError> {
    let username = username.unwrap_or(DEFAULT_MASTER_USERNAME);
    stack.add(
        id.child("Secret")?,
        Resource::new("AWS::SecretsManager::Secret")
            .property(
                "Description",
                json!(format!("Master credential for {id} database")),
            )
            .property(
                "GenerateSecretString",
                json!({
                    "ExcludeCharacters": GENERATED_PASSWORD_EXCLUDE,
                    "GenerateStringKey": "password",
                    "PasswordLength": GENERATED_PASSWORD_LENGTH,
                    "SecretStringTemplate": json!({ "username": username }).to_string(),
                }),
            ),
    )
}

/// `{{resolve:secretsmanager:<secret>:SecretString:<key>::}}`
fn resolve_secret_field(secret: &LogicalId, key: &str) -> Value {
    sub(format!(
        "{{{{resolve:secretsmanager:${{{secret}}}:SecretString:{key}::}}}}"
    ))
}

fn declare_attachment(
    stack: &mut Stack,
    id: &LogicalId,
    secret: &LogicalId,
    target_type: &str,
) -> Result<LogicalId, SynthError> {
    stack.add(
        id.child("SecretAttachment")?,
        Resource::new("AWS::SecretsManager::SecretTargetAttachment")
            .property("SecretId", reference(secret))
            .property("TargetId", reference(id))
            .property("TargetType", json!(target_type)),
    )
}

fn declare_instance(
    stack: &mut Stack,
    id: &LogicalId,
    config: &InstanceConfig,
    subnets: Vec<LogicalId>,
    security_groups: Vec<LogicalId>,
) -> Result<Database, SynthError> {
    let subnet_group = declare_subnet_group(stack, id, &subnets)?;
    let secret = declare_credential(stack, id, config.master_username.as_deref())?;

    stack.add(
        id.clone(),
        Resource::new("AWS::RDS::DBInstance")
            .property("DBInstanceClass", json!(format!("db.{}", config.instance_type)))
            .property("Engine", json!(config.engine))
            .property("EngineVersion", json!(config.engine_version))
            .property(
                "AllocatedStorage",
                json!(config.allocated_storage_gib.to_string()),
            )
            .property("StorageType", json!("gp2"))
            .property("CopyTagsToSnapshot", json!(true))
            .property("DBSubnetGroupName", reference(&subnet_group))
            .property("MasterUsername", resolve_secret_field(&secret, "username"))
            .property("MasterUserPassword", resolve_secret_field(&secret, "password"))
            .property("Port", json!(config.port.to_string()))
            .property("PubliclyAccessible", json!(true))
            .property("DeletionProtection", json!(config.deletion_protection))
            .property(
                "VPCSecurityGroups",
                Value::Array(
                    security_groups
                        .iter()
                        .map(|sg| get_att(sg, "GroupId"))
                        .collect(),
                ),
            )
            .retention(RetentionPolicy::Snapshot),
    )?;

    let attachment = declare_attachment(stack, id, &secret, "AWS::RDS::DBInstance")?;

    Ok(Database {
        kind: "instance",
        id: id.clone(),
        members: vec![id.clone()],
        subnet_group,
        subnets,
        security_groups,
        port: config.port,
        secret: SecretRef::Generated { id: attachment },
    })
}

fn declare_cluster(
    stack: &mut Stack,
    id: &LogicalId,
    config: &ClusterConfig,
    subnets: Vec<LogicalId>,
    security_groups: Vec<LogicalId>,
) -> Result<Database, SynthError> {
    if config.instances == 0 {
        return Err(SynthError::InvalidConfig(
            "database.instances must be at least 1".to_string(),
        ));
    }

    let subnet_group = declare_subnet_group(stack, id, &subnets)?;
    let secret = declare_credential(stack, id, config.master_username.as_deref())?;

    let mut cluster = Resource::new("AWS::RDS::DBCluster")
        .property("Engine", json!(config.engine))
        .property("EngineVersion", json!(config.engine_version))
        .property("DBSubnetGroupName", reference(&subnet_group))
        .property("MasterUsername", resolve_secret_field(&secret, "username"))
        .property("MasterUserPassword", resolve_secret_field(&secret, "password"))
        .property("Port", json!(config.port))
        .property("CopyTagsToSnapshot", json!(true))
        .property("DeletionProtection", json!(config.deletion_protection))
        .property(
            "VpcSecurityGroupIds",
            Value::Array(
                security_groups
                    .iter()
                    .map(|sg| get_att(sg, "GroupId"))
                    .collect(),
            ),
        )
        .retention(RetentionPolicy::Snapshot);
    if let Some(parameter_group) = &config.parameter_group {
        cluster = cluster.property("DBClusterParameterGroupName", json!(parameter_group));
    }
    stack.add(id.clone(), cluster)?;

    let mut members = Vec::with_capacity(config.instances as usize);
    for n in 1..=config.instances {
        let member = stack.add(
            id.child(&format!("Instance{n}"))?,
            Resource::new("AWS::RDS::DBInstance")
                .property("DBClusterIdentifier", reference(id))
                .property("DBInstanceClass", json!(format!("db.{}", config.instance_type)))
                .property("Engine", json!(config.engine))
                .property("DBSubnetGroupName", reference(&subnet_group))
                .property("PubliclyAccessible", json!(true))
                .retention(RetentionPolicy::Delete),
        )?;
        members.push(member);
    }

    let attachment = declare_attachment(stack, id, &secret, "AWS::RDS::DBCluster")?;

    Ok(Database {
        kind: "cluster",
        id: id.clone(),
        members,
        subnet_group,
        subnets,
        security_groups,
        port: config.port,
        secret: SecretRef::Generated { id: attachment },
    })
}
