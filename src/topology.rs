//! # Topology Definition
//!
//! Declares the whole deployment in one pass, layer by layer:
//!
//! 1. network (VPC and subnets)
//! 2. database access rule
//! 3. database (instance or cluster), which yields the credential reference
//! 4. compute cluster
//! 5. application secret reference
//! 6. load-balanced service
//!
//! Each layer only references layers above it, so the graph is acyclic by
//! construction. Both database backends go through the same routine; only the
//! database layer looks at the variant.

use crate::config::TopologyConfig;
use crate::constructs::{
    declare_cluster, declare_database, declare_service, declare_vpc, import_application_secret,
    Database, EcsCluster, IngressRule, LoadBalancedFargateService, Peer, SecurityGroup,
    ServiceSecrets, Vpc,
};
use crate::error::SynthError;
use crate::graph::{LogicalId, Stack};
use tracing::info;

/// A synthesized stack plus handles to each of its layers
#[derive(Debug, Clone)]
pub struct Topology {
    pub stack: Stack,
    pub vpc: Vpc,
    pub access_rule: SecurityGroup,
    pub database: Database,
    pub cluster: EcsCluster,
    pub service: LoadBalancedFargateService,
}

/// Declare every resource of the deployment into a new stack
///
/// Fails without producing anything when the application secret is missing
/// or the configuration cannot form a valid graph.
pub fn build_stack(stack_name: &str, config: &TopologyConfig) -> Result<Topology, SynthError> {
    // Checked up front so nothing is declared for an unusable topology
    let application_secret = import_application_secret(config.application_secret_arn.as_deref())?;

    let prefix = config.construct_prefix.as_str();
    let mut stack = Stack::new(stack_name);
    if let Some(description) = &config.description {
        stack = stack.with_description(description);
    }
    info!(
        stack = stack_name,
        backend = config.database.kind(),
        "Declaring topology"
    );

    let vpc = declare_vpc(
        &mut stack,
        &LogicalId::new(format!("{prefix}VPC"))?,
        &config.network,
    )?;

    // The rule admits exactly the port the database listens on
    let port = config.database.port();
    let access_rule = SecurityGroup::new(
        LogicalId::new(format!("{prefix}MySQLSG"))?,
        "MySQL Security Group",
    )
    .ingress(IngressRule::tcp(Peer::AnyIpv4, port, "MySQL"))
    .declare(&mut stack, &vpc.id)?;

    let database = declare_database(&mut stack, prefix, &config.database, &vpc, &access_rule)?;

    let cluster = declare_cluster(&mut stack, prefix, &config.service.cluster_name, &vpc.id)?;

    let secrets = ServiceSecrets {
        database: database.secret.clone(),
        application: application_secret,
    };
    let service = declare_service(&mut stack, prefix, &config.service, &vpc, &cluster, secrets)?;

    info!(
        stack = stack_name,
        resources = stack.len(),
        outputs = stack.outputs().len(),
        "Topology declared"
    );

    Ok(Topology {
        stack,
        vpc,
        access_rule,
        database,
        cluster,
        service,
    })
}
