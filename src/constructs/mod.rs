//! # Constructs
//!
//! Each construct declares a group of related resources into a [`Stack`] and
//! returns a handle carrying the logical IDs later layers reference.
//!
//! [`Stack`]: crate::graph::Stack

pub mod cluster;
pub mod database;
pub mod network;
pub mod repository;
pub mod secrets;
pub mod security_group;
pub mod service;

pub use cluster::{declare_cluster, EcsCluster};
pub use database::{declare_database, Database};
pub use network::{declare_vpc, effective_nat_gateways, Subnet, Vpc};
pub use repository::EcrImage;
pub use secrets::{import_application_secret, SecretRef};
pub use security_group::{IngressRule, Peer, SecurityGroup};
pub use service::{declare_service, LoadBalancedFargateService, ServiceSecrets};
