//! # Security Groups
//!
//! Network-level traffic filters. Rules are declared inline on the group.

use crate::error::SynthError;
use crate::graph::intrinsic::{get_att, reference};
use crate::graph::{LogicalId, Resource, Stack};
use serde_json::{json, Value};

/// Where inbound traffic may come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Peer {
    AnyIpv4,
    Cidr(String),
    /// Members of another, already declared, security group
    SecurityGroup(LogicalId),
}

/// A single TCP ingress rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngressRule {
    pub peer: Peer,
    pub port: u16,
    pub description: String,
}

impl IngressRule {
    pub fn tcp(peer: Peer, port: u16, description: impl Into<String>) -> Self {
        Self {
            peer,
            port,
            description: description.into(),
        }
    }

    fn to_value(&self) -> Value {
        let mut rule = json!({
            "IpProtocol": "tcp",
            "FromPort": self.port,
            "ToPort": self.port,
            "Description": self.description,
        });
        match &self.peer {
            Peer::AnyIpv4 => rule["CidrIp"] = json!("0.0.0.0/0"),
            Peer::Cidr(cidr) => rule["CidrIp"] = json!(cidr),
            Peer::SecurityGroup(group) => {
                rule["SourceSecurityGroupId"] = get_att(group, "GroupId");
            }
        }
        rule
    }
}

/// Security group builder
#[derive(Debug, Clone)]
pub struct SecurityGroup {
    pub id: LogicalId,
    description: String,
    allow_all_outbound: bool,
    ingress: Vec<IngressRule>,
}

impl SecurityGroup {
    pub fn new(id: LogicalId, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
            allow_all_outbound: true,
            ingress: Vec::new(),
        }
    }

    pub fn allow_all_outbound(mut self, allow: bool) -> Self {
        self.allow_all_outbound = allow;
        self
    }

    pub fn ingress(mut self, rule: IngressRule) -> Self {
        self.ingress.push(rule);
        self
    }

    pub fn ingress_rules(&self) -> &[IngressRule] {
        &self.ingress
    }

    /// Declare the group inside `vpc`
    pub fn declare(self, stack: &mut Stack, vpc: &LogicalId) -> Result<Self, SynthError> {
        let egress = if self.allow_all_outbound {
            json!([{
                "CidrIp": "0.0.0.0/0",
                "Description": "Allow all outbound traffic by default",
                "IpProtocol": "-1",
            }])
        } else {
            // A rule that matches nothing replaces the implicit allow-all
            json!([{
                "CidrIp": "255.255.255.255/32",
                "Description": "Disallow all traffic",
                "FromPort": 252,
                "IpProtocol": "icmp",
                "ToPort": 86,
            }])
        };
        let mut resource = Resource::new("AWS::EC2::SecurityGroup")
            .property("GroupDescription", json!(self.description))
            .property("VpcId", reference(vpc))
            .property("SecurityGroupEgress", egress);
        if !self.ingress.is_empty() {
            resource = resource.property(
                "SecurityGroupIngress",
                Value::Array(self.ingress.iter().map(IngressRule::to_value).collect()),
            );
        }
        stack.add(self.id.clone(), resource)?;
        Ok(self)
    }
}
