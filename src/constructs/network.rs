//! # Network
//!
//! Declares the VPC: one subnet per subnet group per availability zone, an
//! internet gateway for public subnets, and NAT gateways for private subnets
//! when the configuration asks for an egress path.
//!
//! ## Addressing
//!
//! Subnets are carved from the VPC block in declaration order. Groups without
//! an explicit `cidrMask` share the space evenly: with `n` subnets in total the
//! prefix grows by `ceil(log2(n))` bits.

use crate::config::{NetworkConfig, SubnetType};
use crate::error::SynthError;
use crate::graph::intrinsic::{get_att, get_azs, reference, select};
use crate::graph::{LogicalId, Resource, Stack};
use serde_json::json;
use std::net::Ipv4Addr;
use tracing::info;

/// A declared subnet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subnet {
    pub id: LogicalId,
    pub subnet_type: SubnetType,
    pub cidr: String,
    /// Index into the region's availability zone list
    pub az_index: usize,
    pub route_table: LogicalId,
    /// Default route, when the subnet has one
    pub default_route: Option<LogicalId>,
}

/// Handle to the declared VPC
#[derive(Debug, Clone)]
pub struct Vpc {
    pub id: LogicalId,
    pub cidr: String,
    pub internet_gateway: Option<LogicalId>,
    pub subnets: Vec<Subnet>,
    pub nat_gateways: Vec<LogicalId>,
}

impl Vpc {
    /// Logical IDs of the subnets of one type, in AZ order
    pub fn subnet_ids(&self, subnet_type: SubnetType) -> Vec<LogicalId> {
        self.subnets
            .iter()
            .filter(|s| s.subnet_type == subnet_type)
            .map(|s| s.id.clone())
            .collect()
    }

    pub fn all_subnet_ids(&self) -> Vec<LogicalId> {
        self.subnets.iter().map(|s| s.id.clone()).collect()
    }

    /// Default routes of public subnets; internet-facing resources wait on these
    pub fn internet_routes(&self) -> Vec<LogicalId> {
        self.subnets
            .iter()
            .filter(|s| s.subnet_type == SubnetType::Public)
            .filter_map(|s| s.default_route.clone())
            .collect()
    }

    pub fn az_count(&self) -> usize {
        self.subnets
            .iter()
            .map(|s| s.az_index + 1)
            .max()
            .unwrap_or(0)
    }
}

/// Parse `a.b.c.d/len`
fn parse_cidr(cidr: &str) -> Result<(u32, u8), SynthError> {
    let invalid =
        || SynthError::InvalidConfig(format!("network.cidr '{cidr}' is not an IPv4 CIDR block"));
    let (addr, len) = cidr.trim().split_once('/').ok_or_else(invalid)?;
    let addr: Ipv4Addr = addr.parse().map_err(|_| invalid())?;
    let len: u8 = len.parse().map_err(|_| invalid())?;
    if len > 32 {
        return Err(invalid());
    }
    let base = u32::from(addr);
    let mask = if len == 0 { 0 } else { u32::MAX << (32 - len) };
    Ok((base & mask, len))
}

fn format_cidr(base: u32, len: u8) -> String {
    format!("{}/{len}", Ipv4Addr::from(base))
}

fn block_size(len: u8) -> u64 {
    1u64 << (32 - u32::from(len))
}

/// Bits needed to address `n` equal parts
fn bits_for(n: usize) -> u8 {
    let mut bits = 0u8;
    while (1usize << bits) < n {
        bits += 1;
    }
    bits
}

/// Allocate one CIDR per subnet, consecutively from the VPC base
///
/// `masks[i]` is the explicit prefix length of subnet `i`, if any.
fn allocate_subnets(cidr: &str, masks: &[Option<u8>]) -> Result<Vec<String>, SynthError> {
    let (base, vpc_len) = parse_cidr(cidr)?;
    let implicit = masks.iter().filter(|m| m.is_none()).count();
    let explicit_space: u64 = masks.iter().flatten().map(|&len| block_size(len)).sum();
    let vpc_space = block_size(vpc_len);

    let default_len = if implicit == 0 {
        32
    } else {
        let remaining = vpc_space.checked_sub(explicit_space).ok_or_else(|| {
            SynthError::InvalidConfig(format!(
                "subnet masks do not fit in network.cidr '{cidr}'"
            ))
        })?;
        // Largest power-of-two share of the remaining space per implicit subnet
        let share = remaining / implicit as u64;
        if share == 0 {
            return Err(SynthError::InvalidConfig(format!(
                "network.cidr '{cidr}' is too small for {} subnets",
                masks.len()
            )));
        }
        let share_bits = 63 - share.leading_zeros();
        let len = 32u32.saturating_sub(share_bits);
        let by_count = u32::from(vpc_len) + u32::from(bits_for(masks.len()));
        u8::try_from(len.max(by_count).min(32)).unwrap_or(32)
    };

    let mut cursor = u64::from(base);
    let end = u64::from(base) + vpc_space;
    let mut allocated = Vec::with_capacity(masks.len());
    for mask in masks {
        let len = mask.unwrap_or(default_len);
        if len < vpc_len || len > 32 {
            return Err(SynthError::InvalidConfig(format!(
                "subnet mask /{len} does not fit in network.cidr '{cidr}'"
            )));
        }
        let size = block_size(len);
        // Align to the subnet's own block size
        cursor = cursor.div_ceil(size) * size;
        if cursor + size > end {
            return Err(SynthError::InvalidConfig(format!(
                "network.cidr '{cidr}' has no room for {} subnets",
                masks.len()
            )));
        }
        let start = u32::try_from(cursor).map_err(|_| {
            SynthError::InvalidConfig(format!("network.cidr '{cidr}' overflows IPv4 space"))
        })?;
        allocated.push(format_cidr(start, len));
        cursor += size;
    }
    Ok(allocated)
}

/// Number of NAT gateways actually provisioned
///
/// Without private subnets there is nothing to route through a NAT gateway,
/// so none are created whatever the configured count.
pub fn effective_nat_gateways(config: &NetworkConfig) -> u32 {
    let has_private = config
        .subnets
        .iter()
        .any(|g| g.subnet_type == SubnetType::Private);
    if !has_private {
        return 0;
    }
    config
        .nat_gateways
        .unwrap_or(config.max_azs)
        .min(config.max_azs)
}

/// Declare the VPC and everything it contains
pub fn declare_vpc(
    stack: &mut Stack,
    id: &LogicalId,
    config: &NetworkConfig,
) -> Result<Vpc, SynthError> {
    if config.max_azs == 0 {
        return Err(SynthError::InvalidConfig(
            "network.maxAzs must be at least 1".to_string(),
        ));
    }
    if config.subnets.is_empty() {
        return Err(SynthError::InvalidConfig(
            "network.subnets must declare at least one subnet group".to_string(),
        ));
    }
    let has_public = config
        .subnets
        .iter()
        .any(|g| g.subnet_type == SubnetType::Public);
    let nat_count = effective_nat_gateways(config);
    if nat_count > 0 && !has_public {
        return Err(SynthError::InvalidConfig(
            "NAT gateways require a public subnet group".to_string(),
        ));
    }

    let az_count = config.max_azs as usize;
    let masks: Vec<Option<u8>> = config
        .subnets
        .iter()
        .flat_map(|group| std::iter::repeat(group.cidr_mask).take(az_count))
        .collect();
    let mut cidrs = allocate_subnets(&config.cidr, &masks)?.into_iter();
    let (vpc_base, vpc_len) = parse_cidr(&config.cidr)?;
    let vpc_cidr = format_cidr(vpc_base, vpc_len);

    let name_tag = json!([{ "Key": "Name", "Value": id.as_str() }]);
    stack.add(
        id.clone(),
        Resource::new("AWS::EC2::VPC")
            .property("CidrBlock", json!(vpc_cidr))
            .property("EnableDnsHostnames", json!(true))
            .property("EnableDnsSupport", json!(true))
            .property("InstanceTenancy", json!("default"))
            .property("Tags", name_tag),
    )?;

    let (internet_gateway, attachment) = if has_public {
        let igw = stack.add(
            id.child("IGW")?,
            Resource::new("AWS::EC2::InternetGateway"),
        )?;
        let attachment = stack.add(
            id.child("VPCGW")?,
            Resource::new("AWS::EC2::VPCGatewayAttachment")
                .property("VpcId", reference(id))
                .property("InternetGatewayId", reference(&igw)),
        )?;
        (Some(igw), Some(attachment))
    } else {
        (None, None)
    };

    let mut vpc = Vpc {
        id: id.clone(),
        cidr: vpc_cidr,
        internet_gateway,
        subnets: Vec::new(),
        nat_gateways: Vec::new(),
    };

    // Public groups first so NAT gateways exist before private routes use them
    let mut groups: Vec<_> = config.subnets.iter().collect();
    groups.sort_by_key(|g| g.subnet_type != SubnetType::Public);
    let mut cidr_by_group = std::collections::HashMap::new();
    for group in &config.subnets {
        let mut group_cidrs = Vec::with_capacity(az_count);
        for _ in 0..az_count {
            group_cidrs.push(cidrs.next().ok_or_else(|| {
                SynthError::InvalidConfig("subnet allocation ran short".to_string())
            })?);
        }
        cidr_by_group.insert(group.name.clone(), group_cidrs);
    }

    for group in groups {
        let group_cidrs = cidr_by_group.remove(&group.name).ok_or_else(|| {
            SynthError::InvalidConfig(format!("duplicate subnet group name '{}'", group.name))
        })?;
        for (az_index, cidr) in group_cidrs.into_iter().enumerate() {
            let subnet = declare_subnet(
                stack,
                &mut vpc,
                group.name.as_str(),
                group.subnet_type,
                az_index,
                cidr,
                attachment.as_ref(),
                nat_count,
            )?;
            vpc.subnets.push(subnet);
        }
    }

    info!(
        vpc = %id,
        availability_zones = az_count,
        subnets = vpc.subnets.len(),
        nat_gateways = vpc.nat_gateways.len(),
        "Declared network"
    );
    Ok(vpc)
}

#[allow(clippy::too_many_arguments, reason = "mirrors the per-subnet inputs of the layout")]
fn declare_subnet(
    stack: &mut Stack,
    vpc: &mut Vpc,
    group_name: &str,
    subnet_type: SubnetType,
    az_index: usize,
    cidr: String,
    attachment: Option<&LogicalId>,
    nat_count: u32,
) -> Result<Subnet, SynthError> {
    let prefix = vpc.id.child(&format!("{group_name}Subnet{}", az_index + 1))?;
    let public = subnet_type == SubnetType::Public;
    let network_tag = if public { "Public" } else { "Private" };

    let subnet_id = stack.add(
        prefix.child("Subnet")?,
        Resource::new("AWS::EC2::Subnet")
            .property("VpcId", reference(&vpc.id))
            .property("AvailabilityZone", select(az_index, get_azs()))
            .property("CidrBlock", json!(cidr))
            .property("MapPublicIpOnLaunch", json!(public))
            .property(
                "Tags",
                json!([
                    { "Key": "Name", "Value": prefix.as_str() },
                    { "Key": "network-subnet-name", "Value": group_name },
                    { "Key": "network-subnet-type", "Value": network_tag },
                ]),
            ),
    )?;
    let route_table = stack.add(
        prefix.child("RouteTable")?,
        Resource::new("AWS::EC2::RouteTable").property("VpcId", reference(&vpc.id)),
    )?;
    stack.add(
        prefix.child("RouteTableAssociation")?,
        Resource::new("AWS::EC2::SubnetRouteTableAssociation")
            .property("RouteTableId", reference(&route_table))
            .property("SubnetId", reference(&subnet_id)),
    )?;

    let default_route = match (public, attachment, &vpc.internet_gateway) {
        (true, Some(attachment), Some(igw)) => {
            let route = stack.add(
                prefix.child("DefaultRoute")?,
                Resource::new("AWS::EC2::Route")
                    .property("RouteTableId", reference(&route_table))
                    .property("DestinationCidrBlock", json!("0.0.0.0/0"))
                    .property("GatewayId", reference(igw))
                    .depends_on(attachment),
            )?;
            if (vpc.nat_gateways.len() as u32) < nat_count {
                let eip = stack.add(
                    prefix.child("EIP")?,
                    Resource::new("AWS::EC2::EIP").property("Domain", json!("vpc")),
                )?;
                let nat = stack.add(
                    prefix.child("NATGateway")?,
                    Resource::new("AWS::EC2::NatGateway")
                        .property("SubnetId", reference(&subnet_id))
                        .property("AllocationId", get_att(&eip, "AllocationId"))
                        .depends_on(&route),
                )?;
                vpc.nat_gateways.push(nat);
            }
            Some(route)
        }
        (false, _, _) if !vpc.nat_gateways.is_empty() => {
            // Spread private subnets over the available NAT gateways
            let nat = &vpc.nat_gateways[az_index % vpc.nat_gateways.len()];
            Some(stack.add(
                prefix.child("DefaultRoute")?,
                Resource::new("AWS::EC2::Route")
                    .property("RouteTableId", reference(&route_table))
                    .property("DestinationCidrBlock", json!("0.0.0.0/0"))
                    .property("NatGatewayId", reference(nat)),
            )?)
        }
        _ => None,
    };

    Ok(Subnet {
        id: subnet_id,
        subnet_type,
        cidr,
        az_index,
        route_table,
        default_route,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SubnetGroup;

    fn id(name: &str) -> LogicalId {
        LogicalId::new(name).unwrap()
    }

    fn public_only(max_azs: u32, nat_gateways: Option<u32>) -> NetworkConfig {
        NetworkConfig {
            cidr: "10.0.0.0/16".to_string(),
            max_azs,
            nat_gateways,
            subnets: vec![SubnetGroup {
                name: "Public".to_string(),
                subnet_type: SubnetType::Public,
                cidr_mask: None,
            }],
        }
    }

    fn with_private(max_azs: u32, nat_gateways: Option<u32>) -> NetworkConfig {
        let mut config = public_only(max_azs, nat_gateways);
        config.subnets.push(SubnetGroup {
            name: "Private".to_string(),
            subnet_type: SubnetType::Private,
            cidr_mask: None,
        });
        config
    }

    #[test]
    fn test_even_split_of_vpc_space() {
        assert_eq!(
            allocate_subnets("10.0.0.0/16", &[None, None]).unwrap(),
            vec!["10.0.0.0/17", "10.0.128.0/17"]
        );
        assert_eq!(
            allocate_subnets("10.0.0.0/16", &[None, None, None]).unwrap(),
            vec!["10.0.0.0/18", "10.0.64.0/18", "10.0.128.0/18"]
        );
    }

    #[test]
    fn test_explicit_masks_are_honoured() {
        assert_eq!(
            allocate_subnets("10.0.0.0/16", &[Some(24), Some(24)]).unwrap(),
            vec!["10.0.0.0/24", "10.0.1.0/24"]
        );
    }

    #[test]
    fn test_allocation_rejects_overflow_and_bad_cidr() {
        assert!(allocate_subnets("10.0.0.0/30", &[Some(28)]).is_err());
        assert!(allocate_subnets("10.0.0.0/16", &[Some(16), Some(16)]).is_err());
        assert!(allocate_subnets("not-a-cidr", &[None]).is_err());
        assert!(allocate_subnets("10.0.0.0/33", &[None]).is_err());
    }

    #[test]
    fn test_public_only_vpc_has_no_nat() {
        let mut stack = Stack::new("test");
        let vpc = declare_vpc(&mut stack, &id("RunningLogVPC"), &public_only(2, Some(0))).unwrap();

        assert_eq!(vpc.subnets.len(), 2);
        assert!(vpc.nat_gateways.is_empty());
        assert_eq!(vpc.az_count(), 2);
        assert_eq!(vpc.subnet_ids(SubnetType::Private), Vec::<LogicalId>::new());
        assert_eq!(
            vpc.subnet_ids(SubnetType::Public),
            vec![
                id("RunningLogVPCPublicSubnet1Subnet"),
                id("RunningLogVPCPublicSubnet2Subnet")
            ]
        );
        assert_eq!(vpc.internet_routes().len(), 2);
        assert_eq!(stack.resources_of_type("AWS::EC2::NatGateway").count(), 0);
        assert_eq!(stack.resources_of_type("AWS::EC2::InternetGateway").count(), 1);
    }

    #[test]
    fn test_default_nat_policy_without_private_subnets_creates_none() {
        let config = public_only(3, None);
        assert_eq!(effective_nat_gateways(&config), 0);
    }

    #[test]
    fn test_private_subnets_get_nat_per_az_by_default() {
        let config = with_private(3, None);
        assert_eq!(effective_nat_gateways(&config), 3);

        let mut stack = Stack::new("test");
        let vpc = declare_vpc(&mut stack, &id("Vpc"), &config).unwrap();
        assert_eq!(vpc.nat_gateways.len(), 3);
        assert_eq!(stack.resources_of_type("AWS::EC2::EIP").count(), 3);

        let private_routes: Vec<_> = stack
            .resources_of_type("AWS::EC2::Route")
            .filter(|(_, r)| r.get("NatGatewayId").is_some())
            .collect();
        assert_eq!(private_routes.len(), 3);
    }

    #[test]
    fn test_nat_count_is_capped_and_shared() {
        let config = with_private(2, Some(1));
        let mut stack = Stack::new("test");
        let vpc = declare_vpc(&mut stack, &id("Vpc"), &config).unwrap();
        assert_eq!(vpc.nat_gateways.len(), 1);

        for (_, route) in stack
            .resources_of_type("AWS::EC2::Route")
            .filter(|(_, r)| r.get("NatGatewayId").is_some())
        {
            assert_eq!(route.get("NatGatewayId"), Some(&reference(&vpc.nat_gateways[0])));
        }

        assert_eq!(effective_nat_gateways(&with_private(2, Some(5))), 2);
    }

    #[test]
    fn test_private_without_nat_is_isolated() {
        let mut stack = Stack::new("test");
        let vpc = declare_vpc(&mut stack, &id("Vpc"), &with_private(2, Some(0))).unwrap();
        let private: Vec<_> = vpc
            .subnets
            .iter()
            .filter(|s| s.subnet_type == SubnetType::Private)
            .collect();
        assert_eq!(private.len(), 2);
        assert!(private.iter().all(|s| s.default_route.is_none()));
    }

    #[test]
    fn test_rejects_zero_azs_and_empty_layout() {
        let mut stack = Stack::new("test");
        assert!(declare_vpc(&mut stack, &id("Vpc"), &public_only(0, Some(0))).is_err());

        let mut empty = public_only(2, Some(0));
        empty.subnets.clear();
        assert!(declare_vpc(&mut stack, &id("Vpc"), &empty).is_err());
    }

    #[test]
    fn test_public_routes_wait_for_gateway_attachment() {
        let mut stack = Stack::new("test");
        let vpc = declare_vpc(&mut stack, &id("Vpc"), &public_only(1, Some(0))).unwrap();
        let route = stack.get(&vpc.internet_routes()[0]).unwrap();
        assert_eq!(route.depends_on, vec![id("VpcVPCGW")]);
    }
}
