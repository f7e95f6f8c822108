//! List command: logical IDs and types in provisioning order.

use super::Target;
use crate::topology::build_stack;
use anyhow::{Context, Result};

pub fn list_command(target: &Target) -> Result<()> {
    let topology = build_stack(&target.stack_name, &target.topology)
        .with_context(|| format!("Failed to declare stack {}", target.stack_name))?;
    let stack = &topology.stack;
    let order = stack
        .dependency_order()
        .context("Failed to order resources")?;

    let width = order.iter().map(|id| id.as_str().len()).max().unwrap_or(0);
    for id in order {
        if let Some(resource) = stack.get(id) {
            println!("{:<width$}  {}", id.as_str(), resource.resource_type);
        }
    }
    Ok(())
}
