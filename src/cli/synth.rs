//! Synth command: render the template to stdout or write a cloud assembly.

use super::Target;
use crate::template::{write_assembly, OutputFormat, Template};
use crate::topology::build_stack;
use anyhow::{Context, Result};
use std::path::Path;

pub fn synth_command(target: &Target, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    let topology = build_stack(&target.stack_name, &target.topology)
        .with_context(|| format!("Failed to declare stack {}", target.stack_name))?;

    match output {
        Some(dir) => {
            let path = write_assembly(dir, &topology.stack)
                .with_context(|| format!("Failed to write cloud assembly to {}", dir.display()))?;
            println!("{}", path.display());
        }
        None => {
            let rendered = Template::from_stack(&topology.stack)
                .and_then(|template| template.render(format))
                .context("Failed to render template")?;
            println!("{rendered}");
        }
    }
    Ok(())
}
