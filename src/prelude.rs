//! # Prelude
//!
//! Re-exports commonly used types for `use running_log_infrastructure::prelude::*;`.

pub use crate::config::{DatabaseBackend, Profile, SynthConfig, TopologyConfig};
pub use crate::constructs::SecretRef;
pub use crate::error::SynthError;
pub use crate::graph::{LogicalId, Output, Resource, Stack};
pub use crate::preflight::{run_preflight, PreflightProbe, PreflightReport};
pub use crate::template::{write_assembly, OutputFormat, Template};
pub use crate::topology::{build_stack, Topology};
