//! # running-log infrastructure
//!
//! Declares the AWS deployment of the running-log web application as a typed
//! resource graph and renders it as a CloudFormation template.
//!
//! ## Layers
//!
//! 1. **Network** - VPC with public (and optionally private) subnets
//! 2. **Access rule** - security group admitting MySQL traffic
//! 3. **Database** - single MySQL instance or Aurora MySQL cluster, selected
//!    by [`config::DatabaseBackend`], with a generated master credential
//! 4. **Compute cluster** - ECS cluster
//! 5. **Secrets** - the database credential and the externally owned
//!    application secret, referenced but never read
//! 6. **Service** - Fargate tasks behind a public application load balancer
//!
//! ## Usage
//!
//! ```no_run
//! use running_log_infrastructure::prelude::*;
//!
//! let topology = build_stack("running-log-prod", &Profile::Instance.topology())?;
//! let template = Template::from_stack(&topology.stack)?;
//! println!("{}", template.to_json()?);
//! # Ok::<(), SynthError>(())
//! ```

pub mod arn;
pub mod cli;
pub mod config;
pub mod constants;
pub mod constructs;
pub mod error;
pub mod graph;
pub mod observability;
pub mod preflight;
pub mod prelude;
pub mod template;
pub mod topology;
