//! # running-log-synth
//!
//! Synthesizes the running-log deployment (VPC, MySQL access rule, database
//! instance or cluster, ECS cluster, secrets and a load-balanced Fargate
//! service) into a CloudFormation template.
//!
//! With no arguments the instance profile is synthesized as stack
//! `running-log-prod` and the JSON template is printed on stdout. Any failure
//! is reported on stderr with a non-zero exit status before anything is
//! printed on stdout.
//!
//! See [`running_log_infrastructure::cli`] for the full command reference.

use anyhow::{Context, Result};
use clap::Parser;
use running_log_infrastructure::cli::{run, Cli};
use running_log_infrastructure::config::{load_env_file, SynthConfig};
use running_log_infrastructure::observability::init_tracing;
use tracing::{debug, info};

fn main() -> Result<()> {
    // .env is optional but must parse; read it before any setting is looked up
    let dotenv = load_env_file(None).context("Refusing to start with a malformed .env")?;

    let cli = Cli::parse();
    let settings = SynthConfig::from_env();
    init_tracing(&settings.log_level, &settings.log_format);

    if let Some(path) = dotenv {
        debug!(path = %path.display(), "Loaded .env");
    }
    info!(
        "Build info: version={}, datetime={}, git_hash={}",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );

    run(cli, &settings)
}
