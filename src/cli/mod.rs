//! # running-log-synth CLI
//!
//! Synthesizes the running-log deployment as a CloudFormation template.
//!
//! ## Usage
//!
//! ```bash
//! # Instance profile, JSON template on stdout
//! running-log-synth
//!
//! # Cluster profile as YAML
//! running-log-synth --profile cluster synth --format yaml
//!
//! # Write a cloud assembly (template + manifest)
//! running-log-synth synth --output cdk.out
//!
//! # Custom topology with a substitute application secret
//! running-log-synth --config topology.yaml --app-secret-arn arn:aws:secretsmanager:...
//!
//! # Resources in provisioning order
//! running-log-synth list
//!
//! # Ask AWS whether the application secret exists
//! running-log-synth check
//! ```

use crate::config::{resolve_topology, Profile, SynthConfig, TopologyConfig};
use crate::template::OutputFormat;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod check;
mod list;
mod synth;

pub use check::check_command;
pub use list::list_command;
pub use synth::synth_command;

/// Version string shown by `--version`
pub const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("BUILD_GIT_HASH"),
    ", built ",
    env!("BUILD_DATETIME"),
    ")"
);

/// Synthesize the running-log infrastructure
#[derive(Debug, Parser)]
#[command(name = "running-log-synth", version = VERSION, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Defaults to `synth`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Selects the stack and topology to work on
#[derive(Debug, Clone, Default, Args)]
pub struct TargetArgs {
    /// Built-in profile (ignored when --config is given)
    #[arg(long, global = true, value_enum)]
    pub profile: Option<Profile>,

    /// Stack name
    #[arg(long, global = true)]
    pub stack_name: Option<String>,

    /// Topology file (YAML or JSON), replaces the profile
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Application secret ARN; an empty value removes it
    #[arg(long, global = true, value_name = "ARN")]
    pub app_secret_arn: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Render the CloudFormation template
    Synth {
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Write a cloud assembly into DIR instead of printing the template
        #[arg(long, value_name = "DIR")]
        output: Option<PathBuf>,
    },
    /// List resources in provisioning order
    List,
    /// Check that the application secret exists and is reachable
    Check,
}

/// Stack name and topology after applying flags, environment and files
#[derive(Debug, Clone)]
pub struct Target {
    pub stack_name: String,
    pub topology: TopologyConfig,
}

impl TargetArgs {
    /// Flags win over environment settings, which win over the topology source
    pub fn resolve(&self, settings: &SynthConfig) -> Result<Target> {
        let profile = match self.profile {
            Some(profile) => profile,
            None => settings.profile()?,
        };
        let stack_name = self
            .stack_name
            .clone()
            .unwrap_or_else(|| settings.stack_name.clone());
        let secret = self
            .app_secret_arn
            .as_deref()
            .or(settings.app_secret_arn.as_deref());

        let topology = resolve_topology(profile, self.config.as_deref(), secret)
            .context("Failed to resolve topology")?;
        Ok(Target {
            stack_name,
            topology,
        })
    }
}

/// Run the selected command
pub fn run(cli: Cli, settings: &SynthConfig) -> Result<()> {
    let target = cli.target.resolve(settings)?;
    match cli.command {
        None => synth_command(&target, OutputFormat::Json, settings.output_dir.as_deref()),
        Some(Commands::Synth { format, output }) => synth_command(
            &target,
            format,
            output.as_deref().or(settings.output_dir.as_deref()),
        ),
        Some(Commands::List) => list_command(&target),
        Some(Commands::Check) => check_command(&target),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments_means_default_synth() {
        let cli = Cli::try_parse_from(["running-log-synth"]).unwrap();
        assert!(cli.command.is_none());
        let target = cli.target.resolve(&SynthConfig::default()).unwrap();
        assert_eq!(target.stack_name, "running-log-prod");
        assert_eq!(target.topology, Profile::Instance.topology());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "running-log-synth",
            "synth",
            "--profile",
            "cluster",
            "--format",
            "yaml",
            "--stack-name",
            "running-log-staging",
        ])
        .unwrap();
        assert_eq!(cli.target.profile, Some(Profile::Cluster));
        assert_eq!(cli.target.stack_name.as_deref(), Some("running-log-staging"));
        match cli.command {
            Some(Commands::Synth { format, output }) => {
                assert_eq!(format, OutputFormat::Yaml);
                assert_eq!(output, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_flag_secret_beats_environment() {
        let cli = Cli::try_parse_from([
            "running-log-synth",
            "--app-secret-arn",
            "arn:aws:secretsmanager:us-east-1:111122223333:secret:flag-AbCdEf",
        ])
        .unwrap();
        let settings = SynthConfig {
            app_secret_arn: Some(
                "arn:aws:secretsmanager:us-east-1:111122223333:secret:env-AbCdEf".to_string(),
            ),
            ..SynthConfig::default()
        };
        let target = cli.target.resolve(&settings).unwrap();
        assert_eq!(
            target.topology.application_secret_arn.as_deref(),
            Some("arn:aws:secretsmanager:us-east-1:111122223333:secret:flag-AbCdEf")
        );
    }

    #[test]
    fn test_environment_profile_is_used_without_flag() {
        let cli = Cli::try_parse_from(["running-log-synth", "list"]).unwrap();
        let settings = SynthConfig {
            profile_name: Some("cluster".to_string()),
            ..SynthConfig::default()
        };
        let target = cli.target.resolve(&settings).unwrap();
        assert_eq!(target.topology, Profile::Cluster.topology());
    }

    #[test]
    fn test_mistyped_environment_profile_fails_resolve() {
        let cli = Cli::try_parse_from(["running-log-synth", "list"]).unwrap();
        let settings = SynthConfig {
            profile_name: Some("clustr".to_string()),
            ..SynthConfig::default()
        };
        let err = cli.target.resolve(&settings).unwrap_err();
        assert!(err.to_string().contains("clustr"), "{err}");

        // An explicit flag does not consult the environment
        let cli = Cli::try_parse_from(["running-log-synth", "--profile", "cluster"]).unwrap();
        let target = cli.target.resolve(&settings).unwrap();
        assert_eq!(target.topology, Profile::Cluster.topology());
    }
}
