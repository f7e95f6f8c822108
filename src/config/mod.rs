//! # Configuration
//!
//! Process settings ([`SynthConfig`]), the topology model ([`TopologyConfig`])
//! and the built-in [`Profile`]s.

mod profile;
mod synth;
mod topology;

pub use profile::Profile;
pub use synth::{load_env_file, SynthConfig};
pub use topology::{
    ClusterConfig, DatabaseBackend, InstanceConfig, NetworkConfig, ServiceConfig, SubnetGroup,
    SubnetType, TopologyConfig,
};

use crate::error::SynthError;
use std::path::Path;
use tracing::info;

/// Load a topology from a YAML (or JSON) file
pub fn load_topology(path: &Path) -> Result<TopologyConfig, SynthError> {
    let raw = std::fs::read_to_string(path).map_err(|e| SynthError::io(path, e))?;
    serde_yaml::from_str(&raw).map_err(|source| SynthError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Pick the topology to synthesize
///
/// A topology file replaces the profile entirely; a secret override (even an
/// empty one) replaces whatever ARN the topology carries.
pub fn resolve_topology(
    profile: Profile,
    topology_file: Option<&Path>,
    secret_override: Option<&str>,
) -> Result<TopologyConfig, SynthError> {
    let mut topology = match topology_file {
        Some(path) => {
            info!(path = %path.display(), "Loading topology configuration");
            load_topology(path)?
        }
        None => {
            info!(profile = %profile, "Using built-in profile");
            profile.topology()
        }
    };

    if let Some(arn) = secret_override {
        topology.application_secret_arn = Some(arn.to_string());
    }

    Ok(topology)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_resolve_uses_profile_without_file() {
        let topology = resolve_topology(Profile::Cluster, None, None).unwrap();
        assert_eq!(topology, Profile::Cluster.topology());
    }

    #[test]
    fn test_secret_override_replaces_profile_value() {
        let fake = "arn:aws:secretsmanager:eu-west-1:111122223333:secret:fake-AbCdEf";
        let topology = resolve_topology(Profile::Instance, None, Some(fake)).unwrap();
        assert_eq!(topology.application_secret_arn.as_deref(), Some(fake));
    }

    #[test]
    fn test_file_replaces_profile() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "network:\n  maxAzs: 1\ndatabase:\n  kind: instance\n  engineVersion: '8.0.35'\n  instanceType: t3.micro\nservice:\n  cpu: 256\n  memoryLimitMib: 512\n  desiredCount: 1\n"
        )
        .unwrap();

        let topology = resolve_topology(Profile::Cluster, Some(file.path()), None).unwrap();
        assert_eq!(topology.network.max_azs, 1);
        assert_eq!(topology.database.kind(), "instance");
        assert_eq!(topology.application_secret_arn, None);
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let err = load_topology(Path::new("/nonexistent/topology.yaml")).unwrap_err();
        assert!(matches!(err, SynthError::Io { .. }));
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "network: [not, a, map]").unwrap();
        let err = load_topology(file.path()).unwrap_err();
        assert!(matches!(err, SynthError::ConfigParse { .. }));
    }
}
