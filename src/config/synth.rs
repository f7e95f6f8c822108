//! # Synthesizer Configuration
//!
//! Process-level settings loaded from environment variables.

use super::Profile;
use crate::constants::DEFAULT_STACK_NAME;
use crate::error::SynthError;
use std::path::{Path, PathBuf};

/// Load environment variables from a `.env` file
///
/// Without a path, `.env` is searched for in the working directory and its
/// parents. A missing file yields `Ok(None)`; a file that exists but does not
/// parse is an error.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>, SynthError> {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path).map(|()| path.to_path_buf()),
        None => dotenvy::dotenv(),
    };
    match loaded {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(SynthError::EnvFile(e)),
    }
}

/// Process-level configuration
///
/// All settings have defaults and can be overridden via environment variables
/// (or a `.env` file loaded before this is read). Command-line flags take
/// precedence over everything here.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthConfig {
    /// Name of the emitted stack
    pub stack_name: String,
    /// Built-in profile name used when no topology file is given,
    /// as read from the environment; see [`SynthConfig::profile`]
    pub profile_name: Option<String>,
    /// Overrides the application secret ARN of the selected topology
    /// An empty value removes it, which makes synthesis fail
    pub app_secret_arn: Option<String>,
    /// Directory for the cloud assembly; stdout when unset
    pub output_dir: Option<PathBuf>,
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE)
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: String,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            stack_name: DEFAULT_STACK_NAME.to_string(),
            profile_name: None,
            app_secret_arn: None,
            output_dir: None,
            log_level: "INFO".to_string(),
            log_format: "text".to_string(),
        }
    }
}

impl SynthConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            stack_name: lookup("RUNNING_LOG_STACK_NAME")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.stack_name),
            profile_name: lookup("RUNNING_LOG_PROFILE").filter(|v| !v.trim().is_empty()),
            app_secret_arn: lookup("RUNNING_LOG_APP_SECRET_ARN"),
            output_dir: lookup("RUNNING_LOG_OUTPUT_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT").unwrap_or(defaults.log_format),
        }
    }

    /// The configured profile, or the default when none is set
    ///
    /// A name that is not a known profile is an error rather than a silent
    /// fallback.
    pub fn profile(&self) -> Result<Profile, SynthError> {
        match self.profile_name.as_deref() {
            None => Ok(Profile::default()),
            Some(name) => name
                .parse()
                .map_err(|e| SynthError::InvalidConfig(format!("RUNNING_LOG_PROFILE: {e}"))),
        }
    }
}
