//! # Observability
//!
//! Tracing subscriber setup. Logs always go to stderr; stdout is reserved for
//! rendered templates so `running-log-synth > template.json` stays clean.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
///
/// Covers both the library and the `running-log-synth` binary target.
pub fn default_filter(log_level: &str) -> String {
    let level = match log_level.trim().to_ascii_lowercase().as_str() {
        level @ ("error" | "warn" | "info" | "debug" | "trace") => level.to_string(),
        _ => "info".to_string(),
    };
    format!("running_log_infrastructure={level},running_log_synth={level}")
}

/// Install the global subscriber
///
/// `RUST_LOG` wins over `log_level`. `log_format` is `json` or `text`
/// (anything else is treated as text). Calling this twice is harmless; the
/// second subscriber is simply not installed.
pub fn init_tracing(log_level: &str, log_format: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(log_level).into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = if log_format.eq_ignore_ascii_case("json") {
        builder.json().try_init()
    } else {
        builder.with_target(false).try_init()
    };
    if let Err(e) = result {
        eprintln!("Tracing subscriber already initialized: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_levels() {
        assert_eq!(
            default_filter("DEBUG"),
            "running_log_infrastructure=debug,running_log_synth=debug"
        );
        assert_eq!(
            default_filter("warn"),
            "running_log_infrastructure=warn,running_log_synth=warn"
        );
        assert_eq!(
            default_filter("loud"),
            "running_log_infrastructure=info,running_log_synth=info"
        );
    }
}
