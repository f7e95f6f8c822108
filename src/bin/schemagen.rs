//! # Schema Generator
//!
//! Prints the JSON Schema of the topology configuration file accepted by
//! `running-log-synth --config`.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin schemagen > topology.schema.json
//! ```

use running_log_infrastructure::config::TopologyConfig;

fn main() {
    let schema = schemars::schema_for!(TopologyConfig);

    match serde_json::to_string_pretty(&schema) {
        Ok(json) => {
            println!("{json}");
        }
        Err(e) => {
            eprintln!("Failed to serialize topology schema: {e}");
            std::process::exit(1);
        }
    }
}
