//! Check command: preflight questions about the application secret.
//!
//! Runs on a current-thread runtime; this is the only async path in the tool.

use super::Target;
use crate::arn::SecretArn;
use crate::preflight::{run_preflight, AwsPreflight};
use anyhow::{bail, Context, Result};

pub fn check_command(target: &Target) -> Result<()> {
    let arn = target.topology.application_secret_arn.as_deref();
    // The secret's own region; the SDK default chain decides otherwise
    let region = arn
        .and_then(|arn| SecretArn::parse(arn).ok())
        .map(|parsed| parsed.region);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let report = runtime.block_on(async {
        let probe = AwsPreflight::new(region.as_deref()).await;
        run_preflight(&probe, arn).await
    });

    print!("{report}");
    if !report.passed() {
        bail!("preflight check failed for stack {}", target.stack_name);
    }
    println!("all checks passed");
    Ok(())
}
