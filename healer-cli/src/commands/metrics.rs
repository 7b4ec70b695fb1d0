//! `healer metrics`: print the daemon's Prometheus exposition.

use anyhow::{Context, Result};
use clap::Args;

use super::DaemonUrl;

#[derive(Args, Debug)]
pub struct MetricsArgs {
    #[command(flatten)]
    pub daemon: DaemonUrl,
}

impl MetricsArgs {
    pub fn run(self) -> Result<()> {
        let text = self
            .daemon
            .client()
            .metrics()
            .context("failed to scrape daemon metrics")?;
        print!("{text}");
        Ok(())
    }
}
