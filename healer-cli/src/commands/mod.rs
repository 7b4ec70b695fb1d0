pub mod config;
pub mod fleet;
pub mod metrics;
pub mod serve;
pub mod status;
pub mod watch;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use healer_core::{config as core_config, HealerConfig};
use healer_daemon::protocol::DEFAULT_URL;
use healer_daemon::DaemonClient;

/// Where to reach a running daemon.
#[derive(Args, Debug, Clone)]
pub struct DaemonUrl {
    /// Base URL of the daemon's HTTP API.
    #[arg(long, value_name = "URL", default_value = DEFAULT_URL)]
    pub url: String,
}

impl DaemonUrl {
    pub fn client(&self) -> DaemonClient {
        DaemonClient::new(self.url.clone())
    }
}

/// Explicit `--config` file, or `~/.healer/config.yaml` when it exists, or defaults.
pub fn load_config(path: Option<&Path>) -> Result<HealerConfig> {
    match path {
        Some(path) => core_config::load_from(path)
            .with_context(|| format!("failed to load config '{}'", path.display())),
        None => core_config::load().context("failed to load ~/.healer/config.yaml"),
    }
}
