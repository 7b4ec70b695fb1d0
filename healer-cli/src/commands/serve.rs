//! `healer serve`: run the daemon in the foreground.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use healer_core::HealerConfig;
use healer_daemon::{start_blocking, LogFormat};

use super::load_config;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address the HTTP API listens on.
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Seconds between heal cycles per device.
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Config file to use instead of ~/.healer/config.yaml.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Device inventory (JSON) whose fleet presence is added to /metrics.
    #[arg(long, value_name = "PATH")]
    pub inventory: Option<PathBuf>,

    /// Emit log lines as JSON.
    #[arg(long)]
    pub log_json: bool,
}

impl ServeArgs {
    pub fn run(self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;
        let log_format = if self.log_json {
            LogFormat::Json
        } else {
            LogFormat::Text
        };
        let config = self.apply(config);
        config.validate().context("invalid configuration")?;
        start_blocking(config, log_format).context("daemon exited with error")
    }

    /// Flags win over the config file.
    fn apply(self, mut config: HealerConfig) -> HealerConfig {
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(interval) = self.interval {
            config.heal_interval_secs = interval;
        }
        if let Some(inventory) = self.inventory {
            config.inventory = Some(inventory);
        }
        config
    }
}
