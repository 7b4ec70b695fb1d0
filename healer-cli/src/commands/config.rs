//! `healer config`: print the effective configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use super::load_config;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Config file to use instead of ~/.healer/config.yaml.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl ConfigArgs {
    pub fn run(self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;
        config.validate().context("invalid configuration")?;
        let yaml = serde_yaml::to_string(&config).context("failed to render config YAML")?;
        print!("{yaml}");
        Ok(())
    }
}
