//! `healer watch` / `healer unwatch`

use anyhow::{Context, Result};
use clap::Args;
use healer_core::DeviceId;

use super::DaemonUrl;

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// adb serial of the device.
    pub serial: String,

    #[command(flatten)]
    pub daemon: DaemonUrl,
}

impl WatchArgs {
    pub fn watch(self) -> Result<()> {
        let serial = DeviceId::from(self.serial);
        let status = self
            .daemon
            .client()
            .watch(&serial)
            .with_context(|| format!("failed to start watching '{serial}'"))?;

        println!("✓ Watching '{serial}'");
        if status.heal_count > 0 {
            println!("  Already watched: {} heals so far", status.heal_count);
        }
        Ok(())
    }

    pub fn unwatch(self) -> Result<()> {
        let serial = DeviceId::from(self.serial);
        let removed = self
            .daemon
            .client()
            .unwatch(&serial)
            .with_context(|| format!("failed to stop watching '{serial}'"))?;

        if removed {
            println!("✓ Stopped watching '{serial}'");
        } else {
            println!("'{serial}' was not being watched");
        }
        Ok(())
    }
}
