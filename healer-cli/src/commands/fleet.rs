//! `healer fleet`: presence summary of a device inventory file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use healer_core::inventory::{load_inventory, render_fleet_metrics};
use healer_core::{DeviceRecord, FleetSummary};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

#[derive(Args, Debug)]
pub struct FleetArgs {
    /// JSON array of device records.
    #[arg(long, value_name = "PATH")]
    pub inventory: PathBuf,

    /// Emit machine-readable JSON.
    #[arg(long, conflicts_with = "prometheus")]
    pub json: bool,

    /// Emit the Prometheus fleet block instead of a table.
    #[arg(long)]
    pub prometheus: bool,
}

#[derive(Serialize)]
struct FleetJson<'a> {
    summary: FleetSummary,
    devices: &'a [DeviceRecord],
}

#[derive(Tabled)]
struct FleetRow {
    #[tabled(rename = "serial")]
    serial: String,
    #[tabled(rename = "model")]
    model: String,
    #[tabled(rename = "status")]
    status: String,
}

impl FleetArgs {
    pub fn run(self) -> Result<()> {
        let records = load_inventory(&self.inventory)
            .with_context(|| format!("failed to read inventory '{}'", self.inventory.display()))?;
        let summary = FleetSummary::from_records(&records);

        if self.json {
            let payload = FleetJson {
                summary,
                devices: &records,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize fleet JSON")?
            );
            return Ok(());
        }
        if self.prometheus {
            print!("{}", render_fleet_metrics(&records));
            return Ok(());
        }

        println!(
            "{} devices | {} online | {} offline",
            summary.total,
            summary.online.to_string().green().bold(),
            summary.offline.to_string().red().bold(),
        );
        if records.is_empty() {
            return Ok(());
        }
        let rows: Vec<FleetRow> = records
            .iter()
            .map(|record| FleetRow {
                serial: record.serial.clone().unwrap_or_else(|| "unknown".to_string()),
                model: record.model.clone().unwrap_or_else(|| "unknown".to_string()),
                status: if record.present {
                    "ONLINE".green().to_string()
                } else {
                    "OFFLINE".bright_black().to_string()
                },
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}
