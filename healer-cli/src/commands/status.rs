//! `healer status`: every watched device as reported by the daemon.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use healer_core::types::BATTERY_UNKNOWN;
use healer_core::{DeviceId, PublicStatus};
use tabled::{settings::Style, Table, Tabled};

use super::DaemonUrl;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit the daemon's JSON unchanged.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub daemon: DaemonUrl,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let statuses = self
            .daemon
            .client()
            .status()
            .context("failed to query daemon status")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&statuses).context("failed to serialize status JSON")?
            );
            return Ok(());
        }

        print_table(&statuses, Utc::now());
        Ok(())
    }
}

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "device")]
    serial: String,
    #[tabled(rename = "model")]
    model: String,
    #[tabled(rename = "app")]
    app: String,
    #[tabled(rename = "battery")]
    battery: String,
    #[tabled(rename = "heals")]
    heals: String,
    #[tabled(rename = "last action")]
    last_action: String,
    #[tabled(rename = "last cycle")]
    last_cycle: String,
    #[tabled(rename = "error")]
    error: String,
}

fn print_table(statuses: &BTreeMap<DeviceId, PublicStatus>, now: DateTime<Utc>) {
    let playing = statuses.values().filter(|s| s.app_playing).count();
    let heals: u64 = statuses.values().map(|s| s.heal_count).sum();
    println!(
        "Healer v{} | {} watched | {} playing | {} heals",
        env!("CARGO_PKG_VERSION"),
        statuses.len(),
        playing,
        heals,
    );

    if statuses.is_empty() {
        println!("No devices watched. Start one with 'healer watch <serial>'.");
        return;
    }

    let rows: Vec<StatusRow> = statuses
        .iter()
        .map(|(serial, status)| row(serial, status, now))
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn row(serial: &DeviceId, status: &PublicStatus, now: DateTime<Utc>) -> StatusRow {
    StatusRow {
        serial: serial.to_string(),
        model: if status.model.is_empty() {
            "-".to_string()
        } else {
            status.model.clone()
        },
        app: app_label(status),
        battery: battery_label(status.battery_level),
        heals: format!(
            "{} ({} launch, {} play)",
            status.heal_count, status.heals_launched, status.heals_play_sent
        ),
        last_action: status
            .last_heal_action
            .map(|action| action.to_string())
            .unwrap_or_else(|| "-".to_string()),
        last_cycle: status
            .last_cycle_at
            .map(|at| format!("{} ago", format_age(now, at)))
            .unwrap_or_else(|| "pending".to_string()),
        error: status.last_error.clone().unwrap_or_default(),
    }
}

fn app_label(status: &PublicStatus) -> String {
    if status.app_playing {
        "PLAYING".green().bold().to_string()
    } else if status.app_running {
        "PAUSED".yellow().bold().to_string()
    } else {
        "STOPPED".red().bold().to_string()
    }
}

fn battery_label(level: i16) -> String {
    if level == BATTERY_UNKNOWN {
        return "?".bright_black().to_string();
    }
    let text = format!("{level}%");
    if level < 20 {
        text.red().to_string()
    } else {
        text
    }
}

/// Coarse age: seconds, minutes, hours, then days.
fn format_age(now: DateTime<Utc>, then: DateTime<Utc>) -> String {
    let seconds = now.signed_duration_since(then).num_seconds().max(0);
    match seconds {
        s if s < 60 => format!("{s}s"),
        s if s < 60 * 60 => format!("{}m", s / 60),
        s if s < 60 * 60 * 24 => format!("{}h", s / (60 * 60)),
        s => format!("{}d", s / (60 * 60 * 24)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn age_buckets() {
        let now = Utc::now();
        assert_eq!(format_age(now, now - Duration::seconds(42)), "42s");
        assert_eq!(format_age(now, now - Duration::minutes(5)), "5m");
        assert_eq!(format_age(now, now - Duration::hours(3)), "3h");
        assert_eq!(format_age(now, now - Duration::days(2)), "2d");
    }

    #[test]
    fn future_timestamps_read_as_zero() {
        let now = Utc::now();
        assert_eq!(format_age(now, now + Duration::seconds(30)), "0s");
    }

    #[test]
    fn unknown_battery_is_not_a_number() {
        colored::control::set_override(false);
        assert_eq!(battery_label(BATTERY_UNKNOWN), "?");
        assert_eq!(battery_label(64), "64%");
    }
}
