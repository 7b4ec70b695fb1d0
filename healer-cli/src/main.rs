//! Healer: keeps a music app running and playing on adb devices.
//!
//! # Usage
//!
//! ```text
//! healer serve [--bind ADDR] [--interval SECS] [--config PATH] [--inventory PATH] [--log-json]
//! healer status [--json] [--url URL]
//! healer watch <serial> [--url URL]
//! healer unwatch <serial> [--url URL]
//! healer metrics [--url URL]
//! healer fleet --inventory PATH [--json | --prometheus]
//! healer config [--config PATH]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    config::ConfigArgs, fleet::FleetArgs, metrics::MetricsArgs, serve::ServeArgs,
    status::StatusArgs, watch::WatchArgs,
};

#[derive(Parser, Debug)]
#[command(
    name = "healer",
    version,
    about = "Keep a music app running and playing on Android devices",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the heal daemon and its HTTP API in the foreground.
    Serve(ServeArgs),

    /// Show every watched device.
    Status(StatusArgs),

    /// Start watching a device.
    Watch(WatchArgs),

    /// Stop watching a device.
    Unwatch(WatchArgs),

    /// Print the daemon's Prometheus metrics.
    Metrics(MetricsArgs),

    /// Summarize device presence from an inventory file.
    Fleet(FleetArgs),

    /// Print the effective configuration as YAML.
    Config(ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Watch(args) => args.watch(),
        Commands::Unwatch(args) => args.unwatch(),
        Commands::Metrics(args) => args.run(),
        Commands::Fleet(args) => args.run(),
        Commands::Config(args) => args.run(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn url_defaults_to_local_daemon() {
        let cli = Cli::parse_from(["healer", "watch", "R58M123"]);
        let Commands::Watch(args) = cli.command else {
            panic!("expected watch");
        };
        assert_eq!(args.serial, "R58M123");
        assert_eq!(args.daemon.url, "http://127.0.0.1:9106");
    }
}
