//! Healer core library: domain types, dump parsers, metrics text and config.
//!
//! - [`types`]: device ids, watcher state and its public projection
//! - [`dumpsys`]: media-session and battery dump parsers
//! - [`metrics`]: Prometheus exposition of watcher state
//! - [`inventory`]: device inventory and fleet presence metrics
//! - [`config`]: daemon configuration
//! - [`error`]: [`ConfigError`], [`InventoryError`]

pub mod config;
pub mod dumpsys;
pub mod error;
pub mod inventory;
pub mod metrics;
pub mod types;

pub use config::HealerConfig;
pub use error::{ConfigError, InventoryError};
pub use inventory::{DeviceRecord, FleetSummary};
pub use types::{DeviceId, HealAction, PublicStatus, WatcherState};
