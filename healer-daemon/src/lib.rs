//! Healer daemon: per-device heal watchers behind an HTTP API.

pub mod adb;
mod error;
pub mod heal;
pub mod http;
pub mod protocol;
mod runtime;
pub mod watcher;

pub use adb::{AdbControl, AppTarget, DeviceControl};
pub use error::{DaemonError, ProbeError};
pub use heal::{heal_cycle, CycleEnd, HealError, HealSettings};
pub use protocol::DaemonClient;
pub use runtime::{run, start_blocking, LogFormat};
pub use watcher::{WatchSettings, WatcherRegistry};
