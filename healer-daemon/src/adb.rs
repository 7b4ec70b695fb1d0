//! Device-control channel: run one shell command on one device.
//!
//! [`DeviceControl`] is the seam the heal cycle talks to; [`AdbControl`] is
//! the production implementation shelling out to `adb -s <serial> …`.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use healer_core::DeviceId;
use tokio::process::Command;

use crate::error::ProbeError;

pub const MODEL_PROBE: &[&str] = &["shell", "getprop", "ro.product.model"];
pub const BATTERY_DUMP: &[&str] = &["shell", "dumpsys", "battery"];
pub const MEDIA_SESSION_DUMP: &[&str] = &["shell", "dumpsys", "media_session"];
pub const PLAY_DISPATCH: &[&str] = &["shell", "media", "dispatch", "play"];
/// `KEYCODE_MEDIA_PLAY`.
pub const PLAY_KEYEVENT: &[&str] = &["shell", "input", "keyevent", "126"];

/// Run a command on a device and return its trimmed stdout.
///
/// Implementations must bound every call in time and must not retry.
#[async_trait]
pub trait DeviceControl: Send + Sync {
    async fn run(&self, serial: &DeviceId, args: &[&str]) -> Result<String, ProbeError>;
}

/// The app being kept alive on each device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppTarget {
    pub package: String,
    pub activity: String,
}

impl AppTarget {
    pub fn liveness_probe(&self) -> [&str; 3] {
        ["shell", "pidof", &self.package]
    }

    pub fn launch(&self) -> [&str; 5] {
        ["shell", "am", "start", "-n", &self.activity]
    }
}

/// [`DeviceControl`] backed by the `adb` binary.
#[derive(Debug, Clone)]
pub struct AdbControl {
    adb_path: PathBuf,
    timeout: Duration,
}

impl AdbControl {
    pub fn new(adb_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            adb_path: adb_path.into(),
            timeout,
        }
    }
}

#[async_trait]
impl DeviceControl for AdbControl {
    async fn run(&self, serial: &DeviceId, args: &[&str]) -> Result<String, ProbeError> {
        let mut command = Command::new(&self.adb_path);
        command
            .arg("-s")
            .arg(serial.as_str())
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Err(_) => return Err(ProbeError::Timeout(self.timeout)),
            Ok(Err(err)) => {
                return Err(ProbeError::Transport(format!(
                    "failed to run {}: {err}",
                    self.adb_path.display()
                )))
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            return Err(ProbeError::NonZeroExit {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
