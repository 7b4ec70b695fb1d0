//! Domain types for the heal watcher.
//!
//! [`WatcherState`] is the full per-device record owned by the daemon's
//! watcher registry. [`PublicStatus`] is the read-only projection handed to
//! HTTP callers; it carries no scheduling internals.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A device serial as understood by the device-control channel (`adb -s`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub String);

impl DeviceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// The corrective action taken by the most recent heal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealAction {
    /// The app was not running and was started.
    #[serde(rename = "launched app")]
    Launched,
    /// The app was running but paused; a play command was dispatched.
    #[serde(rename = "sent play command")]
    PlaySent,
}

impl HealAction {
    /// Label value used for the `action` dimension in the metrics exposition.
    pub fn metric_label(self) -> &'static str {
        match self {
            HealAction::Launched => "launched",
            HealAction::PlaySent => "play_sent",
        }
    }
}

impl fmt::Display for HealAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealAction::Launched => write!(f, "launched app"),
            HealAction::PlaySent => write!(f, "sent play command"),
        }
    }
}

// ---------------------------------------------------------------------------
// Watcher state
// ---------------------------------------------------------------------------

/// Observable state of one watched device.
///
/// Counters only ever grow, and `heal_count` always equals
/// `heals_launched + heals_play_sent`; use [`WatcherState::record_heal`]
/// rather than touching the counters directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherState {
    pub serial: DeviceId,
    pub watching: bool,
    pub app_running: bool,
    /// Meaningful only while `app_running`; set optimistically after a heal.
    pub app_playing: bool,
    pub heal_count: u64,
    pub heals_launched: u64,
    pub heals_play_sent: u64,
    /// `None` until the first successful battery read; never reset.
    pub battery_level: Option<u8>,
    /// Empty until resolved; never reset.
    pub model: String,
    pub last_action: Option<HealAction>,
    pub last_error: Option<String>,
    pub last_cycle_at: Option<DateTime<Utc>>,
}

impl WatcherState {
    /// Fresh state for a device that just started being watched.
    pub fn new(serial: DeviceId) -> Self {
        Self {
            serial,
            watching: true,
            app_running: false,
            app_playing: false,
            heal_count: 0,
            heals_launched: 0,
            heals_play_sent: 0,
            battery_level: None,
            model: String::new(),
            last_action: None,
            last_error: None,
            last_cycle_at: None,
        }
    }

    /// Count one corrective action and remember it as the last one taken.
    pub fn record_heal(&mut self, action: HealAction) {
        self.heal_count += 1;
        match action {
            HealAction::Launched => self.heals_launched += 1,
            HealAction::PlaySent => self.heals_play_sent += 1,
        }
        self.last_action = Some(action);
    }

    pub fn public(&self) -> PublicStatus {
        PublicStatus::from(self)
    }
}

/// Read-only view of a watcher, as served by `/api/status` and `/api/watch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicStatus {
    pub watching: bool,
    pub app_running: bool,
    pub app_playing: bool,
    pub heal_count: u64,
    pub heals_launched: u64,
    pub heals_play_sent: u64,
    /// Percentage, or `-1` when unknown.
    pub battery_level: i16,
    pub model: String,
    pub last_heal_action: Option<HealAction>,
    pub last_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_cycle_at: Option<DateTime<Utc>>,
}

/// Sentinel used on the wire for an unknown battery level.
pub const BATTERY_UNKNOWN: i16 = -1;

impl From<&WatcherState> for PublicStatus {
    fn from(state: &WatcherState) -> Self {
        Self {
            watching: state.watching,
            app_running: state.app_running,
            app_playing: state.app_playing,
            heal_count: state.heal_count,
            heals_launched: state.heals_launched,
            heals_play_sent: state.heals_play_sent,
            battery_level: state
                .battery_level
                .map(i16::from)
                .unwrap_or(BATTERY_UNKNOWN),
            model: state.model.clone(),
            last_heal_action: state.last_action,
            last_error: state.last_error.clone(),
            last_cycle_at: state.last_cycle_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_heal_keeps_counter_sum() {
        let mut state = WatcherState::new(DeviceId::from("R58M"));
        state.record_heal(HealAction::Launched);
        state.record_heal(HealAction::PlaySent);
        state.record_heal(HealAction::PlaySent);
        assert_eq!(state.heal_count, 3);
        assert_eq!(state.heals_launched, 1);
        assert_eq!(state.heals_play_sent, 2);
        assert_eq!(state.last_action, Some(HealAction::PlaySent));
    }

    #[test]
    fn public_status_uses_camel_case_and_battery_sentinel() {
        let state = WatcherState::new(DeviceId::from("R58M"));
        let json = serde_json::to_value(state.public()).expect("serialize");
        assert_eq!(json["watching"], serde_json::json!(true));
        assert_eq!(json["appRunning"], serde_json::json!(false));
        assert_eq!(json["batteryLevel"], serde_json::json!(-1));
        assert_eq!(json["lastHealAction"], serde_json::Value::Null);
        assert!(json.get("lastCycleAt").is_none());
    }

    #[test]
    fn heal_action_wire_strings() {
        let json = serde_json::to_string(&HealAction::PlaySent).expect("serialize");
        assert_eq!(json, "\"sent play command\"");
        assert_eq!(HealAction::Launched.metric_label(), "launched");
        assert_eq!(HealAction::Launched.to_string(), "launched app");
    }

    #[test]
    fn device_id_display() {
        assert_eq!(DeviceId::from("emulator-5554").to_string(), "emulator-5554");
    }
}
