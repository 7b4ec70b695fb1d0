//! One heal cycle: probe a device and, if needed, launch or resume the app.
//!
//! The cycle works on a detached [`WatcherState`] copy; the watcher registry
//! decides whether the cycle may start and whether its result is kept.

use std::time::Duration;

use chrono::Utc;
use healer_core::{dumpsys, DeviceId, HealAction, HealerConfig, WatcherState};
use thiserror::Error;

use crate::adb::{
    AppTarget, DeviceControl, BATTERY_DUMP, MEDIA_SESSION_DUMP, MODEL_PROBE, PLAY_DISPATCH,
    PLAY_KEYEVENT,
};
use crate::error::ProbeError;

/// Inputs of a heal cycle that do not change between cycles.
#[derive(Debug, Clone)]
pub struct HealSettings {
    pub target: AppTarget,
    /// Pause between launching the app and sending play.
    pub settle_delay: Duration,
}

impl HealSettings {
    pub fn from_config(config: &HealerConfig) -> Self {
        Self {
            target: AppTarget {
                package: config.package.clone(),
                activity: config.activity.clone(),
            },
            settle_delay: config.settle_delay(),
        }
    }
}

/// How a cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleEnd {
    /// Ran to the end; `last_error` was cleared.
    Completed,
    /// The media-session dump failed; `last_error` holds the failure and no
    /// playback decision was made.
    MediaDumpFailed,
    /// A corrective command failed; `last_error` holds the failure.
    ActionFailed,
}

/// A failure that ends a cycle and lands in `last_error`.
#[derive(Debug, Error)]
pub enum HealError {
    #[error("launch failed: {0}")]
    Launch(#[source] ProbeError),

    #[error("play command failed: {0}")]
    Resume(#[source] ProbeError),

    #[error("dumpsys failed: {0}")]
    MediaDump(#[source] ProbeError),
}

/// Run one heal cycle against `state`. Never fails: every error is recorded
/// in `state.last_error`.
pub async fn heal_cycle(
    control: &dyn DeviceControl,
    settings: &HealSettings,
    state: &mut WatcherState,
) -> CycleEnd {
    let serial = state.serial.clone();
    let end = match run_steps(control, settings, &serial, state).await {
        Ok(()) => {
            state.last_error = None;
            CycleEnd::Completed
        }
        Err(err @ HealError::MediaDump(_)) => {
            tracing::warn!(serial = %serial, error = %err, "media session dump failed");
            state.last_error = Some(err.to_string());
            CycleEnd::MediaDumpFailed
        }
        Err(err) => {
            tracing::warn!(serial = %serial, error = %err, "heal error");
            state.last_error = Some(err.to_string());
            CycleEnd::ActionFailed
        }
    };
    state.last_cycle_at = Some(Utc::now());
    end
}

async fn run_steps(
    control: &dyn DeviceControl,
    settings: &HealSettings,
    serial: &DeviceId,
    state: &mut WatcherState,
) -> Result<(), HealError> {
    if state.model.is_empty() {
        match control.run(serial, MODEL_PROBE).await {
            Ok(model) => state.model = model,
            Err(err) => tracing::debug!(serial = %serial, error = %err, "model lookup failed"),
        }
    }

    match control.run(serial, BATTERY_DUMP).await {
        Ok(dump) => {
            if let Some(level) = dumpsys::parse_battery_level(&dump) {
                state.battery_level = Some(level);
            }
        }
        Err(err) => tracing::debug!(serial = %serial, error = %err, "battery read failed"),
    }

    state.app_running = probe_running(control, serial, &settings.target).await;

    if !state.app_running {
        state.record_heal(HealAction::Launched);
        tracing::info!(serial = %serial, package = %settings.target.package, "app not running, launching");
        control
            .run(serial, &settings.target.launch())
            .await
            .map_err(HealError::Launch)?;
        tokio::time::sleep(settings.settle_delay).await;
        send_play(control, serial).await?;
        state.app_playing = true;
        return Ok(());
    }

    let dump = control
        .run(serial, MEDIA_SESSION_DUMP)
        .await
        .map_err(HealError::MediaDump)?;
    let playing = dumpsys::app_is_playing(&dump, &settings.target.package);
    state.app_playing = playing;

    if !playing {
        state.record_heal(HealAction::PlaySent);
        tracing::info!(serial = %serial, package = %settings.target.package, "app paused, sending play");
        send_play(control, serial).await?;
        state.app_playing = true;
    }
    Ok(())
}

/// `pidof` printing nothing or exiting non-zero both mean "not running".
async fn probe_running(control: &dyn DeviceControl, serial: &DeviceId, target: &AppTarget) -> bool {
    match control.run(serial, &target.liveness_probe()).await {
        Ok(pid) => !pid.is_empty(),
        Err(err) if err.is_negative_result() => false,
        Err(err) => {
            tracing::warn!(serial = %serial, error = %err, "liveness probe failed, assuming not running");
            false
        }
    }
}

/// Media dispatch first; the keyevent covers devices without `cmd media`.
async fn send_play(control: &dyn DeviceControl, serial: &DeviceId) -> Result<(), HealError> {
    if let Err(err) = control.run(serial, PLAY_DISPATCH).await {
        tracing::debug!(serial = %serial, error = %err, "media dispatch failed, trying keyevent");
        control
            .run(serial, PLAY_KEYEVENT)
            .await
            .map_err(HealError::Resume)?;
    }
    Ok(())
}
