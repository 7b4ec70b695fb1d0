//! Heal cycle decisions against a scripted device.

mod common;

use common::*;
use healer_core::{DeviceId, HealAction, WatcherState};
use healer_daemon::{heal_cycle, CycleEnd};
use rstest::rstest;

fn fresh() -> WatcherState {
    WatcherState::new(DeviceId::from("R58M123"))
}

fn assert_counter_sum(state: &WatcherState) {
    assert_eq!(
        state.heal_count,
        state.heals_launched + state.heals_play_sent,
        "heal_count must equal the per-action counters"
    );
}

// ---------------------------------------------------------------------------
// Not running → launch
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn not_running_launches_and_sends_play() {
    let device = stopped_device();
    let mut state = fresh();

    let end = heal_cycle(&*device, &heal_settings(), &mut state).await;

    assert_eq!(end, CycleEnd::Completed);
    assert_eq!(device.count(LAUNCH), 1);
    assert_eq!(device.count(PLAY) + device.count(KEYEVENT), 1);
    assert_eq!(state.heals_launched, 1);
    assert_eq!(state.heals_play_sent, 0);
    assert!(state.app_playing);
    assert!(!state.app_running);
    assert_eq!(state.last_action, Some(HealAction::Launched));
    assert_eq!(state.last_error, None);
    assert_counter_sum(&state);
}

#[tokio::test(start_paused = true)]
async fn launch_waits_for_settle_delay_before_play() {
    let device = stopped_device();
    let mut state = fresh();
    let started = tokio::time::Instant::now();

    heal_cycle(&*device, &heal_settings(), &mut state).await;

    assert!(started.elapsed() >= heal_settings().settle_delay);
    let calls = device.calls();
    let launch_at = calls.iter().position(|c| c == LAUNCH).expect("launch issued");
    let play_at = calls.iter().position(|c| c == PLAY).expect("play issued");
    assert!(launch_at < play_at);
}

#[tokio::test(start_paused = true)]
async fn play_falls_back_to_keyevent() {
    let device = stopped_device();
    device.fail_exit(PLAY, 255);
    let mut state = fresh();

    let end = heal_cycle(&*device, &heal_settings(), &mut state).await;

    assert_eq!(end, CycleEnd::Completed);
    assert_eq!(device.count(PLAY), 1);
    assert_eq!(device.count(KEYEVENT), 1);
    assert!(state.app_playing);
}

#[tokio::test(start_paused = true)]
async fn failing_launch_is_recorded_not_propagated() {
    let device = stopped_device();
    device.fail_transport(LAUNCH);
    let mut state = fresh();

    let end = heal_cycle(&*device, &heal_settings(), &mut state).await;

    assert_eq!(end, CycleEnd::ActionFailed);
    let err = state.last_error.as_deref().expect("error recorded");
    assert!(err.contains("launch failed"), "got: {err}");
    assert_eq!(device.count(PLAY), 0);
    assert_eq!(state.heals_launched, 1, "the attempt still counts");
    assert!(!state.app_playing);
    assert_counter_sum(&state);
}

#[tokio::test(start_paused = true)]
async fn liveness_transport_failure_counts_as_not_running() {
    let device = stopped_device();
    device.fail_transport(PIDOF);
    let mut state = fresh();

    heal_cycle(&*device, &heal_settings(), &mut state).await;

    assert_eq!(device.count(LAUNCH), 1);
}

// ---------------------------------------------------------------------------
// Running → check playback
// ---------------------------------------------------------------------------

#[tokio::test]
async fn playing_app_is_left_alone() {
    let device = playing_device();
    let mut state = fresh();

    let end = heal_cycle(&*device, &heal_settings(), &mut state).await;

    assert_eq!(end, CycleEnd::Completed);
    assert_eq!(device.count(LAUNCH), 0);
    assert_eq!(device.count(PLAY), 0);
    assert_eq!(device.count(KEYEVENT), 0);
    assert_eq!(state.heal_count, 0);
    assert!(state.app_running);
    assert!(state.app_playing);
    assert_eq!(state.last_action, None);
}

#[rstest]
#[case::paused(Some(2))]
#[case::stopped(Some(1))]
#[case::no_session(None)]
#[tokio::test]
async fn not_playing_sends_resume(#[case] playback: Option<u8>) {
    let device = playing_device();
    match playback {
        Some(code) => device.reply(MEDIA_DUMP, &media_dump(code)),
        None => device.reply(MEDIA_DUMP, "Sessions Stack - have 0 sessions:"),
    };
    let mut state = fresh();

    let end = heal_cycle(&*device, &heal_settings(), &mut state).await;

    assert_eq!(end, CycleEnd::Completed);
    assert_eq!(device.count(LAUNCH), 0);
    assert_eq!(device.count(PLAY), 1);
    assert_eq!(state.heals_play_sent, 1);
    assert_eq!(state.heals_launched, 0);
    assert!(state.app_playing, "optimistic until the next cycle");
    assert_eq!(state.last_action, Some(HealAction::PlaySent));
    assert_counter_sum(&state);
}

#[tokio::test]
async fn media_dump_failure_ends_cycle_early() {
    let device = playing_device();
    device.fail_transport(MEDIA_DUMP);
    let mut state = fresh();
    state.last_error = Some("older failure".to_string());

    let end = heal_cycle(&*device, &heal_settings(), &mut state).await;

    assert_eq!(end, CycleEnd::MediaDumpFailed);
    let err = state.last_error.as_deref().expect("error recorded");
    assert!(err.starts_with("dumpsys failed:"), "got: {err}");
    assert_eq!(state.heal_count, 0);
    assert_eq!(device.count(PLAY), 0);
    // Earlier steps still landed.
    assert_eq!(state.model, "Pixel 7");
    assert_eq!(state.battery_level, Some(64));
    assert!(state.app_running);
}

#[tokio::test]
async fn successful_cycle_clears_previous_error() {
    let device = playing_device();
    let mut state = fresh();
    state.last_error = Some("dumpsys failed: timeout".to_string());

    heal_cycle(&*device, &heal_settings(), &mut state).await;

    assert_eq!(state.last_error, None);
    assert!(state.last_cycle_at.is_some());
}

// ---------------------------------------------------------------------------
// Sticky device facts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn model_is_resolved_once() {
    let device = playing_device();
    let mut state = fresh();

    heal_cycle(&*device, &heal_settings(), &mut state).await;
    heal_cycle(&*device, &heal_settings(), &mut state).await;

    assert_eq!(state.model, "Pixel 7");
    assert_eq!(device.count(MODEL), 1);
}

#[tokio::test]
async fn failed_probes_keep_previous_battery_and_model() {
    let device = playing_device();
    device.fail_transport(MODEL).fail_transport(BATTERY);
    let mut state = fresh();
    state.battery_level = Some(77);

    let end = heal_cycle(&*device, &heal_settings(), &mut state).await;

    assert_eq!(end, CycleEnd::Completed, "probe failures are not cycle errors");
    assert_eq!(state.battery_level, Some(77));
    assert_eq!(state.model, "");
    assert_eq!(state.last_error, None);
}

#[tokio::test]
async fn unparseable_battery_keeps_previous_value() {
    let device = playing_device();
    device.reply(BATTERY, "Current Battery Service state: unavailable");
    let mut state = fresh();
    state.battery_level = Some(12);

    heal_cycle(&*device, &heal_settings(), &mut state).await;

    assert_eq!(state.battery_level, Some(12));
}

#[tokio::test(start_paused = true)]
async fn counters_stay_consistent_across_mixed_cycles() {
    let device = stopped_device();
    let mut state = fresh();

    heal_cycle(&*device, &heal_settings(), &mut state).await;
    device.reply(PIDOF, "4211").reply(MEDIA_DUMP, &media_dump(2));
    heal_cycle(&*device, &heal_settings(), &mut state).await;
    device.reply(MEDIA_DUMP, &media_dump(3));
    heal_cycle(&*device, &heal_settings(), &mut state).await;

    assert_eq!(state.heals_launched, 1);
    assert_eq!(state.heals_play_sent, 1);
    assert_eq!(state.heal_count, 2);
    assert_counter_sum(&state);
}
