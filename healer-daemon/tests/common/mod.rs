//! Scripted in-memory device used by the daemon integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use healer_core::DeviceId;
use healer_daemon::{AppTarget, DeviceControl, HealSettings, ProbeError, WatchSettings};

pub const PACKAGE: &str = "com.spotify.music";
pub const ACTIVITY: &str = "com.spotify.music/.MainActivity";

pub const LAUNCH: &str = "shell am start -n com.spotify.music/.MainActivity";
pub const PIDOF: &str = "shell pidof com.spotify.music";
pub const MEDIA_DUMP: &str = "shell dumpsys media_session";
pub const BATTERY: &str = "shell dumpsys battery";
pub const MODEL: &str = "shell getprop ro.product.model";
pub const PLAY: &str = "shell media dispatch play";
pub const KEYEVENT: &str = "shell input keyevent 126";

#[derive(Clone)]
enum Reply {
    Ok(String),
    Exit(i32),
    Transport,
}

/// Answers commands from a table keyed by the joined argument list.
/// Unscripted commands succeed with empty output. Every call is recorded.
#[derive(Default)]
pub struct FakeDevice {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<String>>,
    delays: Mutex<HashMap<String, Duration>>,
}

impl FakeDevice {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, command: &str, stdout: &str) -> &Self {
        self.set(command, Reply::Ok(stdout.to_string()))
    }

    pub fn fail_exit(&self, command: &str, code: i32) -> &Self {
        self.set(command, Reply::Exit(code))
    }

    pub fn fail_transport(&self, command: &str) -> &Self {
        self.set(command, Reply::Transport)
    }

    /// Make `command` take `delay` (on the tokio clock) before answering.
    pub fn delay(&self, command: &str, delay: Duration) -> &Self {
        self.delays
            .lock()
            .expect("delays lock")
            .insert(command.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn count(&self, command: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == command).count()
    }

    fn set(&self, command: &str, reply: Reply) -> &Self {
        self.replies
            .lock()
            .expect("replies lock")
            .insert(command.to_string(), reply);
        self
    }
}

#[async_trait]
impl DeviceControl for FakeDevice {
    async fn run(&self, _serial: &DeviceId, args: &[&str]) -> Result<String, ProbeError> {
        let command = args.join(" ");
        self.calls.lock().expect("calls lock").push(command.clone());

        let delay = self.delays.lock().expect("delays lock").get(&command).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self.replies.lock().expect("replies lock").get(&command).cloned();
        match reply {
            None => Ok(String::new()),
            Some(Reply::Ok(stdout)) => Ok(stdout),
            Some(Reply::Exit(code)) => Err(ProbeError::NonZeroExit {
                code: Some(code),
                stderr: String::new(),
            }),
            Some(Reply::Transport) => Err(ProbeError::Transport("device offline".to_string())),
        }
    }
}

pub fn heal_settings() -> HealSettings {
    HealSettings {
        target: AppTarget {
            package: PACKAGE.to_string(),
            activity: ACTIVITY.to_string(),
        },
        settle_delay: Duration::from_secs(3),
    }
}

pub fn watch_settings(interval: Duration, stagger: bool) -> WatchSettings {
    WatchSettings {
        interval,
        stagger,
        heal: heal_settings(),
    }
}

pub fn media_dump(state: u8) -> String {
    format!(
        "Sessions Stack - have 1 sessions:\n  {PACKAGE}/spotify media session (userId=0) {{\n    active=true\n    state=PlaybackState {{state={state}, position=1200}}\n  }}\n"
    )
}

/// A device where the app is running and playing.
pub fn playing_device() -> Arc<FakeDevice> {
    let device = FakeDevice::new();
    device
        .reply(MODEL, "Pixel 7")
        .reply(BATTERY, "  level: 64\n  scale: 100")
        .reply(PIDOF, "4211")
        .reply(MEDIA_DUMP, &media_dump(3));
    device
}

/// A device where the app is not running.
pub fn stopped_device() -> Arc<FakeDevice> {
    let device = FakeDevice::new();
    device
        .reply(MODEL, "Pixel 7")
        .reply(BATTERY, "level: 50")
        .fail_exit(PIDOF, 1);
    device
}
