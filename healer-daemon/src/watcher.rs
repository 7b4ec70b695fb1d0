//! Watcher registry: which devices are watched, and when their heal cycles run.
//!
//! Each watcher owns two scheduled tasks: a one-shot stagger task that runs the
//! first cycle after a random delay, and the repeating task it installs
//! afterwards. Both handles live on the watcher entry and are aborted when the
//! watcher stops. Heal cycles are spawned as separate tasks, so aborting the
//! schedule never interrupts a cycle that is already running.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use healer_core::{DeviceId, HealerConfig, PublicStatus, WatcherState};
use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::adb::DeviceControl;
use crate::heal::{self, CycleEnd, HealSettings};

/// Scheduling parameters shared by every watcher.
#[derive(Debug, Clone)]
pub struct WatchSettings {
    pub interval: Duration,
    /// Delay the first cycle by a random fraction of `interval`.
    pub stagger: bool,
    pub heal: HealSettings,
}

impl WatchSettings {
    pub fn from_config(config: &HealerConfig) -> Self {
        Self {
            interval: config.heal_interval(),
            stagger: config.stagger,
            heal: HealSettings::from_config(config),
        }
    }
}

struct WatcherTimers {
    stagger: Option<JoinHandle<()>>,
    repeat: Option<JoinHandle<()>>,
}

impl WatcherTimers {
    fn cancel(&mut self) {
        for handle in [self.stagger.take(), self.repeat.take()].into_iter().flatten() {
            handle.abort();
        }
    }
}

struct WatcherEntry {
    state: WatcherState,
    /// Distinguishes this watcher from a later one for the same serial.
    generation: u64,
    in_flight: bool,
    timers: WatcherTimers,
}

/// Owns every watched device's state. Construct one per daemon and share it
/// behind an `Arc`.
pub struct WatcherRegistry {
    control: Arc<dyn DeviceControl>,
    settings: WatchSettings,
    watchers: Mutex<BTreeMap<DeviceId, WatcherEntry>>,
    next_generation: AtomicU64,
}

impl WatcherRegistry {
    pub fn new(control: Arc<dyn DeviceControl>, settings: WatchSettings) -> Arc<Self> {
        Arc::new(Self {
            control,
            settings,
            watchers: Mutex::new(BTreeMap::new()),
            next_generation: AtomicU64::new(0),
        })
    }

    pub fn settings(&self) -> &WatchSettings {
        &self.settings
    }

    /// Start watching `serial`. Watching an already-watched device returns its
    /// current state and leaves counters and schedule untouched.
    pub fn start_watching(self: &Arc<Self>, serial: DeviceId) -> PublicStatus {
        let mut watchers = self.lock();
        if let Some(entry) = watchers.get(&serial) {
            return entry.state.public();
        }

        let delay = if self.settings.stagger {
            random_stagger(self.settings.interval)
        } else {
            Duration::ZERO
        };
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let state = WatcherState::new(serial.clone());
        let public = state.public();
        let timers = WatcherTimers {
            stagger: Some(self.spawn_stagger(serial.clone(), generation, delay)),
            repeat: None,
        };
        watchers.insert(
            serial.clone(),
            WatcherEntry {
                state,
                generation,
                in_flight: false,
                timers,
            },
        );

        tracing::info!(
            serial = %serial,
            first_cycle_in_secs = delay.as_secs(),
            "watcher started",
        );
        public
    }

    /// Stop watching `serial`. Returns `false` if it was not watched.
    ///
    /// Once this returns no new cycle starts for the device; a cycle already
    /// running finishes, but its result is discarded.
    pub fn stop_watching(&self, serial: &DeviceId) -> bool {
        let mut watchers = self.lock();
        let Some(entry) = watchers.get_mut(serial) else {
            return false;
        };
        entry.state.watching = false;
        entry.timers.cancel();
        watchers.remove(serial);
        drop(watchers);

        tracing::info!(serial = %serial, "watcher stopped");
        true
    }

    pub fn get(&self, serial: &DeviceId) -> Option<PublicStatus> {
        self.lock().get(serial).map(|entry| entry.state.public())
    }

    pub fn list_all(&self) -> BTreeMap<DeviceId, PublicStatus> {
        self.lock()
            .iter()
            .map(|(serial, entry)| (serial.clone(), entry.state.public()))
            .collect()
    }

    /// Copies of every watcher's state, ordered by serial.
    pub fn snapshot(&self) -> Vec<WatcherState> {
        self.lock().values().map(|entry| entry.state.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Stop every watcher.
    pub fn shutdown(&self) {
        let mut watchers = self.lock();
        for entry in watchers.values_mut() {
            entry.state.watching = false;
            entry.timers.cancel();
        }
        let stopped = watchers.len();
        watchers.clear();
        drop(watchers);
        tracing::info!(stopped, "all watchers stopped");
    }

    /// Run one heal cycle for `serial` now.
    ///
    /// Returns `None` without doing anything when the device is not watched or
    /// a cycle for it is already in flight; overlapping cycles are skipped,
    /// never queued.
    pub async fn run_cycle(&self, serial: &DeviceId) -> Option<CycleEnd> {
        let (generation, mut state) = self.begin_cycle(serial)?;
        let guard = InFlight {
            registry: self,
            serial,
            generation,
            finished: false,
        };
        let end = heal::heal_cycle(self.control.as_ref(), &self.settings.heal, &mut state).await;
        guard.finish(state);
        Some(end)
    }

    fn begin_cycle(&self, serial: &DeviceId) -> Option<(u64, WatcherState)> {
        let mut watchers = self.lock();
        let entry = watchers.get_mut(serial)?;
        if !entry.state.watching {
            return None;
        }
        if entry.in_flight {
            tracing::debug!(serial = %serial, "heal cycle already in flight, skipping");
            return None;
        }
        entry.in_flight = true;
        Some((entry.generation, entry.state.clone()))
    }

    /// Write a cycle's result back and release the in-flight flag, unless the
    /// watcher was stopped (or replaced) while the cycle ran.
    fn end_cycle(&self, serial: &DeviceId, generation: u64, state: Option<WatcherState>) {
        let mut watchers = self.lock();
        match watchers.get_mut(serial) {
            Some(entry) if entry.generation == generation => {
                entry.in_flight = false;
                if let Some(state) = state {
                    entry.state = state;
                }
            }
            _ => tracing::debug!(serial = %serial, "watcher gone, discarding cycle result"),
        }
    }

    fn spawn_cycle(self: &Arc<Self>, serial: &DeviceId) {
        let registry = Arc::clone(self);
        let serial = serial.clone();
        tokio::spawn(async move {
            registry.run_cycle(&serial).await;
        });
    }

    fn spawn_stagger(self: &Arc<Self>, serial: DeviceId, generation: u64, delay: Duration) -> JoinHandle<()> {
        let registry = Arc::downgrade(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(registry) = registry.upgrade() else {
                return;
            };
            registry.first_cycle(&serial, generation);
        })
    }

    /// Fire the first cycle and hand over to the repeating schedule, in one
    /// critical section so a concurrent stop cannot miss the new handle.
    fn first_cycle(self: &Arc<Self>, serial: &DeviceId, generation: u64) {
        let mut watchers = self.lock();
        let Some(entry) = watchers.get_mut(serial) else {
            return;
        };
        if entry.generation != generation {
            return;
        }
        entry.timers.stagger = None;
        entry.timers.repeat = Some(spawn_repeat(
            Arc::downgrade(self),
            serial.clone(),
            self.settings.interval,
        ));
        drop(watchers);
        self.spawn_cycle(serial);
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<DeviceId, WatcherEntry>> {
        self.watchers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn spawn_repeat(registry: Weak<WatcherRegistry>, serial: DeviceId, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let Some(registry) = registry.upgrade() else {
                break;
            };
            registry.spawn_cycle(&serial);
        }
    })
}

/// Releases the in-flight flag even if the cycle future is dropped or panics.
struct InFlight<'a> {
    registry: &'a WatcherRegistry,
    serial: &'a DeviceId,
    generation: u64,
    finished: bool,
}

impl InFlight<'_> {
    fn finish(mut self, state: WatcherState) {
        self.finished = true;
        self.registry.end_cycle(self.serial, self.generation, Some(state));
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.registry.end_cycle(self.serial, self.generation, None);
        }
    }
}

/// Uniform delay in `[0, interval)`.
pub fn random_stagger(interval: Duration) -> Duration {
    let millis = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
    if millis == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..millis))
}
