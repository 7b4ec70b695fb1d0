//! Prometheus text exposition for watcher state.

use crate::types::{HealAction, WatcherState};

/// Content type expected by Prometheus for the text exposition format.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

const HEADER: &[(&str, &str, &str)] = &[
    ("heal_watching", "gauge", "Whether the watcher is active for a device"),
    ("heal_playing", "gauge", "Whether the app is currently playing on a device"),
    ("heal_total", "counter", "Number of heal actions performed"),
    ("heal_battery_level", "gauge", "Battery percentage of the device"),
    ("heals_total", "counter", "Number of heal actions by type"),
];

/// Render per-device series for every watcher in `states`.
///
/// Devices are emitted in the order given; `heal_battery_level` is omitted for
/// a device whose battery level is still unknown.
pub fn render_watchers<'a, I>(states: I) -> String
where
    I: IntoIterator<Item = &'a WatcherState>,
{
    let mut lines = Vec::new();
    for (name, kind, help) in HEADER {
        lines.push(format!("# HELP {name} {help}"));
        lines.push(format!("# TYPE {name} {kind}"));
    }

    for state in states {
        let labels = format!(
            "serial=\"{}\",model=\"{}\"",
            escape_label(state.serial.as_str()),
            escape_label(&state.model)
        );
        lines.push(format!("heal_watching{{{labels}}} {}", u8::from(state.watching)));
        lines.push(format!("heal_playing{{{labels}}} {}", u8::from(state.app_playing)));
        lines.push(format!("heal_total{{{labels}}} {}", state.heal_count));
        if let Some(level) = state.battery_level {
            lines.push(format!("heal_battery_level{{{labels}}} {level}"));
        }
        for (action, count) in [
            (HealAction::Launched, state.heals_launched),
            (HealAction::PlaySent, state.heals_play_sent),
        ] {
            lines.push(format!(
                "heals_total{{{labels},action=\"{}\"}} {count}",
                action.metric_label()
            ));
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Escape a label value per the exposition format (`\`, `"`, newline).
pub fn escape_label(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}
