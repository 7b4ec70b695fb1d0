//! Parsers for `dumpsys` output captured from a device shell.
//!
//! Nothing here talks to a device; every function takes the literal dump text,
//! so captured dumps can be replayed in tests.

use std::sync::OnceLock;

use regex::Regex;

/// Playback state code reported by `MediaSession` when a session is playing.
pub const PLAYBACK_STATE_PLAYING: u8 = 3;

fn battery_level_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"level:\s*(\d+)").expect("valid battery regex"))
}

fn playing_state_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"\bstate={PLAYBACK_STATE_PLAYING}\b")).expect("valid state regex")
    })
}

/// Extract the first `level: N` value from `dumpsys battery`.
pub fn parse_battery_level(dump: &str) -> Option<u8> {
    battery_level_re()
        .captures(dump)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Extract the media-session block belonging to `marker` (an application
/// package name) from `dumpsys media_session`.
///
/// Capture starts at the first line containing `marker` and continues until
/// the running `{`/`}` balance, seeded from that line, drops to zero or below.
/// A marker line whose braces already balance yields a one-line section. Only
/// the first matching section is returned; later sections are ignored.
pub fn extract_session(dump: &str, marker: &str) -> Option<String> {
    let mut lines = dump.split('\n');
    let first = lines.by_ref().find(|line| line.contains(marker))?;

    let mut section = vec![first];
    let mut balance = brace_balance(first);
    while balance > 0 {
        let Some(line) = lines.next() else { break };
        section.push(line);
        balance += brace_balance(line);
    }

    Some(section.join("\n"))
}

/// Whether a session block reports the playing state code.
pub fn session_is_playing(section: &str) -> bool {
    playing_state_re().is_match(section)
}

/// Convenience: is the app identified by `marker` playing according to `dump`?
///
/// An absent session counts as not playing.
pub fn app_is_playing(dump: &str, marker: &str) -> bool {
    extract_session(dump, marker)
        .map(|section| session_is_playing(&section))
        .unwrap_or(false)
}

fn brace_balance(line: &str) -> i64 {
    line.chars().fold(0, |acc, c| match c {
        '{' => acc + 1,
        '}' => acc - 1,
        _ => acc,
    })
}
